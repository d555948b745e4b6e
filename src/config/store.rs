use std::{fs, path::PathBuf};

use indexmap::IndexMap;

/// Section-scoped key/value settings persisted as pretty JSON. Everything the
/// app remembers between runs goes through here: config values, character
/// renames, column widths and the price caches.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl SettingsStore {
    /// Opens the store at `path`. A missing or unreadable file just means an
    /// empty store; first save will create it.
    pub fn open(path: impl Into<PathBuf>) -> SettingsStore {
        let path = path.into();
        let sections = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        SettingsStore { path, sections }
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn set_value(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Keys of a section in insertion order. Empty when the section is absent.
    pub fn get_all_keys(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove_value(&mut self, section: &str, key: &str) {
        if let Some(entries) = self.sections.get_mut(section) {
            entries.shift_remove(key);
        }
    }

    pub fn delete_section(&mut self, section: &str) {
        self.sections.shift_remove(section);
    }

    pub fn save(&self) -> Result<(), String> {
        let text = serde_json::to_string_pretty(&self.sections)
            .map_err(|e| format!("Failed to serialize settings \n{}", e))?;
        fs::write(&self.path, text).map_err(|e| {
            format!("Failed to write settings to {:?} \n{}", self.path, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_empty_store() {
        let store = SettingsStore::open("does_not_exist_anywhere.json");
        assert!(store.get_all_keys("Config").is_empty());
        assert_eq!(store.get_value("Config", "Language"), None);
    }

    #[test]
    fn values_survive_a_save_and_reopen() {
        let path = std::env::temp_dir().join("vanacargo_store_test.json");
        let mut store = SettingsStore::open(&path);
        store.set_value("Config", "Language", "English");
        store.set_value("FfxiahCache_Asura", "4096", "12,000");
        store.save().unwrap();

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.get_value("Config", "Language"), Some("English"));
        assert_eq!(reopened.get_value("FfxiahCache_Asura", "4096"), Some("12,000"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn delete_section_drops_every_key() {
        let mut store = SettingsStore::open("unused.json");
        store.set_value("FfxiahCache", "1", "100");
        store.set_value("FfxiahCache", "2", "200");
        store.delete_section("FfxiahCache");
        assert!(store.get_all_keys("FfxiahCache").is_empty());
    }
}
