pub mod store;

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::models::{
    character::{Character, TabInfo},
    language::Language,
    server::Server,
};
use store::SettingsStore;

pub const SECTION_CONFIG: &str = "Config";
pub const SECTION_CHARACTERS: &str = "Characters";
pub const SECTION_INVENTORY: &str = "Inventory";

pub const KEY_LANGUAGE: &str = "Language";
pub const KEY_COMPACT_LIST: &str = "CompactList";
pub const KEY_FFXIAH_SERVER: &str = "FfxiahServer";
pub const KEY_CACHE_TTL: &str = "FfxiahCacheTtl";
pub const KEY_GAME_PATH: &str = "GamePath";

/// The default inventory tabs, in display order. Key is the save file inside
/// the character folder, value is the tab label.
const DEFAULT_TABS: [(&str, &str); 16] = [
    ("inventory.sav", "Inventory"),
    ("mogsafe.sav", "Mog Safe"),
    ("mogsafe2.sav", "Mog Safe 2"),
    ("storage.sav", "Storage"),
    ("moglocker.sav", "Mog Locker"),
    ("mogsatchel.sav", "Mog Satchel"),
    ("mogsack.sav", "Mog Sack"),
    ("mogcase.sav", "Mog Case"),
    ("wardrobe.sav", "Wardrobe 1"),
    ("wardrobe2.sav", "Wardrobe 2"),
    ("wardrobe3.sav", "Wardrobe 3"),
    ("wardrobe4.sav", "Wardrobe 4"),
    ("wardrobe5.sav", "Wardrobe 5"),
    ("wardrobe6.sav", "Wardrobe 6"),
    ("wardrobe7.sav", "Wardrobe 7"),
    ("wardrobe8.sav", "Wardrobe 8"),
];

/// The handful of settings the pipeline itself cares about.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub language: Language,
    pub compact_list: bool,
    pub ffxiah_server: Option<Server>,
    pub cache_ttl_enabled: bool,
    pub game_path: PathBuf,
}

impl CoreSettings {
    /// Reads settings out of the store, seeding defaults for anything missing
    /// so a fresh settings file ends up fully populated after the first save.
    pub fn load(store: &mut SettingsStore) -> CoreSettings {
        let language = store
            .get_value(SECTION_CONFIG, KEY_LANGUAGE)
            .and_then(|s| Language::from_str(s).ok())
            .unwrap_or(Language::English);
        let compact_list = store
            .get_value(SECTION_CONFIG, KEY_COMPACT_LIST)
            .map(|s| s == "1")
            .unwrap_or(true);
        let ffxiah_server = store
            .get_value(SECTION_CONFIG, KEY_FFXIAH_SERVER)
            .and_then(|s| Server::from_str(s).ok());
        let cache_ttl_enabled = store
            .get_value(SECTION_CONFIG, KEY_CACHE_TTL)
            .map(|s| s == "1")
            .unwrap_or(true);
        let game_path = store
            .get_value(SECTION_CONFIG, KEY_GAME_PATH)
            .map(PathBuf::from)
            .unwrap_or_default();

        let settings = CoreSettings {
            language,
            compact_list,
            ffxiah_server,
            cache_ttl_enabled,
            game_path,
        };
        settings.save(store);
        settings
    }

    pub fn save(&self, store: &mut SettingsStore) {
        store.set_value(SECTION_CONFIG, KEY_LANGUAGE, self.language.as_str());
        store.set_value(
            SECTION_CONFIG,
            KEY_COMPACT_LIST,
            if self.compact_list { "1" } else { "0" },
        );
        match self.ffxiah_server {
            Some(server) => store.set_value(SECTION_CONFIG, KEY_FFXIAH_SERVER, server.as_str()),
            None => store.set_value(SECTION_CONFIG, KEY_FFXIAH_SERVER, ""),
        }
        store.set_value(
            SECTION_CONFIG,
            KEY_CACHE_TTL,
            if self.cache_ttl_enabled { "1" } else { "0" },
        );
        store.set_value(
            SECTION_CONFIG,
            KEY_GAME_PATH,
            self.game_path.to_string_lossy().to_string(),
        );
    }
}

/// Tab list from the Inventory section, seeding the defaults when the section
/// is empty so users can reorder or prune tabs by editing the settings file.
pub fn inventory_tabs(store: &mut SettingsStore) -> Vec<TabInfo> {
    if store.get_all_keys(SECTION_INVENTORY).is_empty() {
        for (file_name, display_name) in DEFAULT_TABS {
            store.set_value(SECTION_INVENTORY, file_name, display_name);
        }
    }
    store
        .get_all_keys(SECTION_INVENTORY)
        .into_iter()
        .map(|file_name| {
            let display_name = store
                .get_value(SECTION_INVENTORY, &file_name)
                .unwrap_or(&file_name)
                .to_string();
            TabInfo { file_name, display_name }
        })
        .collect()
}

/// Scans the game's USER directory for character folders, overlaying any
/// persisted display names. Missing directory just yields no characters.
pub fn discover_characters(game_path: &Path, store: &SettingsStore) -> Vec<Character> {
    let user_dir = game_path.join("USER");
    let mut ids: Vec<String> = match fs::read_dir(&user_dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => return Vec::new(),
    };
    ids.sort();

    ids.into_iter()
        .map(|id| {
            let mut character = Character::new(id);
            if let Some(name) = store.get_value(SECTION_CHARACTERS, &character.id) {
                if !name.is_empty() {
                    character.name = name.to_string();
                }
            }
            character
        })
        .collect()
}

/// Persists character renames. Defaults are removed instead of written so the
/// Characters section only holds actual overrides.
pub fn save_character_names(characters: &[Character], store: &mut SettingsStore) {
    for character in characters {
        if character.has_default_name() {
            store.remove_value(SECTION_CHARACTERS, &character.id);
        } else {
            store.set_value(SECTION_CHARACTERS, &character.id, character.name.clone());
        }
    }
}
