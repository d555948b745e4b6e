use std::collections::HashSet;

use chrono::Utc;
use indexmap::IndexMap;

use crate::config::store::SettingsStore;
use crate::models::item::Item;

pub const CACHE_SECTION: &str = "FfxiahCache";
pub const CACHE_TIME_SECTION: &str = "FfxiahCacheTime";

/// Cached prices older than this are treated as unknown when the TTL is on.
const CACHE_TTL_SECS: i64 = 24 * 60 * 60;

/// In-memory median prices for the currently selected server, persisted to
/// the settings store between runs. Values are the comma-formatted strings
/// straight off the site; the cache never re-interprets them.
#[derive(Debug, Default)]
pub struct PriceCache {
    entries: IndexMap<u32, String>,
    fetched_at: IndexMap<u32, i64>,
    /// Ids a fetch round is currently working on, so the same id isn't
    /// queued twice.
    pending: HashSet<u32>,
}

/// Cache sections are per-server. No server selected means the base section.
pub fn section_name(base: &str, server: &str) -> String {
    if server.is_empty() {
        base.to_string()
    } else {
        format!("{}_{}", base, server)
    }
}

impl PriceCache {
    pub fn new() -> PriceCache {
        PriceCache::default()
    }

    /// Loads the persisted cache for `server`. With no server selected there
    /// is nothing meaningful to price against, so the cache starts empty.
    /// With the TTL on, stale entries are dropped at load time.
    pub fn load(store: &SettingsStore, server: &str, ttl_enabled: bool) -> PriceCache {
        let mut cache = PriceCache::new();
        if server.is_empty() {
            return cache;
        }
        let value_section = section_name(CACHE_SECTION, server);
        let time_section = section_name(CACHE_TIME_SECTION, server);
        let now = Utc::now().timestamp();

        for key in store.get_all_keys(&value_section) {
            let Ok(id) = key.parse::<u32>() else {
                continue;
            };
            let Some(value) = store.get_value(&value_section, &key) else {
                continue;
            };
            let fetched_at = store
                .get_value(&time_section, &key)
                .and_then(|s| s.parse::<i64>().ok());
            if ttl_enabled {
                // An entry with no timestamp predates the TTL bookkeeping;
                // keep it rather than throwing away a price we paid for.
                if let Some(at) = fetched_at {
                    if now - at > CACHE_TTL_SECS {
                        continue;
                    }
                }
            }
            cache.entries.insert(id, value.to_string());
            if let Some(at) = fetched_at {
                cache.fetched_at.insert(id, at);
            }
        }
        cache
    }

    /// Writes the cache back wholesale: the old sections are deleted first so
    /// entries removed in memory don't linger on disk.
    pub fn save(&self, store: &mut SettingsStore, server: &str) {
        let value_section = section_name(CACHE_SECTION, server);
        let time_section = section_name(CACHE_TIME_SECTION, server);
        store.delete_section(&value_section);
        store.delete_section(&time_section);
        for (id, value) in &self.entries {
            store.set_value(&value_section, &id.to_string(), value.clone());
            if let Some(at) = self.fetched_at.get(id) {
                store.set_value(&time_section, &id.to_string(), at.to_string());
            }
        }
    }

    pub fn lookup(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn set(&mut self, id: u32, median: impl Into<String>) {
        self.entries.insert(id, median.into());
        self.fetched_at.insert(id, Utc::now().timestamp());
        self.pending.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.fetched_at.clear();
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mark_pending(&mut self, id: u32) {
        self.pending.insert(id);
    }

    pub fn is_pending(&self, id: u32) -> bool {
        self.pending.contains(&id)
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// The ids worth fetching for `items`: deduplicated in first-seen order,
    /// skipping id 0 placeholders and anything already cached or in flight.
    pub fn missing_ids<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<u32> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .map(|item| item.id)
            .filter(|&id| {
                id > 0
                    && !self.entries.contains_key(&id)
                    && !self.pending.contains(&id)
                    && seen.insert(id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{ItemKind, ItemLocation, RawIcon, RawItemRecord};

    fn item(id: u32, count: u32) -> Item {
        Item::from_record(
            RawItemRecord {
                id,
                count,
                kind: ItemKind::General,
                name: format!("item {}", id),
                attr: String::new(),
                description: String::new(),
                slot: String::new(),
                races: String::new(),
                jobs: String::new(),
                remarks: String::new(),
                icon: RawIcon { pixels: vec![0; 1024] },
            },
            ItemLocation::default(),
        )
    }

    #[test]
    fn missing_ids_skip_cached_and_duplicate_items() {
        let mut cache = PriceCache::new();
        cache.set(1001, "5,000");
        let items = [item(1001, 2), item(1002, 1), item(1003, 1), item(1002, 4)];
        assert_eq!(cache.missing_ids(items.iter()), vec![1002, 1003]);
    }

    #[test]
    fn missing_ids_skip_id_zero_and_pending() {
        let mut cache = PriceCache::new();
        cache.mark_pending(1002);
        let items = [item(0, 1), item(1002, 1), item(1003, 1)];
        assert_eq!(cache.missing_ids(items.iter()), vec![1003]);
    }

    #[test]
    fn set_clears_the_pending_flag() {
        let mut cache = PriceCache::new();
        cache.mark_pending(7);
        assert!(cache.is_pending(7));
        cache.set(7, "123");
        assert!(!cache.is_pending(7));
        assert_eq!(cache.lookup(7), Some("123"));
    }

    #[test]
    fn cache_round_trips_through_the_store() {
        let mut store = SettingsStore::open("unused.json");
        let mut cache = PriceCache::new();
        cache.set(100, "1,500");
        cache.set(200, "0");
        cache.save(&mut store, "Asura");

        let loaded = PriceCache::load(&store, "Asura", true);
        assert_eq!(loaded.lookup(100), Some("1,500"));
        assert_eq!(loaded.lookup(200), Some("0"));
        // Another server's cache lives in its own section.
        assert!(PriceCache::load(&store, "Bahamut", true).is_empty());
    }

    #[test]
    fn no_server_means_an_empty_cache() {
        let mut store = SettingsStore::open("unused.json");
        store.set_value(CACHE_SECTION, "100", "1,500");
        let cache = PriceCache::load(&store, "", true);
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_entries_drop_when_the_ttl_is_on() {
        let mut store = SettingsStore::open("unused.json");
        let section = section_name(CACHE_SECTION, "Asura");
        let times = section_name(CACHE_TIME_SECTION, "Asura");
        let old = Utc::now().timestamp() - CACHE_TTL_SECS - 100;
        store.set_value(&section, "100", "1,500");
        store.set_value(&times, "100", old.to_string());
        store.set_value(&section, "200", "800");
        store.set_value(&times, "200", Utc::now().timestamp().to_string());

        let with_ttl = PriceCache::load(&store, "Asura", true);
        assert_eq!(with_ttl.lookup(100), None);
        assert_eq!(with_ttl.lookup(200), Some("800"));

        let without_ttl = PriceCache::load(&store, "Asura", false);
        assert_eq!(without_ttl.lookup(100), Some("1,500"));
    }

    #[test]
    fn save_replaces_the_old_section_wholesale() {
        let mut store = SettingsStore::open("unused.json");
        let mut cache = PriceCache::new();
        cache.set(100, "1,500");
        cache.save(&mut store, "Asura");

        cache.clear();
        cache.set(200, "900");
        cache.save(&mut store, "Asura");

        let section = section_name(CACHE_SECTION, "Asura");
        assert_eq!(store.get_value(&section, "100"), None);
        assert_eq!(store.get_value(&section, "200"), Some("900"));
    }
}
