use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

use crate::models::{
    character::{Character, TabInfo},
    item::{Item, ItemCollection, ItemLocation, RawIcon},
    language::Language,
};
use crate::parsing::InventoryParser;

const ICON_SIDE: u32 = 32;

/// Turns raw icon bytes into something drawable. A trait so catalog tests
/// don't have to care about pixels.
pub trait IconRenderer {
    fn render(&self, icon: &RawIcon) -> Option<RgbaImage>;
}

/// The save format stores icons as 32x32 single-byte pixels. Black is the
/// transparency key, everything else renders as a gray level.
pub struct GrayscaleIconRenderer;

impl IconRenderer for GrayscaleIconRenderer {
    fn render(&self, icon: &RawIcon) -> Option<RgbaImage> {
        if icon.pixels.len() != (ICON_SIDE * ICON_SIDE) as usize {
            return None;
        }
        let mut image = RgbaImage::new(ICON_SIDE, ICON_SIDE);
        for (i, &value) in icon.pixels.iter().enumerate() {
            let x = i as u32 % ICON_SIDE;
            let y = i as u32 / ICON_SIDE;
            let alpha = if value == 0 { 0 } else { 255 };
            image.put_pixel(x, y, Rgba([value, value, value, alpha]));
        }
        Some(image)
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub use_regex: bool,
    /// Match against every text field instead of just the name.
    pub match_any_field: bool,
}

impl SearchQuery {
    pub fn matcher(&self) -> Result<SearchMatcher, String> {
        let pattern = if self.use_regex {
            self.text.clone()
        } else {
            regex::escape(&self.text)
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| format!("Invalid search pattern '{}' \n{}", self.text, e))?;
        Ok(SearchMatcher {
            regex,
            match_any_field: self.match_any_field,
        })
    }
}

pub struct SearchMatcher {
    regex: Regex,
    match_any_field: bool,
}

impl SearchMatcher {
    pub fn matches(&self, item: &Item) -> bool {
        if self.regex.is_match(&item.name) {
            return true;
        }
        self.match_any_field
            && [
                &item.attr,
                &item.description,
                &item.slot,
                &item.races,
                &item.jobs,
                &item.remarks,
            ]
            .iter()
            .any(|field| self.regex.is_match(field))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub location: ItemLocation,
    pub item_id: u32,
}

/// One open search. Hits are computed the first time results are asked for
/// and stay fixed until the tab is closed.
pub struct SearchTab {
    pub query: SearchQuery,
    hits: Vec<SearchHit>,
    done: bool,
}

/// The inventory tree: character -> tab -> items. Tabs load lazily on first
/// access and stay cached until refreshed or unloaded.
pub struct InventoryCatalog {
    game_path: PathBuf,
    characters: Vec<Character>,
    tabs: Vec<TabInfo>,
    language: Language,
    parser: Box<dyn InventoryParser>,
    loaded: IndexMap<usize, IndexMap<usize, ItemCollection>>,
    searches: Vec<SearchTab>,
}

impl InventoryCatalog {
    pub fn new(
        game_path: PathBuf,
        characters: Vec<Character>,
        tabs: Vec<TabInfo>,
        language: Language,
        parser: Box<dyn InventoryParser>,
    ) -> InventoryCatalog {
        InventoryCatalog {
            game_path,
            characters,
            tabs,
            language,
            parser,
            loaded: IndexMap::new(),
            searches: Vec::new(),
        }
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn tabs(&self) -> &[TabInfo] {
        &self.tabs
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn rename_character(&mut self, index: usize, name: &str) {
        if let Some(character) = self.characters.get_mut(index) {
            character.name = if name.is_empty() {
                character.id.clone()
            } else {
                name.to_string()
            };
        }
    }

    /// Items of one tab, parsing the save file on first access.
    pub fn get_or_load(&mut self, character: usize, tab: usize) -> &ItemCollection {
        if !self.is_loaded(character, tab) {
            let items = self.parse_tab(character, tab);
            self.loaded
                .entry(character)
                .or_default()
                .insert(tab, items);
        }
        &self.loaded[&character][&tab]
    }

    /// Drops the cached tab and re-parses it from disk.
    pub fn force_refresh(&mut self, character: usize, tab: usize) -> &ItemCollection {
        if let Some(tabs) = self.loaded.get_mut(&character) {
            tabs.shift_remove(&tab);
        }
        self.get_or_load(character, tab)
    }

    /// Loads every tab of every character, reporting progress after each tab.
    pub fn load_all(&mut self, progress: &mut dyn FnMut(usize, usize)) {
        let total = self.characters.len() * self.tabs.len();
        let mut completed = 0;
        for character in 0..self.characters.len() {
            for tab in 0..self.tabs.len() {
                self.get_or_load(character, tab);
                completed += 1;
                progress(completed, total);
            }
        }
    }

    /// Total item count across whatever is currently loaded. Unloaded tabs
    /// count as zero; call `load_all` first for a full census.
    pub fn count_all(&self) -> usize {
        self.all_items().map(|item| item.count as usize).sum()
    }

    pub fn unload_all(&mut self) {
        self.loaded.clear();
        self.searches.clear();
    }

    /// Switching language re-parses every loaded tab, since item text lives
    /// in per-language blocks inside the save records.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        let open: Vec<(usize, usize)> = self
            .loaded
            .iter()
            .flat_map(|(&c, tabs)| tabs.keys().map(move |&t| (c, t)))
            .collect();
        self.loaded.clear();
        for (character, tab) in open {
            self.get_or_load(character, tab);
        }
    }

    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.loaded
            .values()
            .flat_map(|tabs| tabs.values())
            .flat_map(|items| items.values())
    }

    /// Renders icons for a tab's items. Each item gets at most one render
    /// attempt, even when the renderer declines it.
    pub fn ensure_icons(&mut self, character: usize, tab: usize, renderer: &dyn IconRenderer) {
        self.get_or_load(character, tab);
        if let Some(items) = self
            .loaded
            .get_mut(&character)
            .and_then(|tabs| tabs.get_mut(&tab))
        {
            for item in items.values_mut() {
                if !item.icon_rendered {
                    item.icon = renderer.render(&item.icon_data);
                    item.icon_rendered = true;
                }
            }
        }
    }

    /// Opens a search tab. Fails only when the query pattern doesn't parse.
    pub fn open_search(&mut self, query: SearchQuery) -> Result<usize, String> {
        query.matcher()?;
        self.searches.push(SearchTab {
            query,
            hits: Vec::new(),
            done: false,
        });
        Ok(self.searches.len() - 1)
    }

    /// Hits of a search tab, scanning the whole catalog the first time.
    pub fn search_results(&mut self, search: usize) -> Result<&[SearchHit], String> {
        if search >= self.searches.len() {
            return Err(format!("No search tab at index {}", search));
        }
        if !self.searches[search].done {
            let matcher = self.searches[search].query.matcher()?;
            self.load_all(&mut |_, _| {});
            let hits: Vec<SearchHit> = self
                .all_items()
                .filter(|item| matcher.matches(item))
                .map(|item| SearchHit {
                    location: item.location,
                    item_id: item.id,
                })
                .collect();
            let tab = &mut self.searches[search];
            tab.hits = hits;
            tab.done = true;
        }
        Ok(&self.searches[search].hits)
    }

    pub fn close_search(&mut self, search: usize) {
        if search < self.searches.len() {
            self.searches.remove(search);
        }
    }

    fn is_loaded(&self, character: usize, tab: usize) -> bool {
        self.loaded
            .get(&character)
            .is_some_and(|tabs| tabs.contains_key(&tab))
    }

    fn parse_tab(&self, character: usize, tab: usize) -> ItemCollection {
        let (Some(character_info), Some(tab_info)) =
            (self.characters.get(character), self.tabs.get(tab))
        else {
            return ItemCollection::new();
        };
        let path = self
            .game_path
            .join("USER")
            .join(&character_info.id)
            .join(&tab_info.file_name);
        let records = self.parser.parse(&path, self.language);

        let location = ItemLocation { character, tab };
        let mut items = ItemCollection::new();
        for record in records {
            match items.get_mut(&record.id) {
                // Same item in several slots shows as one stack.
                Some(existing) => existing.count += record.count.max(1),
                None => {
                    items.insert(record.id, Item::from_record(record, location));
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{ItemKind, RawItemRecord};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Hands out canned records per save file name and counts parse calls.
    struct FakeParser {
        records: IndexMap<String, Vec<RawItemRecord>>,
        calls: Rc<RefCell<usize>>,
    }

    impl FakeParser {
        fn new(records: IndexMap<String, Vec<RawItemRecord>>) -> FakeParser {
            FakeParser { records, calls: Rc::new(RefCell::new(0)) }
        }
    }

    impl InventoryParser for FakeParser {
        fn parse(&self, path: &Path, language: Language) -> Vec<RawItemRecord> {
            *self.calls.borrow_mut() += 1;
            let file = path.file_name().unwrap().to_string_lossy().to_string();
            self.records
                .get(&file)
                .map(|records| {
                    records
                        .iter()
                        .cloned()
                        .map(|mut r| {
                            if language == Language::Japanese {
                                r.name = format!("jp {}", r.name);
                            }
                            r
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    }

    fn record(id: u32, count: u32, name: &str) -> RawItemRecord {
        RawItemRecord {
            id,
            count,
            kind: ItemKind::General,
            name: name.to_string(),
            attr: String::new(),
            description: String::new(),
            slot: String::new(),
            races: String::new(),
            jobs: String::new(),
            remarks: String::new(),
            icon: RawIcon { pixels: vec![128; 1024] },
        }
    }

    fn catalog(records: IndexMap<String, Vec<RawItemRecord>>) -> InventoryCatalog {
        catalog_with_calls(records).0
    }

    fn catalog_with_calls(
        records: IndexMap<String, Vec<RawItemRecord>>,
    ) -> (InventoryCatalog, Rc<RefCell<usize>>) {
        let parser = FakeParser::new(records);
        let calls = Rc::clone(&parser.calls);
        let catalog = InventoryCatalog::new(
            PathBuf::from("game"),
            vec![Character::new("char1")],
            vec![
                TabInfo {
                    file_name: "inventory.sav".to_string(),
                    display_name: "Inventory".to_string(),
                },
                TabInfo {
                    file_name: "mogsafe.sav".to_string(),
                    display_name: "Mog Safe".to_string(),
                },
            ],
            Language::English,
            Box::new(parser),
        );
        (catalog, calls)
    }

    fn one_tab(records: Vec<RawItemRecord>) -> IndexMap<String, Vec<RawItemRecord>> {
        IndexMap::from([("inventory.sav".to_string(), records)])
    }

    #[test]
    fn duplicate_ids_collapse_into_one_stack() {
        let mut catalog = catalog(one_tab(vec![
            record(10, 2, "Fire Crystal"),
            record(20, 1, "Earth Crystal"),
            record(10, 3, "Fire Crystal"),
        ]));
        let items = catalog.get_or_load(0, 0);
        assert_eq!(items.len(), 2);
        assert_eq!(items[&10].count, 5);
        assert_eq!(items[&20].count, 1);
    }

    #[test]
    fn tabs_parse_once_until_refreshed() {
        let (mut catalog, calls) =
            catalog_with_calls(one_tab(vec![record(10, 1, "Fire Crystal")]));
        catalog.get_or_load(0, 0);
        catalog.get_or_load(0, 0);
        assert_eq!(*calls.borrow(), 1);
        catalog.force_refresh(0, 0);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn count_all_only_counts_loaded_tabs() {
        let mut catalog = catalog(IndexMap::from([
            ("inventory.sav".to_string(), vec![record(10, 4, "Fire Crystal")]),
            ("mogsafe.sav".to_string(), vec![record(20, 2, "Earth Crystal")]),
        ]));
        assert_eq!(catalog.count_all(), 0);
        catalog.get_or_load(0, 0);
        assert_eq!(catalog.count_all(), 4);
        catalog.load_all(&mut |_, _| {});
        assert_eq!(catalog.count_all(), 6);
        catalog.unload_all();
        assert_eq!(catalog.count_all(), 0);
    }

    #[test]
    fn load_all_reports_progress_per_tab() {
        let mut catalog = catalog(one_tab(vec![record(10, 1, "Fire Crystal")]));
        let mut seen = Vec::new();
        catalog.load_all(&mut |completed, total| seen.push((completed, total)));
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn language_switch_reparses_open_tabs() {
        let mut catalog = catalog(one_tab(vec![record(10, 1, "Fire Crystal")]));
        assert_eq!(catalog.get_or_load(0, 0)[&10].name, "Fire Crystal");
        catalog.set_language(Language::Japanese);
        assert_eq!(catalog.get_or_load(0, 0)[&10].name, "jp Fire Crystal");
    }

    #[test]
    fn search_hits_are_computed_once() {
        let mut catalog = catalog(one_tab(vec![
            record(10, 1, "Fire Crystal"),
            record(20, 1, "Earth Crystal"),
            record(30, 1, "Kraken Club"),
        ]));
        let search = catalog
            .open_search(SearchQuery {
                text: "crystal".to_string(),
                use_regex: false,
                match_any_field: false,
            })
            .unwrap();
        let hits = catalog.search_results(search).unwrap().to_vec();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].item_id, 10);

        // A refresh doesn't disturb an already-computed search tab.
        catalog.force_refresh(0, 0);
        assert_eq!(catalog.search_results(search).unwrap().len(), 2);
    }

    #[test]
    fn bad_regex_refuses_to_open() {
        let mut catalog = catalog(one_tab(vec![]));
        let result = catalog.open_search(SearchQuery {
            text: "[unclosed".to_string(),
            use_regex: true,
            match_any_field: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn regex_search_scans_other_fields_on_request() {
        let mut with_jobs = record(40, 1, "Leaping Boots");
        with_jobs.jobs = "THF".to_string();
        let mut catalog = catalog(one_tab(vec![with_jobs]));
        let narrow = catalog
            .open_search(SearchQuery {
                text: "thf".to_string(),
                use_regex: false,
                match_any_field: false,
            })
            .unwrap();
        assert!(catalog.search_results(narrow).unwrap().is_empty());
        let wide = catalog
            .open_search(SearchQuery {
                text: "thf".to_string(),
                use_regex: false,
                match_any_field: true,
            })
            .unwrap();
        assert_eq!(catalog.search_results(wide).unwrap().len(), 1);
    }

    #[test]
    fn icons_render_at_most_once() {
        struct CountingRenderer(RefCell<usize>);
        impl IconRenderer for CountingRenderer {
            fn render(&self, icon: &RawIcon) -> Option<RgbaImage> {
                *self.0.borrow_mut() += 1;
                GrayscaleIconRenderer.render(icon)
            }
        }
        let mut catalog = catalog(one_tab(vec![record(10, 1, "Fire Crystal")]));
        let renderer = CountingRenderer(RefCell::new(0));
        catalog.ensure_icons(0, 0, &renderer);
        catalog.ensure_icons(0, 0, &renderer);
        assert_eq!(*renderer.0.borrow(), 1);
        let item = &catalog.get_or_load(0, 0)[&10];
        assert!(item.icon_rendered);
        assert!(item.icon.is_some());
    }

    #[test]
    fn black_pixels_become_transparent() {
        let mut pixels = vec![0u8; 1024];
        pixels[0] = 200;
        let image = GrayscaleIconRenderer
            .render(&RawIcon { pixels })
            .unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [200, 200, 200, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0, 0]);
    }
}
