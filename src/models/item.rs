use image::RgbaImage;
use indexmap::IndexMap;

pub const BG_WIKI_BASE_URL: &str = "https://www.bg-wiki.com/ffxi/";

/// Items keyed by id, in the order they first appeared in the save file.
pub type ItemCollection = IndexMap<u32, Item>;

/// Where an item lives in the catalog tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemLocation {
    pub character: usize,
    pub tab: usize,
}

/// Raw 32x32 icon pixels straight out of the save record, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIcon {
    pub pixels: Vec<u8>,
}

/// Kind byte of a save record. Weapons and armor carry a level sub-field,
/// everything else doesn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    General,
    Weapon { level: u8 },
    Armor { level: u8 },
}

/// One record as decoded from a save file, before catalog bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItemRecord {
    pub id: u32,
    pub count: u32,
    pub kind: ItemKind,
    pub name: String,
    pub attr: String,
    pub description: String,
    pub slot: String,
    pub races: String,
    pub jobs: String,
    pub remarks: String,
    pub icon: RawIcon,
}

/// A catalog item: a save record plus stack count, price and icon state.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: u32,
    pub count: u32,
    pub name: String,
    pub attr: String,
    pub description: String,
    pub slot: String,
    pub races: String,
    pub level: String,
    pub jobs: String,
    pub remarks: String,
    /// Formatted median price, "0" until a fetch fills it in.
    pub median: String,
    pub icon_data: RawIcon,
    pub icon: Option<RgbaImage>,
    pub icon_rendered: bool,
    pub location: ItemLocation,
}

impl Item {
    pub fn from_record(record: RawItemRecord, location: ItemLocation) -> Item {
        let level = match record.kind {
            ItemKind::Weapon { level } | ItemKind::Armor { level } if level > 0 => {
                level.to_string()
            }
            _ => String::new(),
        };
        Item {
            id: record.id,
            count: record.count.max(1),
            name: record.name,
            attr: record.attr,
            description: record.description,
            slot: record.slot,
            races: record.races,
            level,
            jobs: record.jobs,
            remarks: record.remarks,
            median: String::from("0"),
            icon_data: record.icon,
            icon: None,
            icon_rendered: false,
            location,
        }
    }

    /// List label. In compact mode stacks fold into one "Name (n)" line.
    pub fn list_text(&self, compact: bool) -> String {
        if compact && self.count > 1 {
            format!("{} ({})", self.name, self.count)
        } else {
            self.name.clone()
        }
    }

    pub fn tooltip(&self, compact: bool) -> String {
        if compact {
            format!("{} {}", self.count, self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn wiki_url(&self) -> String {
        format!("{}{}", BG_WIKI_BASE_URL, urlencoding::encode(&self.name))
    }
}
