use std::{fs, path::Path};

use crate::models::{
    item::{ItemKind, RawIcon, RawItemRecord},
    language::Language,
};

/// Save file header: 4 byte magic then a u32 LE record count.
const MAGIC: [u8; 4] = *b"XISV";
const HEADER_LEN: usize = 8;

/// Fixed record layout. Name text repeats once per client language.
const RECORD_LEN: usize = 1352;
const NAME_LEN: usize = 32;
const EMPTY_SLOT_ID: u16 = 0xFFFF;

const KIND_WEAPON: u8 = 1;
const KIND_ARMOR: u8 = 2;

const OFF_ID: usize = 0;
const OFF_COUNT: usize = 2;
const OFF_KIND: usize = 3;
const OFF_LEVEL: usize = 4;
const OFF_NAMES: usize = 8;
const OFF_ATTR: usize = 136;
const OFF_DESCRIPTION: usize = 168;
const OFF_SLOT: usize = 232;
const OFF_RACES: usize = 248;
const OFF_JOBS: usize = 264;
const OFF_REMARKS: usize = 296;
const OFF_ICON: usize = 328;
const ICON_LEN: usize = 1024;

const ATTR_LEN: usize = 32;
const DESCRIPTION_LEN: usize = 64;
const SLOT_LEN: usize = 16;
const RACES_LEN: usize = 16;
const JOBS_LEN: usize = 32;
const REMARKS_LEN: usize = 32;

/// Seam between the catalog and the on-disk save format, so catalog tests can
/// feed records in without touching the filesystem.
pub trait InventoryParser {
    /// Records of one save file. Missing or malformed files yield an empty
    /// list; a tab with no readable save is just an empty tab.
    fn parse(&self, path: &Path, language: Language) -> Vec<RawItemRecord>;
}

pub struct SaveFileParser;

impl InventoryParser for SaveFileParser {
    fn parse(&self, path: &Path, language: Language) -> Vec<RawItemRecord> {
        match fs::read(path) {
            Ok(data) => parse_records(&data, language),
            Err(_) => Vec::new(),
        }
    }
}

/// Decodes every occupied slot out of a save buffer. A bad magic or truncated
/// header means no records; a truncated trailing record is dropped.
pub fn parse_records(data: &[u8], language: Language) -> Vec<RawItemRecord> {
    if data.len() < HEADER_LEN || data[..4] != MAGIC {
        return Vec::new();
    }
    let declared = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let available = (data.len() - HEADER_LEN) / RECORD_LEN;
    let count = declared.min(available);

    let mut records = Vec::new();
    for i in 0..count {
        let start = HEADER_LEN + i * RECORD_LEN;
        let record = &data[start..start + RECORD_LEN];
        let id = u16::from_le_bytes([record[OFF_ID], record[OFF_ID + 1]]);
        if id == EMPTY_SLOT_ID {
            continue;
        }
        records.push(decode_record(record, id, language));
    }
    records
}

fn decode_record(record: &[u8], id: u16, language: Language) -> RawItemRecord {
    let level = record[OFF_LEVEL];
    let kind = match record[OFF_KIND] {
        KIND_WEAPON => ItemKind::Weapon { level },
        KIND_ARMOR => ItemKind::Armor { level },
        _ => ItemKind::General,
    };
    let name_start = OFF_NAMES + language.index() * NAME_LEN;
    RawItemRecord {
        id: u32::from(id),
        count: u32::from(record[OFF_COUNT]),
        kind,
        name: fixed_str(record, name_start, NAME_LEN),
        attr: fixed_str(record, OFF_ATTR, ATTR_LEN),
        description: fixed_str(record, OFF_DESCRIPTION, DESCRIPTION_LEN),
        slot: fixed_str(record, OFF_SLOT, SLOT_LEN),
        races: fixed_str(record, OFF_RACES, RACES_LEN),
        jobs: fixed_str(record, OFF_JOBS, JOBS_LEN),
        remarks: fixed_str(record, OFF_REMARKS, REMARKS_LEN),
        icon: RawIcon {
            pixels: record[OFF_ICON..OFF_ICON + ICON_LEN].to_vec(),
        },
    }
}

/// Fixed-width field, text runs up to the first NUL.
fn fixed_str(record: &[u8], offset: usize, len: usize) -> String {
    let field = &record[offset..offset + len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(len);
    String::from_utf8_lossy(&field[..end]).to_string()
}
