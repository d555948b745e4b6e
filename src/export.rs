pub mod csv;

use std::{path::Path, str::FromStr};

use strum::{EnumIter, IntoEnumIterator};

use crate::catalog::InventoryCatalog;
use crate::models::item::Item;
use crate::pricing::PriceCache;
use csv::CsvWriter;

/// Optional export columns, in the order they appear in the file. Character
/// and Location always lead each row and aren't part of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ExportColumn {
    Name,
    Attr,
    Description,
    Type,
    Races,
    Level,
    Jobs,
    Remarks,
    WikiUrl,
    Median,
}

impl ExportColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportColumn::Name => "Name",
            ExportColumn::Attr => "Attr",
            ExportColumn::Description => "Description",
            ExportColumn::Type => "Type",
            ExportColumn::Races => "Races",
            ExportColumn::Level => "Level",
            ExportColumn::Jobs => "Jobs",
            ExportColumn::Remarks => "Remarks",
            ExportColumn::WikiUrl => "WikiUrl",
            ExportColumn::Median => "Median",
        }
    }

    pub fn all() -> Vec<ExportColumn> {
        ExportColumn::iter().collect()
    }

    fn value(&self, item: &Item, cache: &PriceCache) -> String {
        match self {
            ExportColumn::Name => item.name.clone(),
            ExportColumn::Attr => item.attr.clone(),
            ExportColumn::Description => item.description.clone(),
            ExportColumn::Type => item.slot.clone(),
            ExportColumn::Races => item.races.clone(),
            ExportColumn::Level => item.level.clone(),
            ExportColumn::Jobs => item.jobs.clone(),
            ExportColumn::Remarks => item.remarks.clone(),
            ExportColumn::WikiUrl => item.wiki_url(),
            ExportColumn::Median => cache
                .lookup(item.id)
                .map(str::to_string)
                .unwrap_or_else(|| item.median.clone()),
        }
    }
}

impl FromStr for ExportColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "attr" => Ok(Self::Attr),
            "description" => Ok(Self::Description),
            "type" => Ok(Self::Type),
            "races" => Ok(Self::Races),
            "level" => Ok(Self::Level),
            "jobs" => Ok(Self::Jobs),
            "remarks" => Ok(Self::Remarks),
            "wikiurl" | "wiki_url" => Ok(Self::WikiUrl),
            "median" => Ok(Self::Median),
            _ => Err(format!("{} is not an export column.", s)),
        }
    }
}

/// Writes the catalog to CSV, one row per physical item: a stack of twelve
/// crystals becomes twelve rows. `exported` selects characters by index;
/// characters past its end are included. Returns the number of item rows.
pub fn export_csv(
    path: &Path,
    catalog: &mut InventoryCatalog,
    cache: &PriceCache,
    exported: &[bool],
    columns: &[ExportColumn],
) -> Result<usize, String> {
    let mut writer = CsvWriter::create(path)?;
    writer.add_column("Character")?;
    writer.add_column("Location")?;
    for column in columns {
        writer.add_column(column.as_str())?;
    }
    writer.end_row()?;

    let mut rows = 0;
    for character in 0..catalog.characters().len() {
        if !exported.get(character).copied().unwrap_or(true) {
            continue;
        }
        for tab in 0..catalog.tabs().len() {
            let items: Vec<Item> =
                catalog.get_or_load(character, tab).values().cloned().collect();
            let character_name = &catalog.characters()[character].name;
            let tab_name = &catalog.tabs()[tab].display_name;
            for item in items {
                for _ in 0..item.count {
                    writer.add_column(character_name)?;
                    writer.add_column(tab_name)?;
                    for column in columns {
                        writer.add_column(&column.value(&item, cache))?;
                    }
                    writer.end_row()?;
                    rows += 1;
                }
            }
        }
    }
    writer.finish()?;
    Ok(rows)
}
