use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Minimal CSV writing: columns are quoted only when they need it, quotes
/// escape by doubling, rows end with \r\n.
pub struct CsvWriter {
    writer: BufWriter<File>,
    row_has_columns: bool,
}

impl CsvWriter {
    pub fn create(path: &Path) -> Result<CsvWriter, String> {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create {:?} \n{}", path, e))?;
        Ok(CsvWriter {
            writer: BufWriter::new(file),
            row_has_columns: false,
        })
    }

    pub fn add_column(&mut self, text: &str) -> Result<(), String> {
        if self.row_has_columns {
            self.write(",")?;
        }
        self.row_has_columns = true;
        if text.contains(',') || text.contains('"') || text.contains('\n') {
            let escaped = text.replace('"', "\"\"");
            self.write(&format!("\"{}\"", escaped))
        } else {
            self.write(text)
        }
    }

    pub fn end_row(&mut self) -> Result<(), String> {
        self.row_has_columns = false;
        self.write("\r\n")
    }

    pub fn finish(mut self) -> Result<(), String> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush the csv file \n{}", e))
    }

    fn write(&mut self, text: &str) -> Result<(), String> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| format!("Failed to write to the csv file \n{}", e))
    }
}
