//! CSV persistence for fetched tables
//!
//! Files are written as UTF-8 with a byte-order mark so spreadsheet tools
//! pick the right encoding, and are named with the run date (`dd-mm-YYYY`).

use crate::harvest::Table;
use crate::state::WorkItem;
use crate::PersistError;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Destination for a successfully fetched item's table
pub trait Persister {
    /// Stores `table` for `item` and returns where it went
    fn persist(&self, item: &WorkItem, table: &Table) -> Result<PathBuf, PersistError>;
}

/// Writes each table to its own CSV file in one directory
#[derive(Debug, Clone)]
pub struct CsvPersister {
    directory: PathBuf,
    date_stamp: String,
}

impl CsvPersister {
    /// Creates a persister stamping files with today's local date
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let date_stamp = chrono::Local::now().format("%d-%m-%Y").to_string();
        Self::with_date_stamp(directory, date_stamp)
    }

    pub fn with_date_stamp(directory: impl Into<PathBuf>, date_stamp: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            date_stamp: date_stamp.into(),
        }
    }

    /// File name used for an item's detail table
    pub fn detail_file_name(&self, item: &WorkItem) -> String {
        format!(
            "assets-{}-{}-{}.csv",
            sanitize_filename(item.key()),
            sanitize_filename(item.label()),
            self.date_stamp
        )
    }

    /// File name used for a summary section snapshot
    pub fn section_file_name(&self, section: &str) -> String {
        format!("{}-{}.csv", sanitize_filename(section), self.date_stamp)
    }

    /// Writes `table` to `file_name` inside the output directory
    pub fn write_table(&self, file_name: &str, table: &Table) -> Result<PathBuf, PersistError> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(file_name);

        let mut file = File::create(&path)?;
        file.write_all("\u{feff}".as_bytes())?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(path)
    }
}

impl Persister for CsvPersister {
    fn persist(&self, item: &WorkItem, table: &Table) -> Result<PathBuf, PersistError> {
        let file_name = self.detail_file_name(item);
        self.write_table(&file_name, table)
    }
}

/// Strips characters that are not allowed in file names on common platforms
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect::<String>()
        .trim()
        .to_string()
}
