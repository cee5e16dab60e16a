//! CSV ingestion
//!
//! Reads uploaded sleep logs into a string-typed [`RawTable`]. No interpretation
//! happens here; column checks and typed parsing live in the normalizer.

use crate::error::AnalysisError;
use std::io::Read;
use std::path::Path;

/// Columns every upload must provide
pub const REQUIRED_COLUMNS: [&str; 4] = ["date", "sleep_start", "sleep_end", "quality"];

/// Sample upload in the accepted format
pub const SAMPLE_CSV: &str = "date,sleep_start,sleep_end,quality
2023-01-01,2023-01-01 23:00:00,2023-01-02 07:00:00,85
2023-01-02,2023-01-02 23:30:00,2023-01-03 07:30:00,78
";

/// Uploaded table: header plus rows of raw cell values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Parse CSV text
    pub fn from_csv_str(data: &str) -> Result<Self, AnalysisError> {
        Self::from_reader(data.as_bytes())
    }

    /// Read a CSV file from disk
    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read CSV from any reader. The first record is the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AnalysisError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns = rdr
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        log::debug!("Read {} rows with columns {:?}", rows.len(), columns);
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Required columns absent from the header
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| self.column_index(name).is_none())
            .collect()
    }

    /// Cell value, empty when the row is short
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
