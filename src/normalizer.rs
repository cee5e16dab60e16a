//! Record validation and normalization
//!
//! This module checks an uploaded [`RawTable`] and converts it into typed
//! [`RawRecord`]s:
//! - Required columns present
//! - Dates and timestamps parse (several common layouts are accepted)
//! - Quality scores within [0, 100]

use crate::adapter::RawTable;
use crate::error::AnalysisError;
use crate::types::RawRecord;
use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp layouts accepted for date/time columns
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column positions resolved from the header
struct ColumnLayout {
    date: usize,
    sleep_start: usize,
    sleep_end: usize,
    quality: usize,
}

impl ColumnLayout {
    fn resolve(table: &RawTable) -> Result<Self, AnalysisError> {
        let missing = table.missing_columns();
        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumn(missing.join(", ")));
        }

        let index = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            date: index("date")?,
            sleep_start: index("sleep_start")?,
            sleep_end: index("sleep_end")?,
            quality: index("quality")?,
        })
    }
}

/// Normalizer for converting raw tables to typed records
pub struct Normalizer;

impl Normalizer {
    /// Validate a table without producing records.
    ///
    /// Returns `Ok(true)` when every row would parse; the table is never modified.
    pub fn validate(table: &RawTable) -> Result<bool, AnalysisError> {
        Self::normalize(table)?;
        Ok(true)
    }

    /// Parse every row into a typed record, in original row order
    pub fn normalize(table: &RawTable) -> Result<Vec<RawRecord>, AnalysisError> {
        let layout = ColumnLayout::resolve(table)?;

        let mut records = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            records.push(parse_row(table, &layout, row)?);
        }

        Ok(records)
    }
}

fn parse_row(
    table: &RawTable,
    layout: &ColumnLayout,
    row: usize,
) -> Result<RawRecord, AnalysisError> {
    let date = parse_timestamp(table.cell(row, layout.date))
        .map(|dt| dt.date())
        .ok_or_else(|| parse_error(table, row, "date", layout.date))?;

    let sleep_start = parse_timestamp(table.cell(row, layout.sleep_start))
        .ok_or_else(|| parse_error(table, row, "sleep_start", layout.sleep_start))?;

    let sleep_end = parse_timestamp(table.cell(row, layout.sleep_end))
        .ok_or_else(|| parse_error(table, row, "sleep_end", layout.sleep_end))?;

    let quality = table
        .cell(row, layout.quality)
        .parse::<f64>()
        .map_err(|_| parse_error(table, row, "quality", layout.quality))?;

    // NaN fails the range check as well
    if !(0.0..=100.0).contains(&quality) {
        return Err(AnalysisError::RangeError {
            row,
            value: quality,
        });
    }

    Ok(RawRecord {
        date,
        sleep_start,
        sleep_end,
        quality,
    })
}

fn parse_error(table: &RawTable, row: usize, column: &str, index: usize) -> AnalysisError {
    AnalysisError::ParseError {
        row,
        column: column.to_string(),
        value: table.cell(row, index).to_string(),
    }
}

/// Parse a timestamp in any accepted layout; a bare date is midnight
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
