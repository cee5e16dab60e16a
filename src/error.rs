//! Error types for Sleep Insight

use thiserror::Error;

/// Errors that can occur while validating, processing or analyzing a sleep dataset
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing required columns: {0}. Please ensure your CSV contains: date, sleep_start, sleep_end, quality")]
    MissingColumn(String),

    #[error("Failed to parse {column} value {value:?} in row {row}")]
    ParseError {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Sleep quality scores must be between 0 and 100 (row {row} has {value})")]
    RangeError { row: usize, value: f64 },

    #[error("Insufficient data: at least {required} records required, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
