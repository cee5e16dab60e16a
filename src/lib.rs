//! Sleep Insight - Deterministic analysis core for sleep session time series
//!
//! Sleep Insight turns an uploaded table of nightly sleep sessions into derived
//! features, descriptive statistics and rule-based disorder-risk flags through a
//! deterministic pipeline: CSV ingestion → normalization → feature derivation
//! → {statistics, disorder detection} → report encoding.
//!
//! ## Modules
//!
//! - **Feature Processor**: duration, latency, day of week and rolling means per night
//! - **Statistics Engine**: summary metrics, distributions, patterns and correlations
//! - **Disorder Detector**: threshold rules for insomnia, irregular rhythm and delayed phase
//!
//! Results are screening signals, not diagnoses.

pub mod adapter;
pub mod analyzer;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod rolling;
pub mod series;
pub mod stats;
pub mod types;

pub use adapter::{RawTable, REQUIRED_COLUMNS, SAMPLE_CSV};
pub use analyzer::StatisticsEngine;
pub use config::{AnalyzerConfig, DetectorThresholds};
pub use detector::DisorderDetector;
pub use error::AnalysisError;
pub use features::FeatureProcessor;
pub use normalizer::Normalizer;
pub use pipeline::{analyze_csv, SleepAnalyzer};
pub use types::{AnalysisReport, DisorderKind, FeatureRecord, Metrics, RawRecord};

/// Crate version embedded in every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "sleep-insight";
