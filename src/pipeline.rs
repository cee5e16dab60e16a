//! Pipeline orchestration
//!
//! This module provides the public API for Sleep Insight. It runs one uploaded
//! dataset through the full pipeline, synchronously and to completion:
//! validation → feature derivation → {statistics, disorder detection} → report.
//!
//! Every call owns its feature table; the analyzer holds only immutable settings
//! and can be shared freely between threads.

use crate::adapter::RawTable;
use crate::analyzer::StatisticsEngine;
use crate::config::AnalyzerConfig;
use crate::detector::DisorderDetector;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::features::FeatureProcessor;
use crate::normalizer::Normalizer;
use crate::types::{AnalysisReport, FeatureRecord};
use std::io::Read;

/// Analyze CSV text with default settings.
///
/// # Example
/// ```ignore
/// let report = analyze_csv(SAMPLE_CSV)?;
/// println!("{:.1}h average", report.metrics.avg_duration);
/// ```
pub fn analyze_csv(data: &str) -> Result<AnalysisReport, AnalysisError> {
    SleepAnalyzer::default().analyze_table(&RawTable::from_csv_str(data)?)
}

/// Configured analyzer
pub struct SleepAnalyzer {
    processor: FeatureProcessor,
    engine: StatisticsEngine,
    detector: DisorderDetector,
    encoder: ReportEncoder,
}

impl Default for SleepAnalyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl SleepAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            processor: FeatureProcessor::from_config(config),
            engine: StatisticsEngine::from_config(config),
            detector: DisorderDetector::new(config.thresholds.clone()),
            encoder: ReportEncoder::new(),
        }
    }

    /// Replace the report encoder (e.g. to pin the instance id)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Validate and derive the feature table only
    pub fn features(&self, table: &RawTable) -> Result<Vec<FeatureRecord>, AnalysisError> {
        Normalizer::validate(table)?;
        self.processor.process(table)
    }

    /// Run the full pipeline on an uploaded table.
    ///
    /// Pipeline stages:
    /// 1. Normalizer - check columns, timestamps and quality range
    /// 2. FeatureProcessor - derive duration, latency, weekday, rolling means
    /// 3. StatisticsEngine - metrics and statistical report
    /// 4. DisorderDetector - rule-based disorder screening
    /// 5. ReportEncoder - wrap everything in a report envelope
    ///
    /// Any failure aborts the whole analysis; nothing partial is returned.
    pub fn analyze_table(&self, table: &RawTable) -> Result<AnalysisReport, AnalysisError> {
        let features = self.features(table)?;
        log::debug!("Derived features for {} records", features.len());

        let metrics = self.engine.summarize(&features)?;
        let statistics = self.engine.analyze(&features)?;
        let disorders = self.detector.detect(&features);

        if !disorders.is_clear() {
            log::info!(
                "Detected patterns: {}",
                disorders
                    .detected_disorders
                    .iter()
                    .map(|d| d.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(self.encoder.encode(features, metrics, statistics, disorders))
    }

    /// Read CSV from any reader and analyze it
    pub fn analyze_reader<R: Read>(&self, reader: R) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_table(&RawTable::from_reader(reader)?)
    }

    /// Encode a report to JSON
    pub fn to_json(&self, report: &AnalysisReport) -> Result<String, AnalysisError> {
        self.encoder.to_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SAMPLE_CSV;
    use crate::types::DisorderKind;

    #[test]
    fn test_analyze_sample() {
        let report = analyze_csv(SAMPLE_CSV).unwrap();

        assert_eq!(report.record_count, 2);
        assert_eq!(report.features[0].duration, 8.0);
        assert_eq!(report.features[1].duration, 8.0);
        assert_eq!(report.metrics.avg_duration, 8.0);
        assert_eq!(report.metrics.efficiency, 100.0);
        assert!(report.disorders.is_clear());
    }

    #[test]
    fn test_validation_failure_aborts() {
        let csv = "date,sleep_start,sleep_end,quality\n2023-01-01,2023-01-01 23:00:00,2023-01-02 07:00:00,150\n";
        assert!(matches!(
            analyze_csv(csv),
            Err(AnalysisError::RangeError { .. })
        ));
    }

    #[test]
    fn test_missing_columns_abort() {
        assert!(matches!(
            analyze_csv("date,quality\n2023-01-01,80\n"),
            Err(AnalysisError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let csv = "date,sleep_start,sleep_end,quality\n2023-01-01,2023-01-01 23:00:00,2023-01-02 07:00:00,85\n";
        assert!(matches!(
            analyze_csv(csv),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_features_without_statistics() {
        let csv = "date,sleep_start,sleep_end,quality\n2023-01-01,2023-01-01 23:00:00,2023-01-02 07:00:00,85\n";
        let table = RawTable::from_csv_str(csv).unwrap();
        let features = SleepAnalyzer::default().features(&table).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].rolling_avg_quality, 85.0);
    }

    #[test]
    fn test_configured_thresholds_reach_detector() {
        let mut config = AnalyzerConfig::default();
        config.thresholds.delayed_sleep.late_wake_hour = 7;
        let report = SleepAnalyzer::new(&config)
            .analyze_reader(SAMPLE_CSV.as_bytes())
            .unwrap();
        assert_eq!(
            report.disorders.detected_disorders,
            vec![DisorderKind::DelayedSleepPhase]
        );
    }

    #[test]
    fn test_pinned_instance_id() {
        let analyzer =
            SleepAnalyzer::default().with_encoder(ReportEncoder::with_instance_id("fixed".into()));
        let report = analyzer.analyze_table(&RawTable::from_csv_str(SAMPLE_CSV).unwrap()).unwrap();
        let json = analyzer.to_json(&report).unwrap();
        assert!(json.contains("\"instance_id\": \"fixed\""));
    }
}
