//! Report encoding
//!
//! This module wraps pipeline outputs in an [`AnalysisReport`] envelope and
//! writes the feature table back out as CSV for download.

use crate::error::AnalysisError;
use crate::types::{
    AnalysisReport, DisorderReport, FeatureRecord, Metrics, ReportProducer, StatisticalReport,
};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use std::io::Write;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Header of the exported feature table
pub const FEATURE_CSV_HEADER: [&str; 9] = [
    "date",
    "sleep_start",
    "sleep_end",
    "quality",
    "duration",
    "latency",
    "day_of_week",
    "rolling_avg_duration",
    "rolling_avg_quality",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Assemble the report envelope
    pub fn encode(
        &self,
        features: Vec<FeatureRecord>,
        metrics: Metrics,
        statistics: StatisticalReport,
        disorders: DisorderReport,
    ) -> AnalysisReport {
        AnalysisReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            record_count: features.len(),
            metrics,
            statistics,
            disorders,
            features,
        }
    }

    /// Encode a report to pretty JSON
    pub fn to_json(&self, report: &AnalysisReport) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(report).map_err(AnalysisError::Json)
    }
}

/// Write the feature table as CSV
pub fn write_features_csv<W: Write>(
    features: &[FeatureRecord],
    writer: W,
) -> Result<(), AnalysisError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(FEATURE_CSV_HEADER)?;

    for f in features {
        wtr.write_record(&[
            f.record.date.format("%Y-%m-%d").to_string(),
            f.record.sleep_start.format(TIMESTAMP_FORMAT).to_string(),
            f.record.sleep_end.format(TIMESTAMP_FORMAT).to_string(),
            f.record.quality.to_string(),
            f.duration.to_string(),
            f.latency.to_string(),
            f.day_of_week.to_string(),
            f.rolling_avg_duration.to_string(),
            f.rolling_avg_quality.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Feature table as a CSV string
pub fn features_to_csv(features: &[FeatureRecord]) -> Result<String, AnalysisError> {
    let mut buffer = Vec::new();
    write_features_csv(features, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| AnalysisError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{RawTable, SAMPLE_CSV};
    use crate::analyzer::{analyze, summarize};
    use crate::detector::detect;
    use crate::features::process;

    fn sample_features() -> Vec<FeatureRecord> {
        process(&RawTable::from_csv_str(SAMPLE_CSV).unwrap()).unwrap()
    }

    #[test]
    fn test_feature_csv_export() {
        let csv = features_to_csv(&sample_features()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], FEATURE_CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "2023-01-01,2023-01-01 23:00:00,2023-01-02 07:00:00,85,8,60,Sunday,8,85"
        );
        assert_eq!(
            lines[2],
            "2023-01-02,2023-01-02 23:30:00,2023-01-03 07:30:00,78,8,90,Monday,8,81.5"
        );
    }

    #[test]
    fn test_exported_csv_reloads() {
        let csv = features_to_csv(&sample_features()).unwrap();
        let table = RawTable::from_csv_str(&csv).unwrap();
        assert!(table.missing_columns().is_empty());
        assert_eq!(process(&table).unwrap(), sample_features());
    }

    #[test]
    fn test_encode_envelope() {
        let features = sample_features();
        let metrics = summarize(&features).unwrap();
        let statistics = analyze(&features).unwrap();
        let disorders = detect(&features);

        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(features, metrics, statistics, disorders);
        let json = encoder.to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["producer"]["instance_id"], "test-instance");
        assert_eq!(value["record_count"], 2);
        assert_eq!(value["metrics"]["efficiency"], 100.0);
        assert_eq!(value["features"][0]["day_of_week"], "Sunday");
        assert_eq!(value["features"][0]["sleep_start"], "2023-01-01T23:00:00");
        assert_eq!(
            value["statistics"]["sleep_quality"]["distribution"]["good"],
            1
        );
        assert!(value["disorders"]["detected_disorders"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_disorder_names_in_json() {
        let mut report = DisorderReport::default();
        report
            .detected_disorders
            .push(crate::types::DisorderKind::IrregularRhythm);
        report.risk_levels.insert(
            crate::types::DisorderKind::IrregularRhythm,
            Default::default(),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["detected_disorders"][0], "Irregular Sleep-Wake Rhythm");
        assert!(value["risk_levels"]["Irregular Sleep-Wake Rhythm"].is_object());
    }
}
