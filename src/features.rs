//! Feature derivation
//!
//! This module derives per-night features from validated records:
//! - Sleep duration (hours) and latency against an ideal bedtime (minutes)
//! - Day of week
//! - Trailing rolling averages of duration and quality
//!
//! Records keep their original row order; nothing is re-sorted.

use crate::adapter::RawTable;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::normalizer::Normalizer;
use crate::rolling::{rolling_means, DEFAULT_ROLLING_WINDOW};
use crate::types::{FeatureRecord, RawRecord};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MAX_BEDTIME_HOUR: u32 = 23;

/// Feature processor for computing the feature table
#[derive(Debug, Clone)]
pub struct FeatureProcessor {
    rolling_window: usize,
    ideal_bedtime_hour: u32,
}

impl Default for FeatureProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW, 22)
    }
}

impl FeatureProcessor {
    /// Hours past 23 are clamped to 23
    pub fn new(rolling_window: usize, ideal_bedtime_hour: u32) -> Self {
        if ideal_bedtime_hour > MAX_BEDTIME_HOUR {
            log::warn!(
                "Ideal bedtime hour {} is not an hour of day; using {}",
                ideal_bedtime_hour,
                MAX_BEDTIME_HOUR
            );
        }
        Self {
            rolling_window,
            ideal_bedtime_hour: ideal_bedtime_hour.min(MAX_BEDTIME_HOUR),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.rolling_window, config.ideal_bedtime_hour)
    }

    /// Parse a validated table and derive its features
    pub fn process(&self, table: &RawTable) -> Result<Vec<FeatureRecord>, AnalysisError> {
        let records = Normalizer::normalize(table)?;
        Ok(self.process_records(&records))
    }

    /// Derive features for typed records. Pure: the same input always yields the
    /// same table.
    pub fn process_records(&self, records: &[RawRecord]) -> Vec<FeatureRecord> {
        let durations: Vec<f64> = records.iter().map(duration_hours).collect();
        let qualities: Vec<f64> = records.iter().map(|r| r.quality).collect();

        let rolling_durations = rolling_means(&durations, self.rolling_window);
        let rolling_qualities = rolling_means(&qualities, self.rolling_window);

        let negative = durations.iter().filter(|d| **d < 0.0).count();
        if negative > 0 {
            log::warn!(
                "{} of {} records end before they start; keeping negative durations",
                negative,
                records.len()
            );
        }

        records
            .iter()
            .enumerate()
            .map(|(i, record)| FeatureRecord {
                record: record.clone(),
                duration: durations[i],
                latency: self.latency_minutes(record),
                day_of_week: record.date.weekday().into(),
                rolling_avg_duration: rolling_durations[i],
                rolling_avg_quality: rolling_qualities[i],
            })
            .collect()
    }

    /// Minutes between sleep start and the ideal bedtime on the record's date
    fn latency_minutes(&self, record: &RawRecord) -> f64 {
        let ideal_bedtime: NaiveDateTime = record.date.and_time(NaiveTime::MIN)
            + Duration::hours(self.ideal_bedtime_hour as i64);
        (record.sleep_start - ideal_bedtime).num_milliseconds() as f64 / MILLIS_PER_MINUTE
    }
}

/// Hours between sleep start and end; negative when the end precedes the start
pub fn duration_hours(record: &RawRecord) -> f64 {
    (record.sleep_end - record.sleep_start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Process a validated table with default settings
pub fn process(table: &RawTable) -> Result<Vec<FeatureRecord>, AnalysisError> {
    FeatureProcessor::default().process(table)
}
