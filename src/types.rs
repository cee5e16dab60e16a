//! Core types for the Sleep Insight pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw records, feature records, statistics, disorder reports and the
//! encoded analysis report. Everything is plain serde data so consumers can render
//! or serialize it directly.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Day of week, ordered Monday to Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Canonical Monday to Sunday ordering
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Calendar date the night belongs to
    pub date: NaiveDate,
    /// When sleep started (naive local time)
    pub sleep_start: NaiveDateTime,
    /// When sleep ended (naive local time)
    pub sleep_end: NaiveDateTime,
    /// Subjective quality score (0-100)
    pub quality: f64,
}

/// A raw record plus its derived features, in original row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    /// Sleep duration (hours); negative when sleep_end precedes sleep_start
    pub duration: f64,
    /// Offset of sleep_start from the ideal bedtime (minutes, negative = earlier)
    pub latency: f64,
    pub day_of_week: DayOfWeek,
    /// Trailing mean duration over the current and previous records
    pub rolling_avg_duration: f64,
    /// Trailing mean quality over the current and previous records
    pub rolling_avg_quality: f64,
}

/// Headline sleep metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean duration (hours)
    pub avg_duration: f64,
    /// Mean duration as a percentage of the reference sleep duration
    pub efficiency: f64,
    /// Mean latency (minutes)
    pub avg_latency: f64,
    /// Mean quality (0-100)
    pub quality_score: f64,
    /// `100 - 10 * stdev(duration)`; unbounded, may be negative
    pub consistency: f64,
}

/// Sleep duration summary (hours, 2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Shape of the duration distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    /// Sample skewness; `None` for zero-variance data
    pub skewness: Option<f64>,
    /// Excess kurtosis; `None` for zero-variance data
    pub kurtosis: Option<f64>,
    /// D'Agostino-Pearson omnibus p-value; `None` when the test is undefined
    pub normality_p_value: Option<f64>,
    pub is_normal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationAnalysis {
    pub summary: DurationSummary,
    pub distribution: DistributionAnalysis,
}

/// Sleep quality summary (1 decimal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
}

/// Quality bucket; buckets partition [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBucket {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityBucket {
    pub fn classify(quality: f64) -> Self {
        if quality >= 90.0 {
            QualityBucket::Excellent
        } else if quality >= 80.0 {
            QualityBucket::Good
        } else if quality >= 70.0 {
            QualityBucket::Fair
        } else {
            QualityBucket::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityBucket::Excellent => "Excellent (90-100)",
            QualityBucket::Good => "Good (80-89)",
            QualityBucket::Fair => "Fair (70-79)",
            QualityBucket::Poor => "Poor (<70)",
        }
    }
}

/// Night counts per quality bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl QualityDistribution {
    pub fn count(&self, bucket: QualityBucket) -> usize {
        match bucket {
            QualityBucket::Excellent => self.excellent,
            QualityBucket::Good => self.good,
            QualityBucket::Fair => self.fair,
            QualityBucket::Poor => self.poor,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.fair + self.poor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub summary: QualitySummary,
    pub distribution: QualityDistribution,
}

/// Bedtime and wake-time statistics (hours of day, 1 decimal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingAnalysis {
    pub avg_bedtime_hour: f64,
    /// Modal sleep-start hour, ties resolved to the smallest hour
    pub most_common_bedtime_hour: u32,
    pub avg_wake_hour: f64,
    /// `100 - 10 * stdev(bedtime hour)`
    pub schedule_consistency_pct: f64,
}

/// Days of week standing out in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPatterns {
    /// Highest mean quality
    pub best_sleep_day: Option<DayOfWeek>,
    /// Highest mean duration
    pub longest_sleep_day: Option<DayOfWeek>,
    /// Lowest duration stdev among days with at least two records
    pub most_consistent_day: Option<DayOfWeek>,
}

/// Per-day means (2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub day: DayOfWeek,
    pub nights: usize,
    pub mean_quality: f64,
    pub mean_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub timing: TimingAnalysis,
    pub weekly: WeeklyPatterns,
    pub weekly_breakdown: Vec<DayAggregate>,
}

/// Canned interpretation strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub sleep_duration: String,
    pub sleep_quality: String,
    pub schedule_consistency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    /// Pearson correlation (2 decimals); `None` if either series is constant
    pub duration_vs_quality: Option<f64>,
    pub interpretation: Interpretation,
}

/// Full statistical report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalReport {
    pub sleep_duration: DurationAnalysis,
    pub sleep_quality: QualityAnalysis,
    pub sleep_patterns: PatternAnalysis,
    pub correlations: CorrelationAnalysis,
}

/// Sleep disorder patterns the detector screens for, in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisorderKind {
    #[serde(rename = "Insomnia")]
    Insomnia,
    #[serde(rename = "Irregular Sleep-Wake Rhythm")]
    IrregularRhythm,
    #[serde(rename = "Delayed Sleep Phase")]
    DelayedSleepPhase,
}

impl DisorderKind {
    pub const ALL: [DisorderKind; 3] = [
        DisorderKind::Insomnia,
        DisorderKind::IrregularRhythm,
        DisorderKind::DelayedSleepPhase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DisorderKind::Insomnia => "Insomnia",
            DisorderKind::IrregularRhythm => "Irregular Sleep-Wake Rhythm",
            DisorderKind::DelayedSleepPhase => "Delayed Sleep Phase",
        }
    }
}

impl fmt::Display for DisorderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregated rule output for one disorder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisorderAssessment {
    /// Additive risk score, clamped to [0, 1]
    pub risk_level: f64,
    /// Additive confidence, clamped to [0, 1]
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// Detector output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisorderReport {
    pub detected_disorders: Vec<DisorderKind>,
    /// Keyed in `DisorderKind` order, which is also detection order
    pub risk_levels: BTreeMap<DisorderKind, DisorderAssessment>,
    pub recommendations: Vec<String>,
}

impl DisorderReport {
    pub fn is_clear(&self) -> bool {
        self.detected_disorders.is_empty()
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete analysis of one uploaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub record_count: usize,
    pub metrics: Metrics,
    pub statistics: StatisticalReport,
    pub disorders: DisorderReport,
    pub features: Vec<FeatureRecord>,
}
