//! Statistics engine
//!
//! Computes headline metrics and the full statistical report from a feature
//! table. Both require at least two records: every standard-deviation based
//! figure is undefined below that, so the engine refuses with
//! [`AnalysisError::InsufficientData`] instead of reporting NaN.

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::series::{group_by_day, weekly_breakdown};
use crate::stats::{self, round_to};
use crate::types::{
    CorrelationAnalysis, DayOfWeek, DistributionAnalysis, DurationAnalysis, DurationSummary,
    FeatureRecord, Interpretation, Metrics, PatternAnalysis, QualityAnalysis, QualityBucket,
    QualityDistribution, QualitySummary, StatisticalReport, TimingAnalysis, WeeklyPatterns,
};
use chrono::Timelike;

/// Minimum records for any statistic involving a standard deviation
pub const MIN_RECORDS: usize = 2;

/// Significance level for the normality test
const NORMALITY_ALPHA: f64 = 0.05;

/// Statistics engine over a feature table
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    reference_sleep_hours: f64,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new(8.0)
    }
}

impl StatisticsEngine {
    pub fn new(reference_sleep_hours: f64) -> Self {
        Self {
            reference_sleep_hours,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.reference_sleep_hours)
    }

    /// Headline metrics
    pub fn summarize(&self, features: &[FeatureRecord]) -> Result<Metrics, AnalysisError> {
        ensure_enough(features)?;

        let durations = durations(features);
        let avg_duration = stats::mean(&durations);
        let latencies: Vec<f64> = features.iter().map(|f| f.latency).collect();

        Ok(Metrics {
            avg_duration,
            efficiency: avg_duration / self.reference_sleep_hours * 100.0,
            avg_latency: stats::mean(&latencies),
            quality_score: stats::mean(&qualities(features)),
            consistency: 100.0 - stats::std_dev(&durations) * 10.0,
        })
    }

    /// Full statistical report
    pub fn analyze(&self, features: &[FeatureRecord]) -> Result<StatisticalReport, AnalysisError> {
        ensure_enough(features)?;
        log::debug!("Analyzing {} records", features.len());

        let durations = durations(features);
        let qualities = qualities(features);
        let bedtime_std = stats::std_dev(&start_hours(features));

        let duration_vs_quality = stats::pearson(&durations, &qualities).map(|r| round_to(r, 2));
        if duration_vs_quality.is_none() {
            log::warn!("Duration/quality correlation undefined: a series is constant");
        }

        Ok(StatisticalReport {
            sleep_duration: duration_analysis(&durations),
            sleep_quality: quality_analysis(&qualities),
            sleep_patterns: pattern_analysis(features),
            correlations: CorrelationAnalysis {
                duration_vs_quality,
                interpretation: Interpretation {
                    sleep_duration: duration_interpretation(stats::mean(&durations)).to_string(),
                    sleep_quality: quality_interpretation(stats::mean(&qualities)).to_string(),
                    schedule_consistency: consistency_interpretation(bedtime_std).to_string(),
                },
            },
        })
    }
}

/// Headline metrics with the default 8 hour reference
pub fn summarize(features: &[FeatureRecord]) -> Result<Metrics, AnalysisError> {
    StatisticsEngine::default().summarize(features)
}

/// Full statistical report with default settings
pub fn analyze(features: &[FeatureRecord]) -> Result<StatisticalReport, AnalysisError> {
    StatisticsEngine::default().analyze(features)
}

fn ensure_enough(features: &[FeatureRecord]) -> Result<(), AnalysisError> {
    if features.len() < MIN_RECORDS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_RECORDS,
            actual: features.len(),
        });
    }
    Ok(())
}

fn durations(features: &[FeatureRecord]) -> Vec<f64> {
    features.iter().map(|f| f.duration).collect()
}

fn qualities(features: &[FeatureRecord]) -> Vec<f64> {
    features.iter().map(|f| f.record.quality).collect()
}

fn start_hours(features: &[FeatureRecord]) -> Vec<f64> {
    features
        .iter()
        .map(|f| f.record.sleep_start.hour() as f64)
        .collect()
}

fn duration_analysis(durations: &[f64]) -> DurationAnalysis {
    let min = stats::min(durations);
    let max = stats::max(durations);
    let normality = stats::normality_test(durations);

    DurationAnalysis {
        summary: DurationSummary {
            mean: round_to(stats::mean(durations), 2),
            median: round_to(stats::median(durations), 2),
            std_dev: round_to(stats::std_dev(durations), 2),
            min: round_to(min, 2),
            max: round_to(max, 2),
            range: round_to(max - min, 2),
        },
        distribution: DistributionAnalysis {
            skewness: stats::skewness(durations).map(|s| round_to(s, 2)),
            kurtosis: stats::excess_kurtosis(durations).map(|k| round_to(k, 2)),
            normality_p_value: normality.map(|t| t.p_value),
            is_normal: normality.is_some_and(|t| t.p_value > NORMALITY_ALPHA),
        },
    }
}

fn quality_analysis(qualities: &[f64]) -> QualityAnalysis {
    let mut distribution = QualityDistribution::default();
    for &q in qualities {
        match QualityBucket::classify(q) {
            QualityBucket::Excellent => distribution.excellent += 1,
            QualityBucket::Good => distribution.good += 1,
            QualityBucket::Fair => distribution.fair += 1,
            QualityBucket::Poor => distribution.poor += 1,
        }
    }

    QualityAnalysis {
        summary: QualitySummary {
            mean: round_to(stats::mean(qualities), 1),
            median: round_to(stats::median(qualities), 1),
            std_dev: round_to(stats::std_dev(qualities), 1),
            max: round_to(stats::max(qualities), 1),
            min: round_to(stats::min(qualities), 1),
        },
        distribution,
    }
}

fn pattern_analysis(features: &[FeatureRecord]) -> PatternAnalysis {
    let start_hours = start_hours(features);
    let end_hours: Vec<f64> = features
        .iter()
        .map(|f| f.record.sleep_end.hour() as f64)
        .collect();
    let whole_hours: Vec<u32> = features.iter().map(|f| f.record.sleep_start.hour()).collect();

    let timing = TimingAnalysis {
        avg_bedtime_hour: round_to(stats::mean(&start_hours), 1),
        most_common_bedtime_hour: stats::mode(&whole_hours).unwrap_or_default(),
        avg_wake_hour: round_to(stats::mean(&end_hours), 1),
        schedule_consistency_pct: round_to(100.0 - stats::std_dev(&start_hours) * 10.0, 1),
    };

    PatternAnalysis {
        timing,
        weekly: weekly_patterns(features),
        weekly_breakdown: weekly_breakdown(features),
    }
}

fn weekly_patterns(features: &[FeatureRecord]) -> WeeklyPatterns {
    let mut quality_by_day = Vec::new();
    let mut duration_by_day = Vec::new();
    let mut spread_by_day = Vec::new();

    for (day, records) in group_by_day(features) {
        let qualities: Vec<f64> = records.iter().map(|f| f.record.quality).collect();
        let durations: Vec<f64> = records.iter().map(|f| f.duration).collect();
        quality_by_day.push((day, stats::mean(&qualities)));
        duration_by_day.push((day, stats::mean(&durations)));
        if durations.len() >= MIN_RECORDS {
            spread_by_day.push((day, stats::std_dev(&durations)));
        }
    }

    WeeklyPatterns {
        best_sleep_day: pick_day(&quality_by_day, |a, b| a > b),
        longest_sleep_day: pick_day(&duration_by_day, |a, b| a > b),
        most_consistent_day: pick_day(&spread_by_day, |a, b| a < b),
    }
}

/// First day (Monday to Sunday) whose value beats every earlier one
fn pick_day(values: &[(DayOfWeek, f64)], better: impl Fn(f64, f64) -> bool) -> Option<DayOfWeek> {
    let mut best: Option<(DayOfWeek, f64)> = None;
    for &(day, value) in values {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((day, value)),
        }
    }
    best.map(|(day, _)| day)
}

/// Interpretation of average duration (hours)
pub fn duration_interpretation(avg_duration: f64) -> &'static str {
    if avg_duration >= 8.0 {
        "Optimal sleep duration achieved"
    } else if avg_duration >= 7.0 {
        "Good sleep duration, but could be improved"
    } else if avg_duration >= 6.0 {
        "Below recommended sleep duration"
    } else {
        "Significantly below recommended sleep duration"
    }
}

/// Interpretation of average quality (0-100)
pub fn quality_interpretation(avg_quality: f64) -> &'static str {
    if avg_quality >= 90.0 {
        "Excellent sleep quality"
    } else if avg_quality >= 80.0 {
        "Good sleep quality"
    } else if avg_quality >= 70.0 {
        "Fair sleep quality"
    } else {
        "Poor sleep quality, improvement needed"
    }
}

/// Interpretation of the bedtime-hour standard deviation (hours)
pub fn consistency_interpretation(bedtime_std: f64) -> &'static str {
    if bedtime_std < 0.5 {
        "Very consistent sleep schedule"
    } else if bedtime_std < 1.0 {
        "Moderately consistent sleep schedule"
    } else if bedtime_std < 1.5 {
        "Somewhat inconsistent sleep schedule"
    } else {
        "Highly irregular sleep schedule"
    }
}
