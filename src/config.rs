//! Configuration for Sleep Insight
//!
//! Detector thresholds are plain data injected into the detector, one named-field
//! record per disorder. The whole configuration can be loaded from JSON.

use crate::error::AnalysisError;
use crate::rolling::DEFAULT_ROLLING_WINDOW;
use crate::types::DisorderKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Insomnia rule thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsomniaThresholds {
    /// Nights shorter than this are short (hours)
    pub short_sleep_hours: f64,
    /// Nights rated below this are low quality
    pub low_quality: f64,
    /// Share of nights a rule needs to fire
    pub night_fraction: f64,
}

impl Default for InsomniaThresholds {
    fn default() -> Self {
        Self {
            short_sleep_hours: 6.0,
            low_quality: 70.0,
            night_fraction: 0.3,
        }
    }
}

/// Irregular sleep-wake rhythm thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrregularRhythmThresholds {
    /// Not referenced by the active rules; both checks gate on
    /// `schedule_inconsistency`.
    pub time_variance: f64,
    /// Stdev (hours) of sleep-start and sleep-end hours above which a rule fires
    pub schedule_inconsistency: f64,
}

impl Default for IrregularRhythmThresholds {
    fn default() -> Self {
        Self {
            time_variance: 2.0,
            schedule_inconsistency: 1.5,
        }
    }
}

/// Delayed sleep phase thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedSleepThresholds {
    /// Sleep-start hour at or after which a bedtime is late. The default of 24
    /// is never reached by an hour of day, so the rule stays silent unless
    /// reconfigured.
    pub late_bedtime_hour: u32,
    /// Sleep-end hour at or after which a wake time is late
    pub late_wake_hour: u32,
    /// Share of nights a rule needs to fire
    pub night_fraction: f64,
}

impl Default for DelayedSleepThresholds {
    fn default() -> Self {
        Self {
            late_bedtime_hour: 24,
            late_wake_hour: 9,
            night_fraction: 0.4,
        }
    }
}

/// Per-disorder detector thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorThresholds {
    pub insomnia: InsomniaThresholds,
    pub irregular_rhythm: IrregularRhythmThresholds,
    pub delayed_sleep: DelayedSleepThresholds,
}

impl DetectorThresholds {
    /// Threshold record for one disorder, as JSON
    pub fn for_disorder(&self, kind: DisorderKind) -> serde_json::Value {
        let value = match kind {
            DisorderKind::Insomnia => serde_json::to_value(&self.insomnia),
            DisorderKind::IrregularRhythm => serde_json::to_value(&self.irregular_rhythm),
            DisorderKind::DelayedSleepPhase => serde_json::to_value(&self.delayed_sleep),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Top-level analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Rolling average window (records)
    pub rolling_window: usize,
    /// Ideal bedtime used for latency (hour of day)
    pub ideal_bedtime_hour: u32,
    /// Reference nightly sleep used for efficiency (hours)
    pub reference_sleep_hours: f64,
    pub thresholds: DetectorThresholds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            ideal_bedtime_hour: 22,
            reference_sleep_hours: 8.0,
            thresholds: DetectorThresholds::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and check configuration JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<(), AnalysisError> {
        if self.rolling_window == 0 {
            return Err(AnalysisError::Config(
                "rolling_window must be at least 1".to_string(),
            ));
        }
        if self.ideal_bedtime_hour > 23 {
            return Err(AnalysisError::Config(format!(
                "ideal_bedtime_hour must be 0-23, got {}",
                self.ideal_bedtime_hour
            )));
        }
        if self.reference_sleep_hours <= 0.0 {
            return Err(AnalysisError::Config(
                "reference_sleep_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
