//! Sleep disorder detection
//!
//! A stateless rule engine over the feature table. Each disorder owns an ordered
//! list of rules; a rule is a pure function of the feature table and the injected
//! thresholds that either contributes a fixed risk/confidence increment with an
//! evidence line, or nothing. Contributions are summed and clamped to [0, 1].
//! Scores are additive heuristics, not probabilities.

use crate::config::DetectorThresholds;
use crate::stats;
use crate::types::{DisorderAssessment, DisorderKind, DisorderReport, FeatureRecord};
use chrono::Timelike;

/// Contribution of a rule that fired
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub risk: f64,
    pub confidence: f64,
    pub evidence: String,
}

/// Signature every rule implements
pub type RuleFn = fn(&[FeatureRecord], &DetectorThresholds) -> Option<RuleHit>;

/// A named detection rule
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub evaluate: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules and advice for one disorder
#[derive(Debug, Clone)]
pub struct DisorderRules {
    pub kind: DisorderKind,
    pub rules: Vec<Rule>,
    pub recommendations: &'static [&'static str],
}

const INSOMNIA_RECOMMENDATIONS: &[&str] = &[
    "Maintain a consistent sleep schedule",
    "Create a relaxing bedtime routine",
    "Avoid screens 1-2 hours before bed",
    "Consider consulting a sleep specialist",
];

const IRREGULAR_RHYTHM_RECOMMENDATIONS: &[&str] = &[
    "Set fixed wake-up and bedtime hours",
    "Expose yourself to natural light during the day",
    "Avoid long naps, especially in the late afternoon",
    "Create a structured daily routine",
];

const DELAYED_SLEEP_RECOMMENDATIONS: &[&str] = &[
    "Gradually adjust bedtime earlier by 15 minutes each week",
    "Use bright light therapy in the morning",
    "Avoid bright lights in the evening",
    "Maintain a consistent wake time, even on weekends",
];

/// Default rule set, in detection order
pub fn default_rules() -> Vec<DisorderRules> {
    vec![
        DisorderRules {
            kind: DisorderKind::Insomnia,
            rules: vec![
                Rule {
                    name: "short_sleep",
                    evaluate: short_sleep_rule,
                },
                Rule {
                    name: "low_quality",
                    evaluate: low_quality_rule,
                },
            ],
            recommendations: INSOMNIA_RECOMMENDATIONS,
        },
        DisorderRules {
            kind: DisorderKind::IrregularRhythm,
            rules: vec![
                Rule {
                    name: "variable_bedtime",
                    evaluate: variable_bedtime_rule,
                },
                Rule {
                    name: "variable_wake_time",
                    evaluate: variable_wake_time_rule,
                },
            ],
            recommendations: IRREGULAR_RHYTHM_RECOMMENDATIONS,
        },
        DisorderRules {
            kind: DisorderKind::DelayedSleepPhase,
            rules: vec![
                Rule {
                    name: "late_bedtime",
                    evaluate: late_bedtime_rule,
                },
                Rule {
                    name: "late_wake",
                    evaluate: late_wake_rule,
                },
            ],
            recommendations: DELAYED_SLEEP_RECOMMENDATIONS,
        },
    ]
}

/// Rule engine over injected thresholds
#[derive(Debug, Clone)]
pub struct DisorderDetector {
    thresholds: DetectorThresholds,
    rule_sets: Vec<DisorderRules>,
}

impl Default for DisorderDetector {
    fn default() -> Self {
        Self::new(DetectorThresholds::default())
    }
}

impl DisorderDetector {
    pub fn new(thresholds: DetectorThresholds) -> Self {
        Self::with_rules(thresholds, default_rules())
    }

    /// Detector with a custom rule set. Rule sets are evaluated in detection order
    /// (Insomnia, Irregular Rhythm, Delayed Sleep Phase) whatever order they are
    /// passed in, so `detected_disorders` and the `risk_levels` keys always agree.
    pub fn with_rules(thresholds: DetectorThresholds, mut rule_sets: Vec<DisorderRules>) -> Self {
        rule_sets.sort_by_key(|set| set.kind);
        Self {
            thresholds,
            rule_sets,
        }
    }

    /// Screen a feature table. Never fails; missing data just means no rule fires.
    pub fn detect(&self, features: &[FeatureRecord]) -> DisorderReport {
        let mut report = DisorderReport::default();

        for rule_set in &self.rule_sets {
            let assessment = self.assess(rule_set, features);
            if assessment.risk_level > 0.0 {
                log::debug!(
                    "{} detected (risk {:.2}, confidence {:.2})",
                    rule_set.kind,
                    assessment.risk_level,
                    assessment.confidence
                );
                report.detected_disorders.push(rule_set.kind);
                report.risk_levels.insert(rule_set.kind, assessment);
                report
                    .recommendations
                    .extend(rule_set.recommendations.iter().map(|r| r.to_string()));
            }
        }

        report
    }

    /// Aggregate one disorder's rules
    pub fn assess(&self, rule_set: &DisorderRules, features: &[FeatureRecord]) -> DisorderAssessment {
        let mut assessment = DisorderAssessment::default();

        for rule in &rule_set.rules {
            if let Some(hit) = (rule.evaluate)(features, &self.thresholds) {
                log::debug!("{}: rule {} fired: {}", rule_set.kind, rule.name, hit.evidence);
                assessment.risk_level += hit.risk;
                assessment.confidence += hit.confidence;
                assessment.evidence.push(hit.evidence);
            }
        }

        assessment.risk_level = assessment.risk_level.clamp(0.0, 1.0);
        assessment.confidence = assessment.confidence.clamp(0.0, 1.0);
        assessment
    }
}

/// Screen with default thresholds
pub fn detect(features: &[FeatureRecord]) -> DisorderReport {
    DisorderDetector::default().detect(features)
}

/// True when `count` covers at least `fraction` of a non-empty table
fn meets_share(count: usize, total: usize, fraction: f64) -> bool {
    total > 0 && count as f64 >= total as f64 * fraction
}

fn start_hours(features: &[FeatureRecord]) -> impl Iterator<Item = u32> + '_ {
    features.iter().map(|f| f.record.sleep_start.hour())
}

fn end_hours(features: &[FeatureRecord]) -> impl Iterator<Item = u32> + '_ {
    features.iter().map(|f| f.record.sleep_end.hour())
}

/// Insomnia: short nights on at least the configured share of nights
pub fn short_sleep_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let t = &thresholds.insomnia;
    let count = features
        .iter()
        .filter(|f| f.duration < t.short_sleep_hours)
        .count();

    meets_share(count, features.len(), t.night_fraction).then(|| RuleHit {
        risk: 0.4,
        confidence: 0.3,
        evidence: format!("Short sleep duration detected in {count} nights"),
    })
}

/// Insomnia: low quality on at least the configured share of nights
pub fn low_quality_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let t = &thresholds.insomnia;
    let count = features
        .iter()
        .filter(|f| f.record.quality < t.low_quality)
        .count();

    meets_share(count, features.len(), t.night_fraction).then(|| RuleHit {
        risk: 0.3,
        confidence: 0.3,
        evidence: format!("Poor sleep quality reported in {count} nights"),
    })
}

/// Irregular rhythm: sleep-start hour spread above `schedule_inconsistency`
pub fn variable_bedtime_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let hours: Vec<f64> = start_hours(features).map(f64::from).collect();
    let spread = stats::std_dev(&hours);

    // NaN (fewer than two nights) never exceeds the threshold
    (spread > thresholds.irregular_rhythm.schedule_inconsistency).then(|| RuleHit {
        risk: 0.5,
        confidence: 0.4,
        evidence: format!("Highly variable sleep times (std: {spread:.2} hours)"),
    })
}

/// Irregular rhythm: sleep-end hour spread above `schedule_inconsistency`
pub fn variable_wake_time_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let hours: Vec<f64> = end_hours(features).map(f64::from).collect();
    let spread = stats::std_dev(&hours);

    (spread > thresholds.irregular_rhythm.schedule_inconsistency).then(|| RuleHit {
        risk: 0.3,
        confidence: 0.3,
        evidence: format!("Inconsistent wake times (std: {spread:.2} hours)"),
    })
}

/// Delayed sleep phase: late bedtimes. With the default threshold of 24 no
/// hour of day qualifies.
pub fn late_bedtime_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let t = &thresholds.delayed_sleep;
    let count = start_hours(features)
        .filter(|h| *h >= t.late_bedtime_hour)
        .count();

    meets_share(count, features.len(), t.night_fraction).then(|| RuleHit {
        risk: 0.4,
        confidence: 0.3,
        evidence: format!("Late bedtime pattern detected in {count} nights"),
    })
}

/// Delayed sleep phase: late wake times
pub fn late_wake_rule(
    features: &[FeatureRecord],
    thresholds: &DetectorThresholds,
) -> Option<RuleHit> {
    let t = &thresholds.delayed_sleep;
    let count = end_hours(features)
        .filter(|h| *h >= t.late_wake_hour)
        .count();

    meets_share(count, features.len(), t.night_fraction).then(|| RuleHit {
        risk: 0.4,
        confidence: 0.3,
        evidence: format!("Late wake time pattern detected in {count} nights"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureProcessor;
    use crate::types::RawRecord;
    use chrono::{Duration, NaiveDate};

    /// (start hour, duration hours, quality) per night from 2023-01-02
    fn nights(rows: &[(u32, f64, f64)]) -> Vec<FeatureRecord> {
        let first = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let records: Vec<RawRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, &(hour, hours, quality))| {
                let date = first + Duration::days(i as i64);
                let sleep_start = date.and_hms_opt(hour, 0, 0).unwrap();
                RawRecord {
                    date,
                    sleep_start,
                    sleep_end: sleep_start + Duration::minutes((hours * 60.0) as i64),
                    quality,
                }
            })
            .collect();
        FeatureProcessor::default().process_records(&records)
    }

    fn healthy(n: usize) -> Vec<(u32, f64, f64)> {
        vec![(23, 8.0, 85.0); n]
    }

    #[test]
    fn test_healthy_sleep_is_clear() {
        let report = detect(&nights(&healthy(10)));
        assert!(report.is_clear());
        assert!(report.risk_levels.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_short_sleep_only_insomnia() {
        // 23:00 starts waking at 04:30 or 06:30: wake-hour spread stays under 1.5
        let mut rows = vec![(23, 5.5, 85.0); 4];
        rows.extend(vec![(23, 7.5, 85.0); 6]);
        let report = detect(&nights(&rows));

        assert_eq!(report.detected_disorders, vec![DisorderKind::Insomnia]);
        let insomnia = &report.risk_levels[&DisorderKind::Insomnia];
        assert!((insomnia.risk_level - 0.4).abs() < 1e-12);
        assert!((insomnia.confidence - 0.3).abs() < 1e-12);
        assert_eq!(
            insomnia.evidence,
            vec!["Short sleep duration detected in 4 nights".to_string()]
        );
        assert_eq!(report.recommendations, INSOMNIA_RECOMMENDATIONS);
    }

    #[test]
    fn test_short_sleep_below_share_does_not_fire() {
        let mut rows = healthy(10);
        for row in rows.iter_mut().take(2) {
            row.1 = 5.0;
        }
        assert!(short_sleep_rule(&nights(&rows), &DetectorThresholds::default()).is_none());
    }

    #[test]
    fn test_both_insomnia_rules() {
        let rows = vec![(23, 5.0, 50.0); 5];
        let report = detect(&nights(&rows));
        let insomnia = &report.risk_levels[&DisorderKind::Insomnia];
        assert!((insomnia.risk_level - 0.7).abs() < 1e-12);
        assert!((insomnia.confidence - 0.6).abs() < 1e-12);
        assert_eq!(insomnia.evidence.len(), 2);
        assert_eq!(insomnia.evidence[1], "Poor sleep quality reported in 5 nights");
    }

    #[test]
    fn test_irregular_rhythm() {
        // start hours 20, 23, 2, 21 -> wide spread; end hours follow
        let rows = vec![(20, 8.0, 85.0), (23, 8.0, 85.0), (2, 8.0, 85.0), (21, 8.0, 85.0)];
        let report = detect(&nights(&rows));

        assert_eq!(report.detected_disorders, vec![DisorderKind::IrregularRhythm]);
        let rhythm = &report.risk_levels[&DisorderKind::IrregularRhythm];
        assert!((rhythm.risk_level - 0.8).abs() < 1e-12);
        assert!((rhythm.confidence - 0.7).abs() < 1e-12);
        assert!(rhythm.evidence[0].starts_with("Highly variable sleep times (std: "));
        assert!(rhythm.evidence[1].starts_with("Inconsistent wake times (std: "));
        assert_eq!(report.recommendations, IRREGULAR_RHYTHM_RECOMMENDATIONS);
    }

    #[test]
    fn test_time_variance_is_not_consulted() {
        let rows = vec![(20, 8.0, 85.0), (23, 8.0, 85.0), (2, 8.0, 85.0), (21, 8.0, 85.0)];
        let mut thresholds = DetectorThresholds::default();
        thresholds.irregular_rhythm.time_variance = 1000.0;
        let report = DisorderDetector::new(thresholds).detect(&nights(&rows));
        assert!(report.detected_disorders.contains(&DisorderKind::IrregularRhythm));
    }

    #[test]
    fn test_single_night_has_no_rhythm_signal() {
        let features = nights(&[(3, 8.0, 85.0)]);
        let thresholds = DetectorThresholds::default();
        assert!(variable_bedtime_rule(&features, &thresholds).is_none());
        assert!(variable_wake_time_rule(&features, &thresholds).is_none());
    }

    #[test]
    fn test_late_wake_delayed_phase() {
        // 01:00 + 9h -> 10:00 wake on every night
        let rows = vec![(1, 9.0, 85.0); 5];
        let report = detect(&nights(&rows));

        assert_eq!(report.detected_disorders, vec![DisorderKind::DelayedSleepPhase]);
        let delayed = &report.risk_levels[&DisorderKind::DelayedSleepPhase];
        assert!((delayed.risk_level - 0.4).abs() < 1e-12);
        assert_eq!(
            delayed.evidence,
            vec!["Late wake time pattern detected in 5 nights".to_string()]
        );
    }

    #[test]
    fn test_default_late_bedtime_never_fires() {
        let rows: Vec<(u32, f64, f64)> = (0..24).map(|h| (h, 8.0, 85.0)).collect();
        assert!(late_bedtime_rule(&nights(&rows), &DetectorThresholds::default()).is_none());
    }

    #[test]
    fn test_reconfigured_late_bedtime_fires() {
        let rows = vec![(1, 7.0, 85.0); 4];
        let mut thresholds = DetectorThresholds::default();
        thresholds.delayed_sleep.late_bedtime_hour = 1;
        let hit = late_bedtime_rule(&nights(&rows), &thresholds).unwrap();
        assert_eq!(hit.evidence, "Late bedtime pattern detected in 4 nights");
    }

    #[test]
    fn test_scores_clamped() {
        let rule = Rule {
            name: "always",
            evaluate: |_, _| {
                Some(RuleHit {
                    risk: 0.7,
                    confidence: 0.9,
                    evidence: "always".to_string(),
                })
            },
        };
        let rule_set = DisorderRules {
            kind: DisorderKind::Insomnia,
            rules: vec![rule, rule, rule],
            recommendations: INSOMNIA_RECOMMENDATIONS,
        };
        let detector = DisorderDetector::with_rules(DetectorThresholds::default(), vec![rule_set]);
        let report = detector.detect(&nights(&healthy(3)));
        let assessment = &report.risk_levels[&DisorderKind::Insomnia];
        assert_eq!(assessment.risk_level, 1.0);
        assert_eq!(assessment.confidence, 1.0);
        assert_eq!(assessment.evidence.len(), 3);
    }

    #[test]
    fn test_detection_order_and_recommendations() {
        // Short, poor, irregular and late-waking nights
        let rows = vec![
            (20, 5.0, 50.0),
            (2, 8.0, 50.0),
            (23, 5.0, 50.0),
            (3, 7.0, 50.0),
            (19, 5.0, 50.0),
        ];
        let report = detect(&nights(&rows));
        assert_eq!(report.detected_disorders, DisorderKind::ALL.to_vec());
        assert_eq!(report.recommendations.len(), 12);
        assert_eq!(report.recommendations[0], INSOMNIA_RECOMMENDATIONS[0]);
        assert_eq!(report.recommendations[4], IRREGULAR_RHYTHM_RECOMMENDATIONS[0]);
        assert_eq!(report.recommendations[8], DELAYED_SLEEP_RECOMMENDATIONS[0]);
        let keys: Vec<DisorderKind> = report.risk_levels.keys().copied().collect();
        assert_eq!(keys, report.detected_disorders);
    }

    #[test]
    fn test_empty_table_detects_nothing() {
        let report = detect(&[]);
        assert!(report.is_clear());
    }

    #[test]
    fn test_every_disorder_has_four_recommendations() {
        let rule_sets = default_rules();
        assert_eq!(rule_sets.len(), DisorderKind::ALL.len());
        for rule_set in rule_sets {
            assert_eq!(rule_set.recommendations.len(), 4);
        }
    }

    #[test]
    fn test_reordered_rule_sets_keep_detection_order() {
        let mut rule_sets = default_rules();
        rule_sets.reverse();
        let detector = DisorderDetector::with_rules(DetectorThresholds::default(), rule_sets);

        let rows = vec![
            (20, 5.0, 50.0),
            (2, 8.0, 50.0),
            (23, 5.0, 50.0),
            (3, 7.0, 50.0),
            (19, 5.0, 50.0),
        ];
        let report = detector.detect(&nights(&rows));
        assert_eq!(report.detected_disorders, DisorderKind::ALL.to_vec());
        let keys: Vec<DisorderKind> = report.risk_levels.keys().copied().collect();
        assert_eq!(keys, report.detected_disorders);
        assert_eq!(report.recommendations[0], INSOMNIA_RECOMMENDATIONS[0]);
    }
}
