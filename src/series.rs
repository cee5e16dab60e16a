//! Chart-ready series
//!
//! Aggregations the presentation layer plots directly: per-day means for the
//! weekly pattern chart and the quality-by-day-and-hour heatmap.

use crate::stats::{mean, round_to};
use crate::types::{DayAggregate, DayOfWeek, FeatureRecord};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records grouped by day of week, Monday to Sunday; empty days omitted
pub fn group_by_day(features: &[FeatureRecord]) -> Vec<(DayOfWeek, Vec<&FeatureRecord>)> {
    let mut groups: BTreeMap<DayOfWeek, Vec<&FeatureRecord>> = BTreeMap::new();
    for f in features {
        groups.entry(f.day_of_week).or_default().push(f);
    }
    groups.into_iter().collect()
}

/// Mean quality and duration per day of week (2 decimals)
pub fn weekly_breakdown(features: &[FeatureRecord]) -> Vec<DayAggregate> {
    group_by_day(features)
        .into_iter()
        .map(|(day, records)| {
            let qualities: Vec<f64> = records.iter().map(|f| f.record.quality).collect();
            let durations: Vec<f64> = records.iter().map(|f| f.duration).collect();
            DayAggregate {
                day,
                nights: records.len(),
                mean_quality: round_to(mean(&qualities), 2),
                mean_duration: round_to(mean(&durations), 2),
            }
        })
        .collect()
}

/// One heatmap cell: mean quality of nights starting in `hour` on `day`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub hour: u32,
    pub day: DayOfWeek,
    pub nights: usize,
    pub mean_quality: f64,
}

/// Mean quality pivoted by sleep-start hour and day of week, ordered by hour
/// then day. Only occupied cells are returned.
pub fn quality_heatmap(features: &[FeatureRecord]) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(u32, DayOfWeek), Vec<f64>> = BTreeMap::new();
    for f in features {
        cells
            .entry((f.record.sleep_start.hour(), f.day_of_week))
            .or_default()
            .push(f.record.quality);
    }

    cells
        .into_iter()
        .map(|((hour, day), qualities)| HeatmapCell {
            hour,
            day,
            nights: qualities.len(),
            mean_quality: mean(&qualities),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureProcessor;
    use crate::types::RawRecord;
    use chrono::{Duration, NaiveDate};

    fn features() -> Vec<FeatureRecord> {
        // 2023-01-02 is a Monday
        let rows = [
            (2, 23, 8, 80.0),
            (3, 22, 7, 70.0),
            (9, 23, 6, 90.0),
            (8, 1, 9, 60.0),
        ];
        let records: Vec<RawRecord> = rows
            .iter()
            .map(|&(day, hour, hours, quality)| {
                let date = NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
                let sleep_start = date.and_hms_opt(hour, 0, 0).unwrap();
                RawRecord {
                    date,
                    sleep_start,
                    sleep_end: sleep_start + Duration::hours(hours),
                    quality,
                }
            })
            .collect();
        FeatureProcessor::default().process_records(&records)
    }

    #[test]
    fn test_group_by_day_order() {
        let table = features();
        let groups = group_by_day(&table);
        let days: Vec<DayOfWeek> = groups.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            days,
            vec![DayOfWeek::Monday, DayOfWeek::Tuesday, DayOfWeek::Sunday]
        );
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_weekly_breakdown_means() {
        let breakdown = weekly_breakdown(&features());
        assert_eq!(breakdown[0].day, DayOfWeek::Monday);
        assert_eq!(breakdown[0].nights, 2);
        assert_eq!(breakdown[0].mean_quality, 85.0);
        assert_eq!(breakdown[0].mean_duration, 7.0);
        assert_eq!(breakdown[2].day, DayOfWeek::Sunday);
        assert_eq!(breakdown[2].mean_duration, 9.0);
    }

    #[test]
    fn test_quality_heatmap_cells() {
        let cells = quality_heatmap(&features());
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].hour, 1);
        assert_eq!(cells[0].day, DayOfWeek::Sunday);
        let monday_23 = cells
            .iter()
            .find(|c| c.hour == 23 && c.day == DayOfWeek::Monday)
            .unwrap();
        assert_eq!(monday_23.nights, 2);
        assert_eq!(monday_23.mean_quality, 85.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(weekly_breakdown(&[]).is_empty());
        assert!(quality_heatmap(&[]).is_empty());
    }
}
