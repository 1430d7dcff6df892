//! Consolidated alert list.
//!
//! One event per flagged (metric, week) pair, carrying the metric's observed
//! weekly value. Events are ordered by week, then metric name.

use arrow::record_batch::RecordBatch;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::threshold::AlertThreshold;
use crate::utils::arrow::records_to_batch;
use crate::weekly::WeeklyTable;

/// A week in which a metric triggered its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub metric: String,
    pub week: u32,
    /// Weekly value of the metric itself, not its threshold
    pub observed_value: f64,
}

/// Collect alert events from the flagged weekly table
///
/// A flagged week whose metric value is missing produces no event.
#[must_use]
pub fn build_alert_table(table: &WeeklyTable, thresholds: &[AlertThreshold]) -> Vec<AlertEvent> {
    let mut unresolved = 0usize;
    let mut events: Vec<AlertEvent> = thresholds
        .iter()
        .filter_map(|threshold| {
            table
                .flag(&threshold.metric)
                .map(|flag| (threshold.metric.as_str(), flag))
        })
        .flat_map(|(metric, flag)| {
            flag.values
                .iter()
                .enumerate()
                .filter(|(_, flagged)| **flagged)
                .map(move |(row, _)| (metric, row))
        })
        .filter_map(|(metric, row)| {
            let value = table.value(metric, row);
            if value.is_none() {
                unresolved += 1;
            }
            Some(AlertEvent {
                metric: metric.to_string(),
                week: table.weeks()[row],
                observed_value: value?,
            })
        })
        .collect();

    events.sort_by(|a, b| a.week.cmp(&b.week).then_with(|| a.metric.cmp(&b.metric)));

    if unresolved > 0 {
        debug!("Omitted {unresolved} flagged weeks without a metric value");
    }
    events
}

/// Export alert events as a record batch
pub fn alerts_to_record_batch(events: &[AlertEvent]) -> Result<RecordBatch> {
    records_to_batch(events)
}

/// Export thresholds as a record batch
pub fn thresholds_to_record_batch(thresholds: &[AlertThreshold]) -> Result<RecordBatch> {
    records_to_batch(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::{ThresholdConfig, evaluate_thresholds};
    use crate::weekly::FlagColumn;

    #[test]
    fn test_events_sorted_by_week_then_metric() {
        let table = WeeklyTable::new("Semaine", vec![3, 1, 2, 4])
            .unwrap()
            .with_column("%R VA", vec![Some(0.0), Some(20.0), Some(0.0), Some(0.0)])
            .unwrap()
            .with_column("R VA", vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0)])
            .unwrap()
            .with_column("%R AMX", vec![Some(10.0), Some(90.0), Some(10.0), Some(11.0)])
            .unwrap()
            .with_column("%BLSE", vec![Some(80.0), Some(1.0), Some(2.0), Some(1.0)])
            .unwrap();
        let config = ThresholdConfig {
            min_observations: 3,
            ..Default::default()
        };
        let outcome = evaluate_thresholds(&table, &config).unwrap();
        let events = build_alert_table(&outcome.table, &outcome.thresholds);

        let keys: Vec<(u32, &str)> = events.iter().map(|e| (e.week, e.metric.as_str())).collect();
        assert_eq!(keys, vec![(1, "%R AMX"), (1, "%R VA"), (3, "%BLSE")]);
        assert_eq!(events[0].observed_value, 90.0);
        assert_eq!(events[1].observed_value, 20.0);
    }

    #[test]
    fn test_flag_without_value_is_omitted() {
        let mut table = WeeklyTable::new("Semaine", vec![1, 2])
            .unwrap()
            .with_column("%R VA", vec![None, Some(50.0)])
            .unwrap();
        table
            .set_flag(FlagColumn {
                metric: "%R VA".to_string(),
                name: "Alert %R VA".to_string(),
                values: vec![true, true],
            })
            .unwrap();
        let outcome = evaluate_thresholds(&table, &ThresholdConfig::default()).unwrap();

        // Fixed rule without a count column flags nothing; use the manual flags
        let events = build_alert_table(&table, &outcome.thresholds);
        assert_eq!(
            events,
            vec![AlertEvent {
                metric: "%R VA".to_string(),
                week: 2,
                observed_value: 50.0,
            }]
        );
    }

    #[test]
    fn test_record_batch_exports() {
        let events = vec![AlertEvent {
            metric: "%R AMX".to_string(),
            week: 12,
            observed_value: 42.5,
        }];
        let batch = alerts_to_record_batch(&events).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 3);

        let empty = alerts_to_record_batch(&[]).unwrap();
        assert_eq!(empty.num_rows(), 0);
        assert_eq!(empty.num_columns(), 3);

        let table = WeeklyTable::new("Semaine", vec![1, 2, 3, 4])
            .unwrap()
            .with_column("%R AMX", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])
            .unwrap();
        let outcome = evaluate_thresholds(&table, &ThresholdConfig::default()).unwrap();
        let batch = thresholds_to_record_batch(&outcome.thresholds).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert!(batch.schema().field_with_name("status").is_ok());
    }
}
