//! Shared builders for the integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use resistance_monitor::{
    BreakpointRule, MetricRule, MicMetric, QuantileMethod, RuleKind, SurveillanceConfig,
    ThresholdConfig,
};

/// Weekly table batch: `Semaine`, `%R AMX`, `%R VA`, `R VA`
///
/// `%R AMX` has one clear outlier in week 6; `R VA` has one case in week 3
/// while `%R VA` is 100% in week 2 with no case.
pub fn weekly_batch() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        (
            "Semaine",
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])) as ArrayRef,
        ),
        (
            "%R AMX",
            Arc::new(Float64Array::from(vec![2.0, 3.0, 2.0, 4.0, 3.0, 50.0])) as ArrayRef,
        ),
        (
            "%R VA",
            Arc::new(Float64Array::from(vec![0.0, 100.0, 12.5, 0.0, 0.0, 0.0])) as ArrayRef,
        ),
        (
            "R VA",
            Arc::new(Float64Array::from(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0])) as ArrayRef,
        ),
    ])
    .unwrap()
}

/// Per-specimen MIC batch with sample dates in ISO weeks 1, 2 and 9
pub fn mic_batch() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        (
            "Date prélèvement",
            Arc::new(StringArray::from(vec![
                Some("01/01/2024"),
                Some("02/01/2024"),
                Some("03/01/2024"),
                Some("10/01/2024"),
                Some("26/02/2024"),
                None,
                Some("pas de date"),
            ])) as ArrayRef,
        ),
        (
            "CMI VA",
            Arc::new(StringArray::from(vec![
                Some("0.5"),
                Some(">2 mg/L"),
                Some("1"),
                Some(""),
                Some("4"),
                Some("8"),
                Some("8"),
            ])) as ArrayRef,
        ),
    ])
    .unwrap()
}

/// Configuration matching [`weekly_batch`] and [`mic_batch`]
pub fn test_config(method: QuantileMethod) -> SurveillanceConfig {
    SurveillanceConfig {
        mic_metrics: vec![MicMetric {
            column: "%R VA (CMI)".to_string(),
            count_column: Some("R VA (CMI)".to_string()),
            tests_column: Some("N VA (CMI)".to_string()),
            rule: BreakpointRule {
                drugs: vec!["CMI VA".to_string()],
                breakpoint: 2.0,
            },
        }],
        thresholds: ThresholdConfig {
            metric_rules: vec![MetricRule {
                metric: "%R VA".to_string(),
                rule: RuleKind::fixed("R VA"),
            }],
            quantile_method: method,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A fresh directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "resistance-monitor-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
