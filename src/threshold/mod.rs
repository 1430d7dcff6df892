//! Alert thresholds: fixed clinical cutoffs and Tukey fences per metric.

pub mod engine;
pub mod quantile;
pub mod rules;

pub use engine::{
    AlertThreshold, ThresholdOutcome, ThresholdRule, ThresholdStatus, evaluate_fixed,
    evaluate_thresholds, evaluate_tukey, metrics_to_evaluate, round2,
};
pub use quantile::{QuantileMethod, TukeyFence, quantile};
pub use rules::{MetricRule, RuleKind, ThresholdConfig};
