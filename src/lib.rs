//! Weekly antimicrobial-resistance surveillance for a clinical microbiology
//! lab.
//!
//! The pipeline normalizes raw MIC records, aggregates them into weekly
//! resistant percentages, left-joins them onto the weekly resistance table,
//! flags abnormal weeks per metric (a fixed clinical cutoff or Tukey's upper
//! fence) and collects the flagged weeks into one ordered alert list.

pub mod alert;
pub mod config;
pub mod error;
pub mod mic;
pub mod pipeline;
pub mod threshold;
pub mod utils;
pub mod weekly;

// Core types
pub use config::SurveillanceConfig;
pub use error::{Result, SurveillanceError};
pub use pipeline::{ReportBatches, RunSummary, SurveillanceReport, run, run_tables};

// Pipeline stages
pub use alert::{AlertEvent, build_alert_table};
pub use mic::{
    BreakpointRule, MicMetric, MicRecord, ResistanceRule, WeeklyMicAggregate, aggregate_weekly,
    normalize_mic,
};
pub use threshold::{
    AlertThreshold, MetricRule, QuantileMethod, RuleKind, ThresholdConfig, ThresholdRule,
    ThresholdStatus, evaluate_thresholds,
};
pub use weekly::{WeeklyTable, merge_weekly};

// Arrow types
pub use arrow::record_batch::RecordBatch;
