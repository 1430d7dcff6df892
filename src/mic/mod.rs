//! MIC handling: normalization of raw concentration strings, per-specimen
//! records and their weekly aggregation into resistant percentages.

pub mod aggregate;
pub mod dates;
pub mod normalize;
pub mod record;

pub use aggregate::{
    BreakpointRule, MicAggregateSummary, MicMetric, MicMetricAggregate, ResistanceRule,
    WeeklyMicAggregate, aggregate_metric, aggregate_weekly,
};
pub use dates::{DateFormatConfig, iso_week_of, parse_date_string};
pub use normalize::{MicQualifier, MicValue, normalize_mic, parse_mic};
pub use record::{MicRecord, iso_week, mic_records_from_batch};
