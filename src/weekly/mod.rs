//! Weekly resistance table and its left join with MIC aggregates.

pub mod merge;
pub mod table;

pub use merge::{MergeSummary, SourceMergeSummary, merge_weekly};
pub use table::{FlagColumn, LoadSummary, MAX_WEEK, WeeklyColumn, WeeklyTable, coerce_week};
