//! Left join of weekly MIC aggregates onto the primary weekly table.
//!
//! The primary table defines the surveillance calendar: each of its weeks is
//! kept exactly once, weeks missing from an aggregate are null-filled, and
//! weeks that only exist in an aggregate are dropped.

use log::{debug, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::Result;
use crate::mic::MicMetricAggregate;
use crate::weekly::table::WeeklyTable;

/// Join outcome for one aggregate source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMergeSummary {
    /// Percentage column contributed by the source
    pub column: String,
    /// Primary weeks found in the source
    pub matched_weeks: usize,
    /// Primary weeks absent from the source, null-filled
    pub null_filled_weeks: usize,
    /// Source weeks absent from the primary table
    pub dropped_weeks: Vec<u32>,
}

/// Join outcome for all sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub sources: Vec<SourceMergeSummary>,
}

impl MergeSummary {
    /// Total number of aggregate weeks dropped across sources
    #[must_use]
    pub fn dropped_weeks(&self) -> usize {
        self.sources.iter().map(|s| s.dropped_weeks.len()).sum()
    }
}

/// Left-join MIC aggregates onto the primary weekly table
///
/// Each source adds its percentage column and, when configured, its
/// resistant-count and tests columns. A source column with the name of an
/// existing primary column replaces it.
pub fn merge_weekly(
    primary: &WeeklyTable,
    sources: &[MicMetricAggregate],
) -> Result<(WeeklyTable, MergeSummary)> {
    let mut merged = primary.clone();
    let mut summary = MergeSummary::default();
    let calendar: FxHashSet<u32> = primary.weeks().iter().copied().collect();

    for source in sources {
        let metric = &source.metric;
        let matched: Vec<_> = primary
            .weeks()
            .iter()
            .map(|week| source.weeks.get(week))
            .collect();

        if primary.column(&metric.column).is_some() {
            warn!(
                "MIC metric '{}' replaces an existing weekly column",
                metric.column
            );
        }

        merged.set_column(
            &metric.column,
            matched
                .iter()
                .map(|agg| agg.and_then(|a| a.percent_resistant()))
                .collect(),
        )?;
        if let Some(count_column) = &metric.count_column {
            merged.set_column(
                count_column,
                matched
                    .iter()
                    .map(|agg| agg.map(|a| f64::from(a.resistant_count)))
                    .collect(),
            )?;
        }
        if let Some(tests_column) = &metric.tests_column {
            merged.set_column(
                tests_column,
                matched
                    .iter()
                    .map(|agg| agg.map(|a| f64::from(a.tests_count)))
                    .collect(),
            )?;
        }

        let dropped_weeks: Vec<u32> = source
            .weeks
            .keys()
            .copied()
            .filter(|week| !calendar.contains(week))
            .collect();
        let matched_weeks = matched.iter().filter(|agg| agg.is_some()).count();

        if !dropped_weeks.is_empty() {
            debug!(
                "Dropped {} weeks of '{}' outside the weekly calendar: {:?}",
                dropped_weeks.len(),
                metric.column,
                dropped_weeks
            );
        }

        summary.sources.push(SourceMergeSummary {
            column: metric.column.clone(),
            matched_weeks,
            null_filled_weeks: primary.len() - matched_weeks,
            dropped_weeks,
        });
    }

    Ok((merged, summary))
}
