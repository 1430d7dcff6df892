//! Weekly aggregation of MIC records into resistant fractions.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::mic::record::{MicRecord, iso_week};

/// Decides whether a specimen is resistant
pub trait ResistanceRule {
    /// `Some(resistant)` when the record carries a usable observation for
    /// this rule, `None` when it does not count as a test
    fn evaluate(&self, record: &MicRecord) -> Option<bool>;
}

impl<F> ResistanceRule for F
where
    F: Fn(&MicRecord) -> Option<bool>,
{
    fn evaluate(&self, record: &MicRecord) -> Option<bool> {
        self(record)
    }
}

/// Resistant when the MIC of any listed drug reaches the breakpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRule {
    /// Drug concentration columns, combined with a logical OR
    pub drugs: Vec<String>,
    /// MIC (mg/L) at or above which a specimen is resistant
    pub breakpoint: f64,
}

impl ResistanceRule for BreakpointRule {
    fn evaluate(&self, record: &MicRecord) -> Option<bool> {
        let mut observed = false;
        for drug in &self.drugs {
            if let Some(mic) = record.mic(drug) {
                if mic >= self.breakpoint {
                    return Some(true);
                }
                observed = true;
            }
        }
        observed.then_some(false)
    }
}

/// Tests and resistant cases observed in one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMicAggregate {
    pub week: u32,
    pub tests_count: u32,
    pub resistant_count: u32,
}

impl WeeklyMicAggregate {
    #[must_use]
    pub fn new(week: u32) -> Self {
        Self {
            week,
            tests_count: 0,
            resistant_count: 0,
        }
    }

    /// `100 * resistant / tests`, `None` when the week had no tests
    #[must_use]
    pub fn percent_resistant(&self) -> Option<f64> {
        (self.tests_count > 0)
            .then(|| 100.0 * f64::from(self.resistant_count) / f64::from(self.tests_count))
    }
}

/// Records excluded while aggregating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MicAggregateSummary {
    /// Records seen
    pub records: usize,
    /// Records without a week
    pub undated: usize,
    /// Dated records without a usable concentration
    pub untested: usize,
}

/// Group records by week and count tests and resistant cases
///
/// Records without a week are skipped. A week whose records carry no usable
/// concentration is still present, with zero tests.
pub fn aggregate_weekly<R, W>(
    records: &[MicRecord],
    rule: &R,
    week_of: W,
) -> (BTreeMap<u32, WeeklyMicAggregate>, MicAggregateSummary)
where
    R: ResistanceRule + ?Sized,
    W: Fn(&MicRecord) -> Option<u32>,
{
    let mut weeks = BTreeMap::new();
    let mut summary = MicAggregateSummary {
        records: records.len(),
        ..Default::default()
    };

    for record in records {
        let Some(week) = week_of(record) else {
            summary.undated += 1;
            continue;
        };
        let aggregate = weeks
            .entry(week)
            .or_insert_with(|| WeeklyMicAggregate::new(week));
        match rule.evaluate(record) {
            Some(resistant) => {
                aggregate.tests_count += 1;
                if resistant {
                    aggregate.resistant_count += 1;
                }
            }
            None => summary.untested += 1,
        }
    }

    debug!(
        "Aggregated {} MIC records into {} weeks ({} undated, {} untested)",
        summary.records,
        weeks.len(),
        summary.undated,
        summary.untested
    );

    (weeks, summary)
}

/// A MIC-derived weekly metric and the columns it contributes to the
/// weekly table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicMetric {
    /// Name of the percentage column, e.g. `"%R VA (CMI)"`
    pub column: String,
    /// Optional column receiving the weekly resistant count
    #[serde(default)]
    pub count_column: Option<String>,
    /// Optional column receiving the weekly number of tests
    #[serde(default)]
    pub tests_column: Option<String>,
    /// How a specimen is classified as resistant
    pub rule: BreakpointRule,
}

/// Weekly aggregates of one MIC metric, ready to merge
#[derive(Debug, Clone, PartialEq)]
pub struct MicMetricAggregate {
    pub metric: MicMetric,
    pub weeks: BTreeMap<u32, WeeklyMicAggregate>,
    pub summary: MicAggregateSummary,
}

/// Aggregate records for one configured metric using ISO weeks
#[must_use]
pub fn aggregate_metric(records: &[MicRecord], metric: &MicMetric) -> MicMetricAggregate {
    let (weeks, summary) = aggregate_weekly(records, &metric.rule, iso_week);
    if summary.records > 0 && summary.undated == summary.records {
        warn!(
            "No MIC record for '{}' has a usable sample date",
            metric.column
        );
    }
    MicMetricAggregate {
        metric: metric.clone(),
        weeks,
        summary,
    }
}
