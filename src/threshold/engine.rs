//! Threshold engine: per-metric fences and weekly alert flags.
//!
//! Every evaluated metric gets a flag column on the weekly table and one
//! [`AlertThreshold`] describing how its flags were decided.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::threshold::quantile::TukeyFence;
use crate::threshold::rules::{RuleKind, ThresholdConfig};
use crate::weekly::{FlagColumn, WeeklyTable};

/// Rule family reported with a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdRule {
    Fixed,
    Tukey,
}

/// How trustworthy a threshold is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    /// Fence computed from enough weekly values
    Computed,
    /// Fixed clinical cutoff, no statistics involved
    Fixed,
    /// Too few weekly values; the fence is raised so nothing flags
    Degenerate,
    /// The metric or its count column is not in the weekly table
    MissingColumn,
}

/// Threshold metadata of one metric
///
/// Quartiles and fence are rounded to two decimals. For fixed rules the
/// quartiles are absent and the fence is the case-count cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub metric: String,
    pub rule: ThresholdRule,
    pub lower_quartile: Option<f64>,
    pub upper_quartile: Option<f64>,
    pub fence: Option<f64>,
    /// Non-null weekly values the threshold was derived from
    pub observations: u32,
    /// Weeks flagged by this threshold
    pub flagged_weeks: u32,
    pub status: ThresholdStatus,
    pub description: String,
}

/// Weekly table with flag columns, and the thresholds behind them
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOutcome {
    pub table: WeeklyTable,
    pub thresholds: Vec<AlertThreshold>,
}

/// Metrics to evaluate, in order
///
/// Percentage columns of the table come first in table order, followed by
/// configured metrics not present in the table. Count columns of fixed rules
/// are never metrics themselves.
#[must_use]
pub fn metrics_to_evaluate(table: &WeeklyTable, config: &ThresholdConfig) -> Vec<String> {
    let count_columns = config.count_columns();
    let mut metrics: Vec<String> = table
        .percent_columns(&config.percent_marker)
        .into_iter()
        .filter(|name| !count_columns.contains(name))
        .map(str::to_string)
        .collect();

    for rule in &config.metric_rules {
        if !metrics.contains(&rule.metric) {
            metrics.push(rule.metric.clone());
        }
    }
    metrics
}

/// Evaluate every metric and attach its flag column to a copy of the table
pub fn evaluate_thresholds(
    table: &WeeklyTable,
    config: &ThresholdConfig,
) -> Result<ThresholdOutcome> {
    let metrics = metrics_to_evaluate(table, config);
    let mut flagged = table.clone();
    let mut thresholds = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let (flags, threshold) = match config.rule_for(&metric) {
            RuleKind::Fixed {
                count_column,
                min_count,
            } => evaluate_fixed(table, &metric, &count_column, min_count),
            RuleKind::Tukey => evaluate_tukey(table, &metric, config),
        };

        flagged.set_flag(FlagColumn {
            name: config.flag_name(&metric),
            metric,
            values: flags,
        })?;
        thresholds.push(threshold);
    }

    let alerting = thresholds.iter().filter(|t| t.flagged_weeks > 0).count();
    info!(
        "Evaluated {} metrics over {} weeks, {} with alerts",
        thresholds.len(),
        table.len(),
        alerting
    );

    Ok(ThresholdOutcome {
        table: flagged,
        thresholds,
    })
}

/// Fixed clinical rule: flag when the week's count reaches `min_count`
///
/// Only the count column is read; the percentage never influences the flag.
pub fn evaluate_fixed(
    table: &WeeklyTable,
    metric: &str,
    count_column: &str,
    min_count: f64,
) -> (Vec<bool>, AlertThreshold) {
    let cases = if min_count == 1.0 { "case" } else { "cases" };
    let Some(counts) = table.column(count_column) else {
        warn!("Count column '{count_column}' of fixed-rule metric '{metric}' not found");
        return (
            vec![false; table.len()],
            AlertThreshold {
                metric: metric.to_string(),
                rule: ThresholdRule::Fixed,
                lower_quartile: None,
                upper_quartile: None,
                fence: Some(min_count),
                observations: 0,
                flagged_weeks: 0,
                status: ThresholdStatus::MissingColumn,
                description: format!("count column '{count_column}' not found"),
            },
        );
    };

    let flags: Vec<bool> = counts
        .iter()
        .map(|count| count.is_some_and(|c| c >= min_count))
        .collect();

    let threshold = AlertThreshold {
        metric: metric.to_string(),
        rule: ThresholdRule::Fixed,
        lower_quartile: None,
        upper_quartile: None,
        fence: Some(min_count),
        observations: count_u32(counts.iter().filter(|c| c.is_some()).count()),
        flagged_weeks: count_u32(flags.iter().filter(|f| **f).count()),
        status: ThresholdStatus::Fixed,
        description: format!("≥ {min_count} {cases} (fixed)"),
    };
    (flags, threshold)
}

/// Tukey rule: flag values strictly above `Q3 + k * IQR`
///
/// Missing values never flag and do not enter the quartiles. With fewer
/// than `min_observations` values the fence is raised to at least the
/// largest observed value, so the metric cannot alert.
pub fn evaluate_tukey(
    table: &WeeklyTable,
    metric: &str,
    config: &ThresholdConfig,
) -> (Vec<bool>, AlertThreshold) {
    let Some(values) = table.column(metric) else {
        warn!("Metric column '{metric}' not found");
        return (
            vec![false; table.len()],
            AlertThreshold {
                metric: metric.to_string(),
                rule: ThresholdRule::Tukey,
                lower_quartile: None,
                upper_quartile: None,
                fence: None,
                observations: 0,
                flagged_weeks: 0,
                status: ThresholdStatus::MissingColumn,
                description: format!("column '{metric}' not found"),
            },
        );
    };

    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    let fence = TukeyFence::compute(
        &observed,
        config.quantile_method,
        config.fence_multiplier,
    );
    let degenerate = observed.len() < config.min_observations;

    let (cutoff, status, description) = match fence {
        None => (
            None,
            ThresholdStatus::Degenerate,
            "no weekly values; no fence".to_string(),
        ),
        Some(fence) if degenerate => {
            let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            debug!(
                "Metric '{metric}' has {} values, fewer than {}; fence raised to {max}",
                observed.len(),
                config.min_observations
            );
            (
                Some(fence.fence.max(max)),
                ThresholdStatus::Degenerate,
                format!(
                    "only {} weekly values (< {}); fence raised to the maximum",
                    observed.len(),
                    config.min_observations
                ),
            )
        }
        Some(fence) => (
            Some(fence.fence),
            ThresholdStatus::Computed,
            format!("Q3 + {} × IQR", config.fence_multiplier),
        ),
    };

    let flags: Vec<bool> = values
        .iter()
        .map(|value| match (value, cutoff) {
            (Some(v), Some(c)) => *v > c,
            _ => false,
        })
        .collect();

    let threshold = AlertThreshold {
        metric: metric.to_string(),
        rule: ThresholdRule::Tukey,
        lower_quartile: fence.map(|f| round2(f.q1)),
        upper_quartile: fence.map(|f| round2(f.q3)),
        fence: cutoff.map(round2),
        observations: count_u32(observed.len()),
        flagged_weeks: count_u32(flags.iter().filter(|f| **f).count()),
        status,
        description,
    };
    (flags, threshold)
}

/// Round to two decimals for reporting
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::quantile::QuantileMethod;
    use crate::threshold::rules::MetricRule;

    fn table(metric: &str, values: &[Option<f64>]) -> WeeklyTable {
        let weeks = (1..=values.len() as u32).collect();
        WeeklyTable::new("Semaine", weeks)
            .unwrap()
            .with_column(metric, values.to_vec())
            .unwrap()
    }

    #[test]
    fn test_tukey_flags_only_the_outlier() {
        let table = table(
            "%R AMX",
            &[Some(2.0), Some(3.0), Some(2.0), Some(4.0), Some(3.0), Some(50.0)],
        );
        let config = ThresholdConfig {
            quantile_method: QuantileMethod::NearestRank,
            ..Default::default()
        };
        let (flags, threshold) = evaluate_tukey(&table, "%R AMX", &config);

        assert_eq!(flags, vec![false, false, false, false, false, true]);
        assert_eq!(threshold.lower_quartile, Some(2.0));
        assert_eq!(threshold.upper_quartile, Some(4.0));
        assert_eq!(threshold.fence, Some(7.0));
        assert_eq!(threshold.status, ThresholdStatus::Computed);
        assert_eq!(threshold.flagged_weeks, 1);
    }

    #[test]
    fn test_tukey_is_strictly_greater() {
        // Q1 = Q3 = 5, fence = 5: a value equal to the fence does not flag
        let table = table("%R CIP", &[Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(5.0)]);
        let (flags, threshold) = evaluate_tukey(&table, "%R CIP", &ThresholdConfig::default());
        assert!(flags.iter().all(|f| !f));
        assert_eq!(threshold.fence, Some(5.0));
    }

    #[test]
    fn test_nulls_never_flag_and_are_excluded() {
        let table = table(
            "%R CTX",
            &[Some(1.0), None, Some(1.0), Some(1.0), Some(1.0), Some(30.0), None],
        );
        let (flags, threshold) = evaluate_tukey(&table, "%R CTX", &ThresholdConfig::default());
        assert_eq!(threshold.observations, 5);
        assert_eq!(flags, vec![false, false, false, false, false, true, false]);
    }

    #[test]
    fn test_degenerate_fence_does_not_alert() {
        let table = table("%R GEN", &[Some(1.0), None, Some(90.0)]);
        let (flags, threshold) = evaluate_tukey(&table, "%R GEN", &ThresholdConfig::default());

        assert!(flags.iter().all(|f| !f));
        assert_eq!(threshold.status, ThresholdStatus::Degenerate);
        assert_eq!(threshold.observations, 2);
        assert!(threshold.fence.unwrap() >= 90.0);
    }

    #[test]
    fn test_all_null_metric_has_no_fence() {
        let table = table("%R FOS", &[None, None]);
        let (flags, threshold) = evaluate_tukey(&table, "%R FOS", &ThresholdConfig::default());
        assert_eq!(flags, vec![false, false]);
        assert_eq!(threshold.fence, None);
        assert_eq!(threshold.lower_quartile, None);
        assert_eq!(threshold.status, ThresholdStatus::Degenerate);
    }

    #[test]
    fn test_fixed_rule_reads_counts_only() {
        let table = table("%R VA", &[Some(0.0), Some(100.0), Some(5.0), Some(0.0)])
            .with_column("R VA", vec![Some(0.0), Some(0.0), Some(1.0), Some(0.0)])
            .unwrap();
        let (flags, threshold) = evaluate_fixed(&table, "%R VA", "R VA", 1.0);

        assert_eq!(flags, vec![false, false, true, false]);
        assert_eq!(threshold.rule, ThresholdRule::Fixed);
        assert_eq!(threshold.lower_quartile, None);
        assert_eq!(threshold.fence, Some(1.0));
        assert_eq!(threshold.description, "≥ 1 case (fixed)");
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let table = table("%R AMX", &[Some(1.0)]);
        let (flags, threshold) = evaluate_fixed(&table, "%R VA", "R VA", 1.0);
        assert_eq!(flags, vec![false]);
        assert_eq!(threshold.status, ThresholdStatus::MissingColumn);

        let (_, threshold) = evaluate_tukey(&table, "%R OXA", &ThresholdConfig::default());
        assert_eq!(threshold.status, ThresholdStatus::MissingColumn);
    }

    #[test]
    fn test_evaluate_thresholds_dispatches_by_configuration() {
        let table = table("%R VA", &[Some(0.0), Some(50.0), Some(0.0), Some(0.0)])
            .with_column("R VA", vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0)])
            .unwrap()
            .with_column("%R AMX", vec![Some(10.0), Some(11.0), Some(10.0), Some(12.0)])
            .unwrap();

        let outcome = evaluate_thresholds(&table, &ThresholdConfig::default()).unwrap();
        let metrics: Vec<&str> = outcome
            .thresholds
            .iter()
            .map(|t| t.metric.as_str())
            .collect();
        assert_eq!(metrics, vec!["%R VA", "%R AMX"]);
        assert_eq!(outcome.thresholds[0].rule, ThresholdRule::Fixed);
        assert_eq!(outcome.thresholds[1].rule, ThresholdRule::Tukey);

        let flag = outcome.table.flag("%R VA").unwrap();
        assert_eq!(flag.name, "Alert %R VA");
        assert_eq!(flag.values, vec![false, true, false, false]);
        assert_eq!(outcome.table.flags().len(), 2);
    }

    #[test]
    fn test_configured_metric_absent_from_table() {
        let table = table("%R AMX", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        let config = ThresholdConfig {
            metric_rules: vec![MetricRule {
                metric: "%R VA".to_string(),
                rule: RuleKind::fixed("R VA"),
            }],
            ..Default::default()
        };
        let outcome = evaluate_thresholds(&table, &config).unwrap();
        assert_eq!(outcome.thresholds.len(), 2);
        assert_eq!(outcome.thresholds[1].metric, "%R VA");
        assert_eq!(outcome.thresholds[1].status, ThresholdStatus::MissingColumn);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.254_9), 2.25);
        assert_eq!(round2(3.756), 3.76);
    }
}
