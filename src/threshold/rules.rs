//! Per-metric alert rule configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveillanceError};
use crate::threshold::quantile::QuantileMethod;

/// How a metric is flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Flag weeks whose value is strictly above the upper Tukey fence
    Tukey,
    /// Flag weeks whose case count reaches a fixed clinical cutoff
    Fixed {
        /// Sibling column holding the weekly case count
        count_column: String,
        /// Count at or above which a week is alertable
        #[serde(default = "default_min_count")]
        min_count: f64,
    },
}

fn default_min_count() -> f64 {
    1.0
}

impl RuleKind {
    /// Fixed rule on a count column with the default cutoff of one case
    #[must_use]
    pub fn fixed(count_column: impl Into<String>) -> Self {
        Self::Fixed {
            count_column: count_column.into(),
            min_count: default_min_count(),
        }
    }
}

/// Rule assigned to one metric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub metric: String,
    pub rule: RuleKind,
}

/// Threshold engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Explicit rules; metrics not listed here use [`RuleKind::Tukey`]
    pub metric_rules: Vec<MetricRule>,
    /// Substring identifying percentage columns to evaluate
    pub percent_marker: String,
    /// Prefix of generated flag column names
    pub flag_prefix: String,
    pub quantile_method: QuantileMethod,
    /// `k` in `Q3 + k * IQR`
    pub fence_multiplier: f64,
    /// Fewer non-null weekly values than this make the fence degenerate
    pub min_observations: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            metric_rules: vec![MetricRule {
                metric: "%R VA".to_string(),
                rule: RuleKind::fixed("R VA"),
            }],
            percent_marker: "%".to_string(),
            flag_prefix: "Alert ".to_string(),
            quantile_method: QuantileMethod::Linear,
            fence_multiplier: 1.5,
            min_observations: 4,
        }
    }
}

impl ThresholdConfig {
    /// Rule for a metric, Tukey unless configured otherwise
    #[must_use]
    pub fn rule_for(&self, metric: &str) -> RuleKind {
        self.metric_rules
            .iter()
            .find(|r| r.metric == metric)
            .map_or(RuleKind::Tukey, |r| r.rule.clone())
    }

    /// Name of the flag column of a metric
    #[must_use]
    pub fn flag_name(&self, metric: &str) -> String {
        format!("{}{metric}", self.flag_prefix)
    }

    /// Count columns referenced by fixed rules
    #[must_use]
    pub fn count_columns(&self) -> Vec<&str> {
        self.metric_rules
            .iter()
            .filter_map(|r| match &r.rule {
                RuleKind::Fixed { count_column, .. } => Some(count_column.as_str()),
                RuleKind::Tukey => None,
            })
            .collect()
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.fence_multiplier.is_finite() || self.fence_multiplier < 0.0 {
            return Err(SurveillanceError::Config(format!(
                "fence_multiplier must be a non-negative number, got {}",
                self.fence_multiplier
            )));
        }
        if self.min_observations == 0 {
            return Err(SurveillanceError::Config(
                "min_observations must be at least 1".to_string(),
            ));
        }
        if self.percent_marker.is_empty() {
            return Err(SurveillanceError::Config(
                "percent_marker must not be empty".to_string(),
            ));
        }
        for (i, rule) in self.metric_rules.iter().enumerate() {
            if self.metric_rules[..i].iter().any(|r| r.metric == rule.metric) {
                return Err(SurveillanceError::Config(format!(
                    "metric '{}' has more than one rule",
                    rule.metric
                )));
            }
            if let RuleKind::Fixed { min_count, .. } = &rule.rule {
                if !min_count.is_finite() {
                    return Err(SurveillanceError::Config(format!(
                        "min_count of '{}' must be finite",
                        rule.metric
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let config = ThresholdConfig::default();
        assert_eq!(config.rule_for("%R VA"), RuleKind::fixed("R VA"));
        assert_eq!(config.rule_for("%R AMX"), RuleKind::Tukey);
        assert_eq!(config.flag_name("%R AMX"), "Alert %R AMX");
        assert_eq!(config.count_columns(), vec!["R VA"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rules_from_json() {
        let config: ThresholdConfig = serde_json::from_str(
            r#"{
                "metric_rules": [
                    {"metric": "%R VA", "rule": {"kind": "fixed", "count_column": "R VA"}},
                    {"metric": "%BLSE", "rule": {"kind": "tukey"}}
                ],
                "quantile_method": "nearest_rank"
            }"#,
        )
        .unwrap();

        assert_eq!(config.rule_for("%R VA"), RuleKind::fixed("R VA"));
        assert_eq!(config.rule_for("%BLSE"), RuleKind::Tukey);
        assert_eq!(config.quantile_method, QuantileMethod::NearestRank);
        assert_eq!(config.fence_multiplier, 1.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ThresholdConfig {
            fence_multiplier: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ThresholdConfig {
            min_observations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = ThresholdConfig::default();
        config.metric_rules.push(MetricRule {
            metric: "%R VA".to_string(),
            rule: RuleKind::Tukey,
        });
        assert!(config.validate().is_err());
    }
}
