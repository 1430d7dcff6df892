//! Configuration for the surveillance pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveillanceError};
use crate::mic::{BreakpointRule, DateFormatConfig, MicMetric};
use crate::threshold::ThresholdConfig;

/// Configuration for one surveillance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveillanceConfig {
    /// Week column of the weekly resistance table
    pub week_column: String,
    /// Sample date column of the per-specimen MIC table
    pub mic_date_column: String,
    /// Date formats accepted for sample dates
    pub date_format: DateFormatConfig,
    /// Weekly metrics derived from MIC records
    pub mic_metrics: Vec<MicMetric>,
    /// Alert rules
    pub thresholds: ThresholdConfig,
}

impl Default for SurveillanceConfig {
    fn default() -> Self {
        Self {
            week_column: "Semaine".to_string(),
            mic_date_column: "Date prélèvement".to_string(),
            date_format: DateFormatConfig::default(),
            mic_metrics: vec![MicMetric {
                column: "%R GLYCO (CMI)".to_string(),
                count_column: Some("R GLYCO (CMI)".to_string()),
                tests_column: Some("N GLYCO (CMI)".to_string()),
                rule: BreakpointRule {
                    drugs: vec!["CMI VA".to_string(), "CMI TEC".to_string()],
                    breakpoint: 2.0,
                },
            }],
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl SurveillanceConfig {
    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            SurveillanceError::Config(format!("cannot open {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Drug columns read from the MIC table
    #[must_use]
    pub fn mic_drug_columns(&self) -> Vec<&str> {
        let mut drugs: Vec<&str> = self
            .mic_metrics
            .iter()
            .flat_map(|m| m.rule.drugs.iter().map(String::as_str))
            .collect();
        drugs.sort_unstable();
        drugs.dedup();
        drugs
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.week_column.is_empty() {
            return Err(SurveillanceError::Config(
                "week_column must not be empty".to_string(),
            ));
        }
        for metric in &self.mic_metrics {
            if metric.rule.drugs.is_empty() {
                return Err(SurveillanceError::Config(format!(
                    "MIC metric '{}' lists no drug columns",
                    metric.column
                )));
            }
            if !metric.rule.breakpoint.is_finite() {
                return Err(SurveillanceError::Config(format!(
                    "MIC metric '{}' has a non-finite breakpoint",
                    metric.column
                )));
            }
            let generated = [
                Some(&metric.column),
                metric.count_column.as_ref(),
                metric.tests_column.as_ref(),
            ];
            if generated.iter().flatten().any(|c| **c == self.week_column) {
                return Err(SurveillanceError::Config(format!(
                    "MIC metric '{}' writes into the week column",
                    metric.column
                )));
            }
        }
        self.thresholds.validate()
    }
}
