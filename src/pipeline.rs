//! End-to-end surveillance run.
//!
//! A run is a pure function of the weekly table, the MIC records and the
//! configuration: nothing is cached or mutated between runs, so repeated runs
//! on the same inputs produce identical tables, thresholds and alerts.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use log::info;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::alert::{AlertEvent, alerts_to_record_batch, build_alert_table, thresholds_to_record_batch};
use crate::config::SurveillanceConfig;
use crate::error::Result;
use crate::mic::{MicAggregateSummary, MicRecord, aggregate_metric, mic_records_from_batch};
use crate::threshold::{AlertThreshold, evaluate_thresholds};
use crate::weekly::{LoadSummary, MergeSummary, WeeklyTable, merge_weekly};

/// Counts of everything discarded or null-filled along the way
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Weekly table loading, absent when the table was built in memory
    pub load: Option<LoadSummary>,
    /// MIC aggregation per metric column
    pub mic: Vec<(String, MicAggregateSummary)>,
    pub merge: MergeSummary,
}

/// Derived tables of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SurveillanceReport {
    /// Merged weekly table with one flag column per evaluated metric
    pub table: WeeklyTable,
    pub thresholds: Vec<AlertThreshold>,
    /// Alerts ordered by week, then metric
    pub alerts: Vec<AlertEvent>,
    pub summary: RunSummary,
}

/// Record batches handed to the presentation layer
#[derive(Debug, Clone)]
pub struct ReportBatches {
    pub weekly: RecordBatch,
    pub thresholds: RecordBatch,
    pub alerts: RecordBatch,
}

/// Run the pipeline on loaded record batches
///
/// The weekly batch must contain the configured week column. Without a MIC
/// batch the configured MIC metrics are skipped.
pub fn run(
    weekly: &RecordBatch,
    mic: Option<&RecordBatch>,
    config: &SurveillanceConfig,
) -> Result<SurveillanceReport> {
    let (table, load) = WeeklyTable::from_record_batch(weekly, &config.week_column)?;
    let records = match mic {
        Some(batch) => mic_records_from_batch(
            batch,
            &config.mic_date_column,
            &config.mic_drug_columns(),
            &config.date_format,
        )?,
        None => Vec::new(),
    };

    let mut report = run_tables(&table, mic.map(|_| records.as_slice()), config)?;
    report.summary.load = Some(load);
    Ok(report)
}

/// Run the pipeline on an in-memory weekly table and MIC records
///
/// `records` of `None` means no MIC source at all; `Some(&[])` is a source
/// without specimens, which null-fills every MIC column.
pub fn run_tables(
    table: &WeeklyTable,
    records: Option<&[MicRecord]>,
    config: &SurveillanceConfig,
) -> Result<SurveillanceReport> {
    config.validate()?;
    let start = Instant::now();

    let aggregates: Vec<_> = match records {
        Some(records) => config
            .mic_metrics
            .iter()
            .map(|metric| aggregate_metric(records, metric))
            .collect(),
        None => Vec::new(),
    };
    let mic_summary = aggregates
        .iter()
        .map(|a| (a.metric.column.clone(), a.summary))
        .collect();

    let (merged, merge) = merge_weekly(table, &aggregates)?;
    let outcome = evaluate_thresholds(&merged, &config.thresholds)?;
    let alerts = build_alert_table(&outcome.table, &outcome.thresholds);

    info!(
        "Surveillance run over {} weeks produced {} alerts in {:?}",
        outcome.table.len(),
        alerts.len(),
        start.elapsed()
    );

    Ok(SurveillanceReport {
        table: outcome.table,
        thresholds: outcome.thresholds,
        alerts,
        summary: RunSummary {
            load: None,
            mic: mic_summary,
            merge,
        },
    })
}

impl SurveillanceReport {
    /// Restrict the weekly table to weeks in `min..=max`
    ///
    /// Thresholds and alerts stay those of the whole year.
    #[must_use]
    pub fn filter_weeks(&self, min: u32, max: u32) -> Self {
        Self {
            table: self.table.filter_weeks(min, max),
            ..self.clone()
        }
    }

    /// Export the three derived tables as record batches
    pub fn to_record_batches(&self) -> Result<ReportBatches> {
        Ok(ReportBatches {
            weekly: self.table.to_record_batch()?,
            thresholds: thresholds_to_record_batch(&self.thresholds)?,
            alerts: alerts_to_record_batch(&self.alerts)?,
        })
    }

    /// JSON document with weekly rows, thresholds, alerts and summary
    pub fn to_json(&self) -> Result<Value> {
        let weeks: Vec<Value> = self
            .table
            .weeks()
            .iter()
            .enumerate()
            .map(|(row, week)| {
                let mut fields = Map::new();
                fields.insert(self.table.week_column().to_string(), json!(week));
                for column in self.table.columns() {
                    fields.insert(column.name.clone(), json!(column.values[row]));
                }
                for flag in self.table.flags() {
                    fields.insert(flag.name.clone(), json!(flag.values[row]));
                }
                Value::Object(fields)
            })
            .collect();

        Ok(json!({
            "weeks": weeks,
            "thresholds": serde_json::to_value(&self.thresholds)?,
            "alerts": serde_json::to_value(&self.alerts)?,
            "summary": serde_json::to_value(&self.summary)?,
        }))
    }
}
