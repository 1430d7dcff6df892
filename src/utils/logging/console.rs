//! Console output utilities
//!
//! Plain-text tables of alerts and thresholds for the command line.

use crate::alert::AlertEvent;
use crate::pipeline::RunSummary;
use crate::threshold::AlertThreshold;
use crate::weekly::WeeklyTable;

/// Print the alert list, one line per flagged week
pub fn print_alert_table(alerts: &[AlertEvent]) {
    println!("Alert weeks (Tukey or fixed rule): {}", alerts.len());
    if alerts.is_empty() {
        return;
    }
    println!("{:>6} | {:<30} | {:>8}", "Week", "Metric", "Value");
    println!("{:-<6}-|-{:-<30}-|-{:-<8}", "", "", "");
    for alert in alerts {
        println!(
            "{:>6} | {:<30} | {:>8.2}",
            alert.week,
            truncate(&alert.metric, 30),
            alert.observed_value
        );
    }
}

/// Print one line per metric threshold
pub fn print_threshold_table(thresholds: &[AlertThreshold]) {
    println!("Alert thresholds:");
    println!(
        "{:<30} | {:>8} | {:>8} | {:>8} | {:>5} | Rule",
        "Metric", "Q1", "Q3", "Fence", "N"
    );
    for threshold in thresholds {
        println!(
            "{:<30} | {:>8} | {:>8} | {:>8} | {:>5} | {}",
            truncate(&threshold.metric, 30),
            format_optional(threshold.lower_quartile),
            format_optional(threshold.upper_quartile),
            format_optional(threshold.fence),
            threshold.observations,
            threshold.description
        );
    }
}

/// Print the weekly values of the given metrics, `*` marking flagged weeks
pub fn print_weekly_table(table: &WeeklyTable, metrics: &[&str]) {
    print!("{:>6}", table.week_column());
    for metric in metrics {
        print!(" | {:>14}", truncate(metric, 14));
    }
    println!();
    for (row, week) in table.weeks().iter().enumerate() {
        print!("{week:>6}");
        for metric in metrics {
            let flagged = table
                .flag(metric)
                .is_some_and(|flag| flag.values[row]);
            let marker = if flagged { "*" } else { " " };
            print!(" | {:>13}{marker}", format_optional(table.value(metric, row)));
        }
        println!();
    }
}

/// Print discarded and null-filled counts of a run
pub fn print_run_summary(summary: &RunSummary) {
    if let Some(load) = &summary.load {
        println!(
            "Weekly rows: {} read, {} invalid week, {} duplicate week",
            load.rows_read, load.invalid_week, load.duplicate_week
        );
    }
    for (column, mic) in &summary.mic {
        println!(
            "{column}: {} MIC records, {} undated, {} without a usable MIC",
            mic.records, mic.undated, mic.untested
        );
    }
    for source in &summary.merge.sources {
        println!(
            "{}: {} weeks matched, {} null-filled, {} outside the calendar",
            source.column,
            source.matched_weeks,
            source.null_filled_weeks,
            source.dropped_weeks.len()
        );
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
