use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use resistance_monitor::utils::io::{read_table, write_parquet};
use resistance_monitor::utils::logging::{
    print_alert_table, print_run_summary, print_threshold_table, print_weekly_table,
};
use resistance_monitor::weekly::MAX_WEEK;
use resistance_monitor::{SurveillanceConfig, SurveillanceReport, run};

#[derive(Parser, Debug)]
#[command(
    name = "resistance-monitor",
    version,
    about = "Weekly antimicrobial-resistance alerts from a weekly table and MIC records."
)]
struct Args {
    /// Weekly resistance table (.csv or .parquet)
    weekly: PathBuf,

    /// Per-specimen MIC table (.csv or .parquet)
    #[arg(long)]
    mic: Option<PathBuf>,

    /// JSON configuration; absent fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weeks shown in the weekly table, e.g. 10-20
    #[arg(long, value_parser = parse_week_range)]
    weeks: Option<(u32, u32)>,

    /// Directory receiving the Parquet tables and report.json
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_week_range(s: &str) -> Result<(u32, u32), String> {
    let (min, max) = s
        .split_once('-')
        .ok_or_else(|| format!("expected <first>-<last>, e.g. 10-20, got '{s}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid week '{part}': {e}"))
    };
    let (min, max) = (parse(min)?, parse(max)?);
    if !(1..=MAX_WEEK).contains(&min) || !(1..=MAX_WEEK).contains(&max) {
        return Err(format!("weeks must be between 1 and {MAX_WEEK}"));
    }
    if min > max {
        return Err(format!("week range {min}-{max} is empty"));
    }
    Ok((min, max))
}

fn write_outputs(out_dir: &Path, report: &SurveillanceReport) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let batches = report.to_record_batches()?;
    write_parquet(&out_dir.join("weekly_flags.parquet"), &batches.weekly)?;
    write_parquet(&out_dir.join("thresholds.parquet"), &batches.thresholds)?;
    write_parquet(&out_dir.join("alerts.parquet"), &batches.alerts)?;

    let json_path = out_dir.join("report.json");
    let json = serde_json::to_string_pretty(&report.to_json()?)?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("cannot write {}", json_path.display()))?;
    info!("Wrote report to {}", out_dir.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let start = Instant::now();

    let config = match &args.config {
        Some(path) => SurveillanceConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => SurveillanceConfig::default(),
    };

    let weekly = read_table(&args.weekly)
        .with_context(|| format!("loading weekly table {}", args.weekly.display()))?;
    let mic = match &args.mic {
        Some(path) => Some(
            read_table(path).with_context(|| format!("loading MIC table {}", path.display()))?,
        ),
        None => {
            if !config.mic_metrics.is_empty() {
                warn!("No MIC table given; MIC-derived metrics are skipped");
            }
            None
        }
    };

    let report = run(&weekly, mic.as_ref(), &config)?;

    let bounds = report.table.week_bounds();
    if let Some((first, last)) = bounds {
        info!("Weekly table covers weeks {first}-{last}");
    }
    let view = match (args.weeks, bounds) {
        (Some((min, max)), Some((first, last))) if max < first || min > last => {
            warn!("Weeks {min}-{max} are outside the table's weeks {first}-{last}");
            report.filter_weeks(min, max)
        }
        (Some((min, max)), _) => report.filter_weeks(min, max),
        (None, _) => report.clone(),
    };

    print_run_summary(&report.summary);
    println!();
    let metrics: Vec<&str> = report.thresholds.iter().map(|t| t.metric.as_str()).collect();
    print_weekly_table(&view.table, &metrics);
    println!();
    print_alert_table(&report.alerts);
    println!();
    print_threshold_table(&report.thresholds);

    if let Some(out_dir) = &args.out {
        write_outputs(out_dir, &report)?;
    }

    info!("Surveillance run completed in {:?}", start.elapsed());
    Ok(())
}
