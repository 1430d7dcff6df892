//! Per-specimen MIC records.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::mic::dates::{DateFormatConfig, iso_week_of};
use crate::mic::normalize::normalize_mic;
use crate::utils::arrow::{extract_dates, extract_strings, get_column};
use crate::utils::logging::log_discarded;

/// One specimen test with its raw concentration strings per drug
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MicRecord {
    /// Sample date, `None` when missing or unparseable
    pub sample_date: Option<NaiveDate>,
    /// Raw concentration string per drug column
    pub concentrations: FxHashMap<String, String>,
}

impl MicRecord {
    #[must_use]
    pub fn new(sample_date: Option<NaiveDate>) -> Self {
        Self {
            sample_date,
            concentrations: FxHashMap::default(),
        }
    }

    /// Add a raw concentration for a drug
    #[must_use]
    pub fn with_concentration(mut self, drug: &str, raw: &str) -> Self {
        self.concentrations.insert(drug.to_string(), raw.to_string());
        self
    }

    /// Raw concentration string for a drug
    #[must_use]
    pub fn raw_concentration(&self, drug: &str) -> Option<&str> {
        self.concentrations.get(drug).map(String::as_str)
    }

    /// Normalized MIC value for a drug
    #[must_use]
    pub fn mic(&self, drug: &str) -> Option<f64> {
        self.raw_concentration(drug).and_then(normalize_mic)
    }

    /// ISO calendar week of the sample date
    #[must_use]
    pub fn week(&self) -> Option<u32> {
        self.sample_date.map(iso_week_of)
    }
}

/// Default week-extraction rule: ISO week of the sample date
#[must_use]
pub fn iso_week(record: &MicRecord) -> Option<u32> {
    record.week()
}

/// Build MIC records from a per-specimen batch
///
/// A date column that is absent or of an unusable type leaves every record
/// undated. Drug columns that are absent or unreadable are logged and
/// contribute no concentrations, so every record is untested for them.
pub fn mic_records_from_batch(
    batch: &RecordBatch,
    date_column: &str,
    drug_columns: &[&str],
    date_config: &DateFormatConfig,
) -> Result<Vec<MicRecord>> {
    let dates = match get_column(batch, date_column, false)? {
        Some(array) => extract_dates(&array, date_column, date_config).unwrap_or_else(|e| {
            warn!("Sample dates unusable, all MIC records left undated: {e}");
            vec![None; batch.num_rows()]
        }),
        None => {
            warn!("MIC date column '{date_column}' not found; all MIC records left undated");
            vec![None; batch.num_rows()]
        }
    };

    let mut records: Vec<MicRecord> = dates.into_iter().map(MicRecord::new).collect();

    for drug in drug_columns.iter().unique() {
        let Some(array) = get_column(batch, drug, false)? else {
            warn!("MIC column '{drug}' not found; no tests will be counted for it");
            continue;
        };
        let raw_values = match extract_strings(&array, drug) {
            Ok(values) => values,
            Err(e) => {
                warn!("MIC column '{drug}' unreadable; no tests will be counted for it: {e}");
                continue;
            }
        };
        for (record, raw) in records.iter_mut().zip(raw_values) {
            if let Some(raw) = raw {
                record.concentrations.insert((*drug).to_string(), raw);
            }
        }
    }

    let undated = records.iter().filter(|r| r.sample_date.is_none()).count();
    log_discarded(
        "MIC records",
        "sample date missing or unparseable",
        undated,
        records.len(),
    );

    Ok(records)
}
