//! IO utilities for loading input tables and writing report tables
//!
//! These adapters sit outside the pipeline: they turn CSV or Parquet files
//! into single record batches and write derived batches back to Parquet.

pub mod csv;
pub mod parquet;

use std::path::Path;

use arrow::record_batch::RecordBatch;

use crate::error::{Result, SurveillanceError};

pub use self::csv::read_csv;
pub use self::parquet::{read_parquet, write_parquet};

/// Read a `.csv` or `.parquet` file into one record batch
pub fn read_table(path: &Path) -> Result<RecordBatch> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("parquet") => read_parquet(path),
        Some("csv" | "txt") => read_csv(path),
        _ => Err(SurveillanceError::Config(format!(
            "unsupported input format: {} (expected .csv or .parquet)",
            path.display()
        ))),
    }
}
