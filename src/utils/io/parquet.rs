//! Parquet file operations

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Result, SurveillanceError};
use crate::utils::logging::{log_table_io_complete, log_table_io_start};

/// Read a Parquet file into a single record batch
///
/// # Errors
/// Returns an error if the file cannot be opened or if the Parquet file is invalid
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();
    log_table_io_start("Reading Parquet table", path);

    let file = File::open(path).map_err(|e| {
        SurveillanceError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file {}: {e}", path.display()),
        ))
    })?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = reader_builder.schema().clone();
    let batches = reader_builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let batch = concat_batches(&schema, &batches)?;
    log_table_io_complete(
        "Read",
        path,
        batch.num_rows(),
        batch.num_columns(),
        start.elapsed(),
    );
    Ok(batch)
}

/// Write a record batch to a Parquet file, replacing any existing file
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let start = Instant::now();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    log_table_io_complete(
        "Wrote",
        path,
        batch.num_rows(),
        batch.num_columns(),
        start.elapsed(),
    );
    Ok(())
}
