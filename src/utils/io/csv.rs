//! CSV file operations
//!
//! Lab exports use either `,` or `;` as separator; the separator is taken from
//! the header line.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::logging::{log_table_io_complete, log_table_io_start};

/// Rows inspected for schema inference
const INFERENCE_ROWS: usize = 1000;

/// Read a CSV file with a header row into a single record batch
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();
    log_table_io_start("Reading CSV table", path);

    let mut file = File::open(path)?;
    let delimiter = {
        let mut header = String::new();
        BufReader::new(&mut file).read_line(&mut header)?;
        detect_delimiter(&header)
    };
    file.seek(SeekFrom::Start(0))?;

    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(&mut file, Some(INFERENCE_ROWS))?;
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let batches = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)?
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

/// Pick `;` when the header has more semicolons than commas
#[must_use]
pub fn detect_delimiter(header: &str) -> u8 {
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}
