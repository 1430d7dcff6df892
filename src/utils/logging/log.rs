//! Log messages shared by the table loaders and the pipeline stages.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};

/// Log the start of reading or writing a table file
pub fn log_table_io_start(action: &str, path: &Path) {
    info!("{action} {}", path.display());
}

/// Log a finished table read or write with its shape
pub fn log_table_io_complete(
    action: &str,
    path: &Path,
    rows: usize,
    columns: usize,
    elapsed: Duration,
) {
    info!(
        "{action} {rows} rows x {columns} columns ({}) in {elapsed:?}",
        path.display()
    );
}

/// Warn about rows a stage left out; silent when there are none
pub fn log_discarded(stage: &str, reason: &str, discarded: usize, total: usize) {
    if discarded > 0 {
        warn!("{stage}: {discarded} of {total} rows discarded ({reason})");
    }
}
