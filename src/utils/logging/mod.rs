//! Logging utilities and console output

pub mod console;
pub mod log;

pub use console::{
    print_alert_table, print_run_summary, print_threshold_table, print_weekly_table,
};
pub use self::log::{log_discarded, log_table_io_complete, log_table_io_start};
