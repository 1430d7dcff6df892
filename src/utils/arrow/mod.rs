//! Arrow data handling utilities
//!
//! Column lookup and whole-column extraction of strings, numbers and dates
//! from loaded record batches, with the type coercions lab exports need, and
//! conversion of report records back into batches.

pub mod array_utils;
pub mod extractors;
pub mod records;

pub use array_utils::{downcast_array, get_column};
pub use extractors::{extract_dates, extract_float64s, extract_strings};
pub use records::records_to_batch;
