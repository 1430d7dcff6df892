//! Utilities for working with Arrow arrays.

use arrow::array::{Array, ArrayRef};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{Result, SurveillanceError};

/// Get a column from a record batch by name
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array if found
/// * `Ok(None)` - If the column is not found and `required` is false
/// * `Err(SurveillanceError)` - If the column is not found and `required` is true
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Option<ArrayRef>> {
    match batch.schema().index_of(column_name) {
        Ok(idx) => Ok(Some(batch.column(idx).clone())),
        Err(_) if required => Err(SurveillanceError::column_not_found(column_name)),
        Err(_) => {
            debug!("Optional column '{column_name}' not found in record batch");
            Ok(None)
        }
    }
}

/// Downcast a column to a specific array type with clear error messages
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| SurveillanceError::invalid_data_type(column_name, expected_type_name))
}
