//! Serde structs to Arrow record batches.

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;

/// Convert a slice of records into a record batch
///
/// The schema is traced from the type, so an empty slice still yields a
/// batch with the right columns. Fieldless enums become string columns.
pub fn records_to_batch<T>(records: &[T]) -> Result<RecordBatch>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let fields = Vec::<FieldRef>::from_type::<T>(
        TracingOptions::default().enums_without_data_as_strings(true),
    )?;
    Ok(serde_arrow::to_record_batch(&fields, &records)?)
}
