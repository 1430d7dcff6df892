//! Whole-column extraction utilities for Arrow arrays
//!
//! Values that cannot be interpreted become `None`; only a column whose type
//! cannot be read at all is an error.

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::NaiveDate;

use crate::error::{Result, SurveillanceError};
use crate::mic::dates::{DateFormatConfig, parse_date_string};
use crate::utils::arrow::array_utils::downcast_array;

/// Extract a column as optional strings
///
/// Non-string columns (numbers, dates) are cast to their string form. Empty
/// strings are kept; interpretation is left to the caller.
pub fn extract_strings(array: &ArrayRef, column_name: &str) -> Result<Vec<Option<String>>> {
    let utf8 = if array.data_type() == &DataType::Utf8 {
        array.clone()
    } else {
        cast(array, &DataType::Utf8)
            .map_err(|_| SurveillanceError::invalid_data_type(column_name, "String"))?
    };
    let strings = downcast_array::<StringArray>(&utf8, column_name, "String")?;

    Ok(strings
        .iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Extract a column as optional `f64` values
///
/// Numeric columns are widened to `Float64`. String columns are parsed per
/// value, accepting surrounding whitespace and a decimal comma. `NaN` and
/// infinite values are treated as missing.
pub fn extract_float64s(array: &ArrayRef, column_name: &str) -> Result<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = match array.data_type() {
        dt if dt.is_numeric() => {
            let floats = cast(array, &DataType::Float64)?;
            downcast_array::<Float64Array>(&floats, column_name, "Float64")?
                .iter()
                .collect()
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            extract_strings(array, column_name)?
                .into_iter()
                .map(|value| value.and_then(|s| parse_decimal(&s)))
                .collect()
        }
        DataType::Null => vec![None; array.len()],
        _ => {
            return Err(SurveillanceError::invalid_data_type(
                column_name,
                "numeric or string",
            ));
        }
    };

    Ok(values
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()))
        .collect())
}

/// Extract a column as optional dates
///
/// Date and timestamp columns are cast to `Date32`; string columns are parsed
/// with the configured formats.
pub fn extract_dates(
    array: &ArrayRef,
    column_name: &str,
    config: &DateFormatConfig,
) -> Result<Vec<Option<NaiveDate>>> {
    match array.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let dates = cast(array, &DataType::Date32)?;
            let dates = downcast_array::<Date32Array>(&dates, column_name, "Date32")?;
            Ok((0..dates.len())
                .map(|i| {
                    if dates.is_null(i) {
                        None
                    } else {
                        dates.value_as_date(i)
                    }
                })
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            Ok(extract_strings(array, column_name)?
                .into_iter()
                .map(|value| value.and_then(|s| parse_date_string(&s, config)))
                .collect())
        }
        DataType::Null => Ok(vec![None; array.len()]),
        _ => Err(SurveillanceError::invalid_data_type(
            column_name,
            "date, timestamp or string",
        )),
    }
}

/// Parse a decimal number written with either `.` or `,` as separator
#[must_use]
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse().ok()
}
