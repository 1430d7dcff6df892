//! The weekly resistance table: one row per surveillance week.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use log::debug;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{Result, SurveillanceError};
use crate::utils::arrow::{extract_float64s, get_column};
use crate::utils::logging::log_discarded;

/// Highest ISO week number
pub const MAX_WEEK: u32 = 53;

/// A numeric column of the weekly table
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A boolean alert flag column produced for one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagColumn {
    /// Metric the flag belongs to
    pub metric: String,
    /// Column name in the exported table
    pub name: String,
    pub values: Vec<bool>,
}

/// Rows discarded while building a table from a record batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Rows in the input batch
    pub rows_read: usize,
    /// Rows whose week is missing, non-integral or outside 1-53
    pub invalid_week: usize,
    /// Rows repeating a week already seen
    pub duplicate_week: usize,
    /// Columns that could not be read as numbers
    pub skipped_columns: Vec<String>,
}

/// Weekly resistance records keyed by week
///
/// Weeks are unique and in input order. Every numeric column and flag column
/// has exactly one value per week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTable {
    week_column: String,
    weeks: Vec<u32>,
    columns: Vec<WeeklyColumn>,
    flags: Vec<FlagColumn>,
}

impl WeeklyTable {
    /// Create a table from a list of weeks
    ///
    /// # Errors
    /// Returns [`SurveillanceError::InvalidWeek`] for a week outside 1-53 or
    /// a repeated week.
    pub fn new(week_column: impl Into<String>, weeks: Vec<u32>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for &week in &weeks {
            if !(1..=MAX_WEEK).contains(&week) {
                return Err(SurveillanceError::InvalidWeek {
                    week: i64::from(week),
                    reason: format!("must be between 1 and {MAX_WEEK}"),
                });
            }
            if !seen.insert(week) {
                return Err(SurveillanceError::InvalidWeek {
                    week: i64::from(week),
                    reason: "duplicate week".to_string(),
                });
            }
        }

        Ok(Self {
            week_column: week_column.into(),
            weeks,
            columns: Vec::new(),
            flags: Vec::new(),
        })
    }

    /// Add a numeric column, builder style
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        self.set_column(name, values)?;
        Ok(self)
    }

    /// Add or replace a numeric column
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.weeks.len() {
            return Err(SurveillanceError::LengthMismatch {
                column: name.to_string(),
                expected: self.weeks.len(),
                actual: values.len(),
            });
        }
        if name == self.week_column {
            return Err(SurveillanceError::Config(format!(
                "column '{name}' collides with the week column"
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            debug!("Replacing existing column '{name}'");
            existing.values = values;
        } else {
            self.columns.push(WeeklyColumn {
                name: name.to_string(),
                values,
            });
        }
        Ok(())
    }

    /// Add or replace a flag column
    pub fn set_flag(&mut self, flag: FlagColumn) -> Result<()> {
        if flag.values.len() != self.weeks.len() {
            return Err(SurveillanceError::LengthMismatch {
                column: flag.name,
                expected: self.weeks.len(),
                actual: flag.values.len(),
            });
        }
        if let Some(existing) = self.flags.iter_mut().find(|f| f.name == flag.name) {
            *existing = flag;
        } else {
            self.flags.push(flag);
        }
        Ok(())
    }

    /// Build a table from a weekly record batch
    ///
    /// The week column is required. Rows whose week cannot be coerced to an
    /// integer in 1-53 and rows repeating an earlier week are discarded and
    /// counted in the returned [`LoadSummary`]. Every other column that can
    /// be read as numbers becomes a numeric column; the rest are skipped.
    pub fn from_record_batch(batch: &RecordBatch, week_column: &str) -> Result<(Self, LoadSummary)> {
        let week_array = get_column(batch, week_column, true)?
            .ok_or_else(|| SurveillanceError::column_not_found(week_column))?;
        let raw_weeks = extract_float64s(&week_array, week_column)?;

        let mut summary = LoadSummary {
            rows_read: batch.num_rows(),
            ..Default::default()
        };
        let mut seen = FxHashSet::default();
        let mut kept_rows = Vec::with_capacity(raw_weeks.len());
        let mut weeks = Vec::with_capacity(raw_weeks.len());

        for (row, raw) in raw_weeks.iter().enumerate() {
            let Some(week) = raw.and_then(coerce_week) else {
                summary.invalid_week += 1;
                continue;
            };
            if !seen.insert(week) {
                summary.duplicate_week += 1;
                continue;
            }
            kept_rows.push(row);
            weeks.push(week);
        }

        let mut table = Self {
            week_column: week_column.to_string(),
            weeks,
            columns: Vec::new(),
            flags: Vec::new(),
        };

        let schema = batch.schema();
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let name = field.name();
            if name == week_column {
                continue;
            }
            let Some(values) = read_numeric_column(array, name) else {
                debug!("Skipping non-numeric column '{name}'");
                summary.skipped_columns.push(name.clone());
                continue;
            };
            let values = kept_rows.iter().map(|&row| values[row]).collect();
            table.set_column(name, values)?;
        }

        log_discarded(
            "Weekly table",
            "week missing or outside 1-53",
            summary.invalid_week,
            summary.rows_read,
        );
        log_discarded(
            "Weekly table",
            "week repeated",
            summary.duplicate_week,
            summary.rows_read,
        );

        Ok((table, summary))
    }

    /// Export weeks, numeric columns and flag columns as a record batch
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(1 + self.columns.len() + self.flags.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

        fields.push(Field::new(&self.week_column, DataType::Int32, false));
        arrays.push(Arc::new(Int32Array::from_iter_values(
            self.weeks.iter().map(|&w| w as i32),
        )));

        for column in &self.columns {
            fields.push(Field::new(&column.name, DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(column.values.clone())));
        }
        for flag in &self.flags {
            fields.push(Field::new(&flag.name, DataType::Boolean, false));
            arrays.push(Arc::new(BooleanArray::from(flag.values.clone())));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    #[must_use]
    pub fn week_column(&self) -> &str {
        &self.week_column
    }

    #[must_use]
    pub fn weeks(&self) -> &[u32] {
        &self.weeks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[WeeklyColumn] {
        &self.columns
    }

    /// Values of a numeric column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Value of a numeric column in the given row
    #[must_use]
    pub fn value(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|values| values.get(row).copied().flatten())
    }

    #[must_use]
    pub fn flags(&self) -> &[FlagColumn] {
        &self.flags
    }

    /// Flag column of a metric
    #[must_use]
    pub fn flag(&self, metric: &str) -> Option<&FlagColumn> {
        self.flags.iter().find(|f| f.metric == metric)
    }

    /// Names of the columns whose name contains `marker`, in table order
    #[must_use]
    pub fn percent_columns(&self, marker: &str) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| name.contains(marker))
            .collect()
    }

    /// Lowest and highest week in the table
    #[must_use]
    pub fn week_bounds(&self) -> Option<(u32, u32)> {
        let min = self.weeks.iter().min()?;
        let max = self.weeks.iter().max()?;
        Some((*min, *max))
    }

    /// Rows whose week lies in `min..=max`, with all columns and flags
    #[must_use]
    pub fn filter_weeks(&self, min: u32, max: u32) -> Self {
        let rows: Vec<usize> = self
            .weeks
            .iter()
            .enumerate()
            .filter(|(_, w)| (min..=max).contains(*w))
            .map(|(row, _)| row)
            .collect();

        Self {
            week_column: self.week_column.clone(),
            weeks: rows.iter().map(|&r| self.weeks[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| WeeklyColumn {
                    name: c.name.clone(),
                    values: rows.iter().map(|&r| c.values[r]).collect(),
                })
                .collect(),
            flags: self
                .flags
                .iter()
                .map(|f| FlagColumn {
                    metric: f.metric.clone(),
                    name: f.name.clone(),
                    values: rows.iter().map(|&r| f.values[r]).collect(),
                })
                .collect(),
        }
    }
}

/// Coerce a raw week value to an integer week in 1-53
#[must_use]
pub fn coerce_week(raw: f64) -> Option<u32> {
    if !raw.is_finite() || raw.fract() != 0.0 || raw < 1.0 || raw > f64::from(MAX_WEEK) {
        return None;
    }
    Some(raw as u32)
}

/// Read a column as numbers, `None` when the column holds no numbers at all
fn read_numeric_column(array: &ArrayRef, name: &str) -> Option<Vec<Option<f64>>> {
    let values = extract_float64s(array, name).ok()?;
    let numeric = values.iter().filter(|v| v.is_some()).count();
    let non_null = array.len() - array.null_count();
    if non_null > 0 && numeric == 0 {
        return None;
    }
    Some(values)
}
