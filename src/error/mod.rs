//! Error handling for the surveillance pipeline.
//!
//! Only boundary failures are errors: an input batch without its key column,
//! unreadable files, invalid configuration or a failed Arrow conversion.
//! Everything the pipeline can recover from (unparseable MIC strings, invalid
//! weeks, degenerate statistics, missing weeks in a join) is handled in place
//! and surfaced through summaries and threshold metadata instead.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the surveillance pipeline
#[derive(Debug, thiserror::Error)]
pub enum SurveillanceError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from an input batch
    #[error("Column '{column}' not found in record batch")]
    ColumnNotFound { column: String },

    /// A column has a type that cannot be used for its role
    #[error("Column '{column}' has unsupported type, expected {expected}")]
    InvalidDataType { column: String, expected: String },

    /// A week key outside 1-53 or repeated in a table
    #[error("Invalid week {week}: {reason}")]
    InvalidWeek { week: i64, reason: String },

    /// A column whose length differs from the table it is added to
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Struct to record batch conversion failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SurveillanceError {
    /// Shorthand for [`SurveillanceError::ColumnNotFound`]
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Shorthand for [`SurveillanceError::InvalidDataType`]
    pub fn invalid_data_type(column: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidDataType {
            column: column.into(),
            expected: expected.into(),
        }
    }
}

impl From<serde_arrow::Error> for SurveillanceError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for surveillance operations
pub type Result<T> = std::result::Result<T, SurveillanceError>;
