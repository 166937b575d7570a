//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading campaign records.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV reading or deserialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Unknown channel identifier
    #[error("Unrecognized channel: {0}")]
    UnknownChannel(String),

    /// Missing data
    #[error("Missing data for {source_name}: {reason}")]
    MissingData {
        /// Source that was queried
        source_name: String,
        /// Reason for missing data
        reason: String,
    },
}
