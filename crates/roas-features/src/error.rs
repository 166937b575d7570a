//! Error types for feature engineering.

use roas_data::DataError;
use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while building or splitting datasets.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Error from the data layer
    #[error(transparent)]
    Data(#[from] DataError),

    /// Not enough distinct dates for a temporal split
    #[error("Temporal split needs at least 3 distinct dates, found {found}")]
    InsufficientDates {
        /// Distinct dates available
        found: usize,
    },

    /// Split ratios outside (0, 1) or summing to 1 or more
    #[error("Invalid split ratios: train={train}, valid={valid}")]
    InvalidSplitRatio {
        /// Training share of dates
        train: f64,
        /// Validation share of dates
        valid: f64,
    },

    /// Input frame lacks a column a stage needs
    #[error("Missing column '{column}' required by {stage}")]
    MissingColumn {
        /// Stage that needed the column
        stage: String,
        /// Name of the missing column
        column: String,
    },

    /// Feature matrix could not be assembled
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
