//! Error types for training and serving.

use roas_data::DataError;
use roas_features::FeatureError;
use roas_model::ModelError;
use roas_output::OutputError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RoasError>;

/// Errors that can occur while training or serving predictions.
#[derive(Debug, Error)]
pub enum RoasError {
    /// Record source error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Feature building or splitting error
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Model fitting or inference error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Artifact persistence error
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Nothing survived cleaning in the lookback window
    #[error("No usable records in the last {lookback_days} days")]
    EmptyDataset {
        /// Lookback window that was queried
        lookback_days: u32,
    },
}
