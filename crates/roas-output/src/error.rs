//! Error types for persistence and reporting.

use thiserror::Error;

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Errors that can occur while writing or reading artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An artifact exists but holds a different model kind than its name
    /// promises
    #[error("Artifact {path} holds a {found} model, expected {expected}")]
    KindMismatch {
        /// Artifact path
        path: String,
        /// Kind implied by the file name
        expected: String,
        /// Kind found in the file
        found: String,
    },
}
