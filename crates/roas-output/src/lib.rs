#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roas/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod export;
pub mod format;
pub mod metadata;
pub mod report;
pub mod store;

pub use error::{OutputError, Result};
pub use export::{ExportFormat, Exporter};
pub use format::{format_currency, format_number, format_percentage, format_roas};
pub use metadata::{CandidateMetrics, FeatureImportance, ModelMetadata, SplitCounts};
pub use report::{ChannelReport, ChannelSummaryRow, SkipReason, TrainingReport};
pub use store::ModelStore;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
