#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roas/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod dataset;
pub mod error;
pub mod registry;
pub mod split;
pub mod stages;
pub mod vector;

pub use builder::{FeatureBuilder, FeatureConfig};
pub use dataset::Dataset;
pub use error::{FeatureError, Result};
pub use split::{SplitConfig, TemporalSplit, temporal_split};
pub use vector::FeatureVector;

// Re-export registry types for convenience
pub use registry::{
    FEATURE_COLUMNS, FeatureCategory, FeatureInfo, MODEL_FEATURES, TARGET_COLUMN,
    available_features, channel_features, features_by_category, get_feature_info,
};

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
