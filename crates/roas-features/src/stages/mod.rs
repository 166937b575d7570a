//! Cleaning stages of the feature builder.
//!
//! Each stage is a lazy transformation of the working frame. The builder
//! materializes the frame between stages, so window expressions in a stage
//! always see the rows left by the previous one.

mod derived;
mod filters;
mod winsorize;

pub use derived::DerivedFeatures;
pub use filters::{CampaignSupportFilter, SpendFilter};
pub use winsorize::{FeatureWinsorizer, RoasWinsorizer, WINSORIZED_FEATURES};

use crate::error::Result;
use polars::prelude::*;

/// One step of the cleaning pipeline.
pub trait CleaningStage: std::fmt::Debug + Send + Sync {
    /// Stage name used in logs and errors.
    fn name(&self) -> &str;

    /// Transform the frame.
    fn apply(&self, data: LazyFrame) -> Result<LazyFrame>;

    /// Columns the stage reads.
    fn required_columns(&self) -> &[&str];
}
