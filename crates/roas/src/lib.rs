#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roas/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod service;

// Re-export main types from sub-crates
pub use roas_data as data;
pub use roas_features as features;
pub use roas_model as model;
pub use roas_output as output;

pub use config::{RoasConfig, SelectionConfig, ServingConfig};
pub use error::{Result, RoasError};
pub use pipeline::{Trainer, select_best};
pub use roas_data::{Channel, ServingStrategy};
pub use service::{
    CampaignSummary, ChannelSummary, Confidence, Prediction, PredictionMethod, PredictionRequest,
    PredictionResponse, PredictionService,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
