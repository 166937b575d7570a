#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roas/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod baseline;
pub mod error;
pub mod gbdt;
pub mod linear;
pub mod metrics;
pub mod model;

// Re-export main types
pub use baseline::{BaselineSource, BaselineTable};
pub use error::{ModelError, Result};
pub use gbdt::{GbdtConfig, GbdtModel, TreeNode};
pub use linear::{LinearModel, RidgeConfig, RidgeRegression, StandardScaler};
pub use metrics::{Metrics, improvement_pct};
pub use model::{ModelKind, TrainedModel};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
