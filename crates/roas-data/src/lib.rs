#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roas/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod record;
pub mod source;

pub use channel::{Channel, ServingStrategy};
pub use error::{DataError, Result};
pub use frame::{frame_dates, records_to_frame};
pub use record::DailyCampaignRecord;
pub use source::{CsvRecordSource, InMemorySource, RecordSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
