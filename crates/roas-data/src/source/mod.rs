//! Sources of daily campaign records.
//!
//! The pipeline never queries a warehouse itself; it asks a [`RecordSource`]
//! for the records of a lookback window. The window is anchored on the newest
//! date the source holds, so replaying an exported file gives the same
//! dataset regardless of when it runs.

pub mod csv;

pub use self::csv::CsvRecordSource;

use crate::error::Result;
use crate::record::DailyCampaignRecord;
use chrono::Duration;
use std::fmt::Debug;

/// Supplier of daily campaign records.
pub trait RecordSource: Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch records with positive spend for the last `lookback_days` days.
    fn fetch(&self, lookback_days: u32) -> Result<Vec<DailyCampaignRecord>>;
}

/// Keep records with positive spend inside the lookback window.
///
/// The window is inclusive: with a newest date `d`, records dated
/// `d - lookback_days` through `d` are kept.
pub fn apply_lookback(
    records: impl IntoIterator<Item = DailyCampaignRecord>,
    lookback_days: u32,
) -> Vec<DailyCampaignRecord> {
    let records: Vec<DailyCampaignRecord> =
        records.into_iter().filter(DailyCampaignRecord::has_spend).collect();

    let Some(newest) = records.iter().map(|r| r.date).max() else {
        return records;
    };
    let cutoff = newest - Duration::days(i64::from(lookback_days));

    records.into_iter().filter(|r| r.date >= cutoff).collect()
}

/// Record source backed by a vector, used by tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<DailyCampaignRecord>,
}

impl InMemorySource {
    /// Create a source over the given records.
    pub const fn new(records: Vec<DailyCampaignRecord>) -> Self {
        Self { records }
    }

    /// All records held by the source, unfiltered.
    pub fn records(&self) -> &[DailyCampaignRecord] {
        &self.records
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, lookback_days: u32) -> Result<Vec<DailyCampaignRecord>> {
        Ok(apply_lookback(self.records.iter().cloned(), lookback_days))
    }
}
