//! CSV export reader.

use super::{RecordSource, apply_lookback};
use crate::error::{DataError, Result};
use crate::record::DailyCampaignRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads daily campaign records from a CSV export.
///
/// Expected header: `date,campaign_id,campaign_name,channel,impressions,
/// clicks,cost,conversions,revenue` with ISO dates (`YYYY-MM-DD`). Empty
/// numeric cells default to zero.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
    name: String,
}

impl CsvRecordSource {
    /// Create a source reading from `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// Path of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in the file, without lookback filtering.
    pub fn read_all(&self) -> Result<Vec<DailyCampaignRecord>> {
        if !self.path.exists() {
            return Err(DataError::MissingData {
                source_name: self.name.clone(),
                reason: "file does not exist".to_string(),
            });
        }

        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_path(&self.path)?;

        let records = reader
            .deserialize::<DailyCampaignRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(path = %self.name, rows = records.len(), "Read campaign records");
        Ok(records)
    }
}

impl RecordSource for CsvRecordSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, lookback_days: u32) -> Result<Vec<DailyCampaignRecord>> {
        Ok(apply_lookback(self.read_all()?, lookback_days))
    }
}
