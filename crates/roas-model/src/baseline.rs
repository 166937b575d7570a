//! Historical baseline.
//!
//! Mean ROAS per campaign, with per-channel and global means as fallbacks
//! for campaigns without history.

use crate::error::Result;
use derive_more::Display;
use ndarray::Array1;
use polars::prelude::*;
use roas_features::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which level of the baseline answered a query.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Mean of the campaign's own history
    #[display("campaign_history")]
    CampaignHistory,
    /// Mean over the campaign's channel
    #[display("channel_mean")]
    ChannelMean,
    /// Mean over every row
    #[display("global_mean")]
    GlobalMean,
}

/// Mean ROAS by campaign, by channel and overall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineTable {
    campaign_means: HashMap<String, f64>,
    channel_means: HashMap<String, f64>,
    global_mean: f64,
}

impl BaselineTable {
    /// Compute the table from a frame with `campaign_id`, `channel` and
    /// `roas` columns. Null ROAS values are ignored.
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        if frame.height() == 0 {
            return Ok(Self::default());
        }

        let campaign_means = group_means(frame, "campaign_id")?;
        let channel_means = group_means(frame, "channel")?;
        let global_mean = frame
            .column("roas")?
            .cast(&DataType::Float64)?
            .f64()?
            .mean()
            .unwrap_or(0.0);

        Ok(Self {
            campaign_means,
            channel_means,
            global_mean,
        })
    }

    /// Compute the table from a cleaned dataset.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        Self::from_frame(dataset.frame())
    }

    /// Whether the table was built from no rows.
    pub fn is_empty(&self) -> bool {
        self.campaign_means.is_empty()
    }

    /// Mean ROAS of a campaign, if it has history.
    pub fn campaign_mean(&self, campaign_id: &str) -> Option<f64> {
        self.campaign_means.get(campaign_id).copied()
    }

    /// Mean ROAS of a channel, if it has history.
    pub fn channel_mean(&self, channel: &str) -> Option<f64> {
        self.channel_means.get(channel).copied()
    }

    /// Mean ROAS over every row.
    pub const fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Number of campaigns with history.
    pub fn n_campaigns(&self) -> usize {
        self.campaign_means.len()
    }

    /// Most specific mean available for a campaign on a channel.
    pub fn predict(&self, campaign_id: &str, channel: &str) -> (f64, BaselineSource) {
        if let Some(mean) = self.campaign_mean(campaign_id) {
            (mean, BaselineSource::CampaignHistory)
        } else if let Some(mean) = self.channel_mean(channel) {
            (mean, BaselineSource::ChannelMean)
        } else {
            (self.global_mean, BaselineSource::GlobalMean)
        }
    }

    /// Predict every row of a dataset.
    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Array1<f64>> {
        let campaigns = dataset.campaign_ids()?;
        let channels = dataset.channel_names()?;
        Ok(campaigns
            .iter()
            .zip(&channels)
            .map(|(campaign, channel)| self.predict(campaign, channel).0)
            .collect())
    }
}

fn group_means(frame: &DataFrame, key: &str) -> Result<HashMap<String, f64>> {
    let grouped = frame
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([col("roas").cast(DataType::Float64).mean()])
        .collect()?;

    let keys = grouped.column(key)?.str()?;
    let means = grouped.column("roas")?.f64()?;

    Ok(keys
        .into_iter()
        .zip(means)
        .filter_map(|(k, m)| Some((k?.to_string(), m?)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("campaign_id".into(), ["a", "a", "b", "c"]).into(),
            Series::new("channel".into(), ["google_ads", "google_ads", "google_ads", "meta_ads"])
                .into(),
            Series::new("roas".into(), [Some(2.0), Some(4.0), Some(6.0), None]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_means() {
        let table = BaselineTable::from_frame(&frame()).unwrap();
        assert_relative_eq!(table.campaign_mean("a").unwrap(), 3.0);
        assert_relative_eq!(table.campaign_mean("b").unwrap(), 6.0);
        assert!(table.campaign_mean("c").is_none());
        assert_relative_eq!(table.channel_mean("google_ads").unwrap(), 4.0);
        assert!(table.channel_mean("meta_ads").is_none());
        assert_relative_eq!(table.global_mean(), 4.0);
        assert_eq!(table.n_campaigns(), 2);
    }

    #[test]
    fn test_fallback_order() {
        let table = BaselineTable::from_frame(&frame()).unwrap();
        assert_eq!(
            table.predict("a", "google_ads"),
            (3.0, BaselineSource::CampaignHistory)
        );
        assert_eq!(
            table.predict("new", "google_ads"),
            (4.0, BaselineSource::ChannelMean)
        );
        assert_eq!(
            table.predict("new", "tiktok_ads"),
            (4.0, BaselineSource::GlobalMean)
        );
    }

    #[test]
    fn test_empty_frame() {
        let table = BaselineTable::from_frame(&DataFrame::empty()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.predict("a", "google_ads").1, BaselineSource::GlobalMean);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(BaselineSource::CampaignHistory.to_string(), "campaign_history");
        assert_eq!(BaselineSource::GlobalMean.to_string(), "global_mean");
    }
}
