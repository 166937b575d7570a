//! Feature Builder
//!
//! Turns the raw campaign frame into a cleaned, feature-engineered
//! [`Dataset`]:
//!
//! 1. Drop rows with cost <= 0.
//! 2. Drop campaigns with fewer than `min_campaign_rows` rows.
//! 3. Winsorize ROAS per channel, then cap it at `roas_cap`.
//! 4. Winsorize impressions, clicks, cost, ctr and cpc globally.
//! 5. Add the derived features.
//! 6. Drop rows with a missing or non-finite feature or target.

use crate::dataset::Dataset;
use crate::error::{FeatureError, Result};
use crate::registry::{FEATURE_COLUMNS, TARGET_COLUMN};
use crate::stages::{
    CampaignSupportFilter, CleaningStage, DerivedFeatures, FeatureWinsorizer, RoasWinsorizer,
    SpendFilter,
};
use polars::prelude::*;
use roas_data::Channel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the feature builder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Minimum rows a campaign needs to be kept (default: 10)
    pub min_campaign_rows: u32,
    /// Per-channel ROAS winsorization quantile (default: 0.95)
    pub roas_percentile: f64,
    /// Absolute ROAS cap applied after winsorization (default: 100)
    pub roas_cap: f64,
    /// Global traffic feature winsorization quantile (default: 0.99)
    pub feature_percentile: f64,
    /// Channel flagged by the `is_primary_channel` indicator
    pub primary_channel: Channel,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_campaign_rows: 10,
            roas_percentile: 0.95,
            roas_cap: 100.0,
            feature_percentile: 0.99,
            primary_channel: Channel::GoogleAds,
        }
    }
}

/// Builds cleaned datasets from raw campaign frames.
#[derive(Debug)]
pub struct FeatureBuilder {
    config: FeatureConfig,
    stages: Vec<Box<dyn CleaningStage>>,
}

impl FeatureBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: FeatureConfig) -> Self {
        let stages: Vec<Box<dyn CleaningStage>> = vec![
            Box::new(SpendFilter),
            Box::new(CampaignSupportFilter::new(config.min_campaign_rows)),
            Box::new(RoasWinsorizer::new(config.roas_percentile, config.roas_cap)),
            Box::new(FeatureWinsorizer::new(config.feature_percentile)),
            Box::new(DerivedFeatures::new(config.primary_channel)),
        ];
        Self { config, stages }
    }

    /// Builder configuration.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build a dataset from the raw frame produced by
    /// [`roas_data::records_to_frame`].
    ///
    /// An empty raw frame yields an empty dataset.
    pub fn build(&self, raw: &DataFrame) -> Result<Dataset> {
        if raw.height() == 0 {
            return Ok(Dataset::empty());
        }

        let mut frame = raw.clone();
        for stage in &self.stages {
            check_columns(stage.as_ref(), &frame)?;
            let before = frame.height();
            frame = stage.apply(frame.lazy())?.collect()?;
            debug!(
                stage = stage.name(),
                rows_in = before,
                rows_out = frame.height(),
                "Applied cleaning stage"
            );
        }

        let frame = drop_non_finite(frame)?;
        let frame = frame
            .lazy()
            .sort(["date"], Default::default())
            .collect()?;

        debug!(rows = frame.height(), "Built feature dataset");
        Ok(Dataset::new(frame))
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

fn check_columns(stage: &dyn CleaningStage, frame: &DataFrame) -> Result<()> {
    match stage
        .required_columns()
        .iter()
        .find(|column| frame.column(column).is_err())
    {
        Some(column) => Err(FeatureError::MissingColumn {
            stage: stage.name().to_string(),
            column: (*column).to_string(),
        }),
        None => Ok(()),
    }
}

/// Keep rows whose features and target are all present and finite.
fn drop_non_finite(frame: DataFrame) -> Result<DataFrame> {
    let mut keep = vec![true; frame.height()];

    for name in FEATURE_COLUMNS.iter().chain(std::iter::once(&TARGET_COLUMN)) {
        let values = frame.column(name)?.cast(&DataType::Float64)?;
        for (flag, value) in keep.iter_mut().zip(values.f64()?) {
            *flag &= value.is_some_and(f64::is_finite);
        }
    }

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        debug!(dropped, "Dropped rows with missing or non-finite values");
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(frame.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use roas_data::{DailyCampaignRecord, records_to_frame};

    fn campaign(
        id: &str,
        channel: &str,
        days: i64,
        revenue: impl Fn(i64) -> f64,
    ) -> Vec<DailyCampaignRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        (0..days)
            .map(|d| {
                DailyCampaignRecord::new(
                    start + Duration::days(d),
                    id,
                    channel,
                    1000.0 + 10.0 * d as f64,
                    40.0 + d as f64,
                    50.0,
                    revenue(d),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_input_gives_empty_dataset() {
        let ds = FeatureBuilder::default()
            .build(&records_to_frame(&[]).unwrap())
            .unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_thin_campaigns_are_dropped() {
        let mut records = campaign("kept", "google_ads", 12, |_| 100.0);
        records.extend(campaign("thin", "google_ads", 9, |_| 100.0));

        let ds = FeatureBuilder::default()
            .build(&records_to_frame(&records).unwrap())
            .unwrap();

        assert_eq!(ds.len(), 12);
        let counts = ds.campaign_row_counts().unwrap();
        assert_eq!(counts.len(), 1);
        assert!(counts.values().all(|&n| n >= 10));
    }

    #[test]
    fn test_roas_bounded_and_features_finite() {
        // One extreme ROAS spike and a zero-click day
        let mut records = campaign("spiky", "google_ads", 30, |d| {
            if d == 5 { 1_000_000.0 } else { 150.0 + d as f64 }
        });
        records[7].clicks = 0.0;
        records.extend(campaign("meta", "meta_ads", 15, |d| 20.0 * d as f64));

        let ds = FeatureBuilder::default()
            .build(&records_to_frame(&records).unwrap())
            .unwrap();

        // The zero-click row has an undefined cpc and is dropped
        assert_eq!(ds.len(), 44);

        let target = ds.target().unwrap();
        assert!(target.iter().all(|&r| (0.0..=100.0).contains(&r)));

        let x = ds.feature_matrix(&FEATURE_COLUMNS).unwrap();
        assert_eq!(x.ncols(), 12);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_output_sorted_by_date() {
        let mut records = campaign("a", "google_ads", 10, |_| 100.0);
        records.reverse();
        let ds = FeatureBuilder::default()
            .build(&records_to_frame(&records).unwrap())
            .unwrap();
        let dates = ds.dates().unwrap();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_missing_column() {
        let df = DataFrame::new(vec![Series::new("cost".into(), [1.0]).into()]).unwrap();
        let err = FeatureBuilder::default().build(&df).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::MissingColumn { ref column, .. } if column == "campaign_id"
        ));
    }
}
