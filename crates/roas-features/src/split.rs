//! Temporal Splitter
//!
//! Partitions a dataset into train, validation and test windows by date
//! boundaries. Rows are never shuffled, so nothing the model is scored on
//! precedes what it was fitted on.

use crate::dataset::Dataset;
use crate::error::{FeatureError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for temporal splitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of distinct dates in the training window (default: 0.70)
    pub train_ratio: f64,
    /// Share of distinct dates in the validation window (default: 0.15)
    pub valid_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.70,
            valid_ratio: 0.15,
        }
    }
}

impl SplitConfig {
    /// Check both ratios lie in (0, 1) and leave room for a test window.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |r: f64| r > 0.0 && r < 1.0;
        if in_unit(self.train_ratio)
            && in_unit(self.valid_ratio)
            && self.train_ratio + self.valid_ratio < 1.0
        {
            Ok(())
        } else {
            Err(FeatureError::InvalidSplitRatio {
                train: self.train_ratio,
                valid: self.valid_ratio,
            })
        }
    }

    /// Split `dataset` with these ratios.
    pub fn split(&self, dataset: &Dataset) -> Result<TemporalSplit> {
        temporal_split(dataset, self.train_ratio, self.valid_ratio)
    }
}

/// Train, validation and test windows of one dataset.
#[derive(Debug, Clone)]
pub struct TemporalSplit {
    /// Rows dated on or before `train_end`
    pub train: Dataset,
    /// Rows dated after `train_end`, on or before `valid_end`
    pub valid: Dataset,
    /// Rows dated after `valid_end`
    pub test: Dataset,
    /// Last training date
    pub train_end: NaiveDate,
    /// Last validation date
    pub valid_end: NaiveDate,
}

impl TemporalSplit {
    /// Row counts of (train, valid, test).
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.train.len(), self.valid.len(), self.test.len())
    }
}

/// Split `dataset` by date.
///
/// With `n` distinct dates sorted ascending, `dates[floor(n * train_ratio)]`
/// closes the training window and `dates[floor(n * (train_ratio +
/// valid_ratio))]` closes the validation window, both clamped to the last
/// date. Later windows may be empty when few dates are available.
///
/// # Errors
///
/// [`FeatureError::InvalidSplitRatio`] for ratios outside (0, 1) or summing
/// to 1 or more, [`FeatureError::InsufficientDates`] for fewer than three
/// distinct dates.
pub fn temporal_split(
    dataset: &Dataset,
    train_ratio: f64,
    valid_ratio: f64,
) -> Result<TemporalSplit> {
    SplitConfig {
        train_ratio,
        valid_ratio,
    }
    .validate()?;

    let dates = dataset.distinct_dates()?;
    let n = dates.len();
    if n < 3 {
        return Err(FeatureError::InsufficientDates { found: n });
    }

    // Plain float truncation: 90 * 0.7 lands on index 62, not 63.
    let boundary = |ratio: f64| {
        let idx = (n as f64 * ratio).floor() as usize;
        dates[idx.min(n - 1)]
    };
    let train_end = boundary(train_ratio);
    let valid_end = boundary(train_ratio + valid_ratio);

    let split = TemporalSplit {
        train: dataset.filter_dates(|d| d <= train_end)?,
        valid: dataset.filter_dates(|d| d > train_end && d <= valid_end)?,
        test: dataset.filter_dates(|d| d > valid_end)?,
        train_end,
        valid_end,
    };

    let (train, valid, test) = split.counts();
    debug!(
        dates = n,
        %train_end,
        %valid_end,
        train,
        valid,
        test,
        "Temporal split"
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FeatureBuilder;
    use chrono::Duration;
    use rstest::rstest;
    use roas_data::{DailyCampaignRecord, records_to_frame};

    /// `rows_per_day` rows for each of `days` consecutive dates.
    fn dataset(days: i64, rows_per_day: usize) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let records: Vec<DailyCampaignRecord> = (0..days)
            .flat_map(|d| {
                (0..rows_per_day).map(move |r| {
                    DailyCampaignRecord::new(
                        start + Duration::days(d),
                        "c1",
                        "google_ads",
                        100.0 + r as f64,
                        10.0,
                        5.0,
                        15.0,
                    )
                })
            })
            .collect();
        let builder = FeatureBuilder::new(crate::builder::FeatureConfig {
            min_campaign_rows: 1,
            ..Default::default()
        });
        builder.build(&records_to_frame(&records).unwrap()).unwrap()
    }

    #[test]
    fn test_two_dates_is_an_error() {
        let err = temporal_split(&dataset(2, 5), 0.7, 0.15).unwrap_err();
        assert!(matches!(err, FeatureError::InsufficientDates { found: 2 }));
    }

    #[test]
    fn test_three_dates_do_not_overlap() {
        let split = temporal_split(&dataset(3, 4), 0.7, 0.15).unwrap();
        let (train, valid, test) = split.counts();
        assert_eq!(train + valid + test, 12);
        assert_disjoint(&split);
    }

    #[test]
    fn test_twenty_dates() {
        let split = temporal_split(&dataset(20, 2), 0.7, 0.15).unwrap();
        // Boundaries at indices 14 and 17
        assert_eq!(split.counts(), (30, 6, 4));
        assert_disjoint(&split);
    }

    #[test]
    fn test_ninety_dates_truncates_float_products() {
        let split = temporal_split(&dataset(90, 1), 0.7, 0.15).unwrap();
        // 90 * 0.7 evaluates just below 63 and 90 * 0.85 to 76.5
        assert_eq!(split.counts(), (63, 14, 13));
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(split.train_end, start + Duration::days(62));
        assert_disjoint(&split);
    }

    #[rstest]
    #[case(0.0, 0.15)]
    #[case(1.0, 0.15)]
    #[case(0.7, 0.0)]
    #[case(0.7, 0.4)]
    #[case(-0.2, 0.5)]
    fn test_invalid_ratios(#[case] train: f64, #[case] valid: f64) {
        let err = temporal_split(&dataset(10, 1), train, valid).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidSplitRatio { .. }));
    }

    fn assert_disjoint(split: &TemporalSplit) {
        let max = |ds: &Dataset| ds.distinct_dates().unwrap().last().copied();
        let min = |ds: &Dataset| ds.distinct_dates().unwrap().first().copied();

        if let (Some(train_max), Some(valid_min)) = (max(&split.train), min(&split.valid)) {
            assert!(train_max < valid_min);
        }
        if let (Some(valid_max), Some(test_min)) = (max(&split.valid), min(&split.test)) {
            assert!(valid_max < test_min);
        }
        if let (Some(train_max), Some(test_min)) = (max(&split.train), min(&split.test)) {
            assert!(train_max < test_min);
        }
    }
}
