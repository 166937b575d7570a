//! Cleaned, feature-engineered dataset.

use crate::error::Result;
use crate::registry::TARGET_COLUMN;
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use roas_data::{Channel, frame_dates};
use std::collections::HashMap;

/// Date-ordered feature rows with their ROAS target.
///
/// Backed by a polars frame carrying the identifying columns (date,
/// campaign_id, campaign_name, channel) next to the features. Datasets are
/// never modified in place; filtering yields a new dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap a frame in the engineered layout.
    pub const fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Dataset without rows.
    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Date of every row.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        Ok(frame_dates(&self.frame)?)
    }

    /// Distinct dates, ascending.
    pub fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = self.dates()?;
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    /// First and last date, if any rows exist.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.distinct_dates()?;
        Ok(dates.first().copied().zip(dates.last().copied()))
    }

    /// Campaign id of every row.
    pub fn campaign_ids(&self) -> Result<Vec<String>> {
        self.string_column("campaign_id")
    }

    /// Channel identifier of every row.
    pub fn channel_names(&self) -> Result<Vec<String>> {
        self.string_column("channel")
    }

    /// Rows per campaign.
    pub fn campaign_row_counts(&self) -> Result<HashMap<String, usize>> {
        let mut counts = HashMap::new();
        for id in self.campaign_ids()? {
            *counts.entry(id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Rows of one channel.
    pub fn for_channel(&self, channel: Channel) -> Result<Self> {
        if self.is_empty() {
            return Ok(Self::empty());
        }
        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(col("channel").eq(lit(channel.as_str())))
            .collect()?;
        Ok(Self::new(frame))
    }

    /// Rows whose date satisfies `predicate`.
    pub fn filter_dates<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(NaiveDate) -> bool,
    {
        if self.is_empty() {
            return Ok(Self::empty());
        }
        let keep: Vec<bool> = self.dates()?.into_iter().map(predicate).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Ok(Self::new(self.frame.filter(&mask)?))
    }

    /// Row-major matrix of the named feature columns.
    ///
    /// Missing values become NaN; datasets built by the feature builder
    /// contain none.
    pub fn feature_matrix(&self, features: &[&str]) -> Result<Array2<f64>> {
        let mut x = Array2::zeros((self.len(), features.len()));
        if self.is_empty() {
            return Ok(x);
        }

        for (j, name) in features.iter().enumerate() {
            let values = self.frame.column(name)?.cast(&DataType::Float64)?;
            for (i, value) in values.f64()?.into_iter().enumerate() {
                x[[i, j]] = value.unwrap_or(f64::NAN);
            }
        }
        Ok(x)
    }

    /// ROAS target of every row.
    pub fn target(&self) -> Result<Array1<f64>> {
        Ok(Array1::from(self.float_column(TARGET_COLUMN)?))
    }

    /// Values of a float column, nulls as NaN.
    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.frame.column(name)?.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    fn string_column(&self, name: &str) -> Result<Vec<String>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .frame
            .column(name)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }
}
