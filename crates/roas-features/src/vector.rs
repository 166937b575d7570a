//! Feature vector of a single prediction request.

use crate::error::{FeatureError, Result};
use crate::registry::FEATURE_COLUMNS;
use roas_data::Channel;
use roas_data::metrics::ratio;
use serde::{Deserialize, Serialize};

/// Engineered features of one campaign-day, computed the way the feature
/// builder computes them for training rows.
///
/// Request-time ratios fall back to zero instead of being undefined, so a
/// request with no impressions or clicks still yields a usable vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Impressions served
    pub impressions: f64,
    /// Clicks received
    pub clicks: f64,
    /// Spend
    pub cost: f64,
    /// clicks / impressions, 0 without impressions
    pub ctr: f64,
    /// cost / clicks, 0 without clicks
    pub cpc: f64,
    /// 1 = Sunday through 7 = Saturday
    pub day_of_week: f64,
    /// 1 on Saturdays and Sundays
    pub is_weekend: f64,
    /// 1 through 12
    pub month: f64,
    /// log(1 + cost)
    pub log_cost: f64,
    /// log(1 + impressions)
    pub log_impressions: f64,
    /// clicks / (impressions + 1)
    pub click_impression_ratio: f64,
    /// 1 for the primary channel
    pub is_primary_channel: f64,
}

impl FeatureVector {
    /// Build the vector from request counters and calendar fields.
    pub fn from_request(
        channel: Channel,
        impressions: f64,
        clicks: f64,
        cost: f64,
        day_of_week: u32,
        month: u32,
    ) -> Self {
        Self {
            impressions,
            clicks,
            cost,
            ctr: ratio(clicks, impressions).unwrap_or(0.0),
            cpc: ratio(cost, clicks).unwrap_or(0.0),
            day_of_week: f64::from(day_of_week),
            is_weekend: if matches!(day_of_week, 1 | 7) { 1.0 } else { 0.0 },
            month: f64::from(month),
            log_cost: cost.ln_1p(),
            log_impressions: impressions.ln_1p(),
            click_impression_ratio: clicks / (impressions + 1.0),
            is_primary_channel: channel.indicator(),
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order.
    pub const fn to_array(&self) -> [f64; 12] {
        [
            self.impressions,
            self.clicks,
            self.cost,
            self.ctr,
            self.cpc,
            self.day_of_week,
            self.is_weekend,
            self.month,
            self.log_cost,
            self.log_impressions,
            self.click_impression_ratio,
            self.is_primary_channel,
        ]
    }

    /// Value of a named feature.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|&column| column == name)
            .map(|i| self.to_array()[i])
    }

    /// Values of the named features, in the given order.
    pub fn select(&self, features: &[&str]) -> Result<Vec<f64>> {
        features
            .iter()
            .map(|&name| {
                self.get(name).ok_or_else(|| FeatureError::MissingColumn {
                    stage: "feature_vector".to_string(),
                    column: name.to_string(),
                })
            })
            .collect()
    }

    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
