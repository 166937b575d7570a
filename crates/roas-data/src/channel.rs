//! Advertising channel definitions.

use crate::error::DataError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Advertising platforms modeled by the pipeline.
///
/// Every channel is trained and served independently.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Google Ads (search and display)
    #[display("google_ads")]
    GoogleAds,

    /// Meta Ads (Facebook and Instagram)
    #[display("meta_ads")]
    MetaAds,
}

/// How predictions are served for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStrategy {
    /// Serve the persisted learned model, falling back to the baseline when
    /// no artifact exists.
    Learned,

    /// Always serve the historical baseline.
    BaselineOnly,
}

impl Channel {
    /// Returns all channels in training order.
    pub const fn all() -> [Self; 2] {
        [Self::GoogleAds, Self::MetaAds]
    }

    /// Identifier used in datasets and artifact names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleAds => "google_ads",
            Self::MetaAds => "meta_ads",
        }
    }

    /// Human readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GoogleAds => "Google Ads",
            Self::MetaAds => "Meta Ads",
        }
    }

    /// Whether this is the primary channel (value 1 of the channel indicator feature).
    pub const fn is_primary(&self) -> bool {
        matches!(self, Self::GoogleAds)
    }

    /// Channel indicator value used as a feature.
    pub const fn indicator(&self) -> f64 {
        if self.is_primary() { 1.0 } else { 0.0 }
    }

    /// Serving strategy for this channel.
    ///
    /// Meta Ads history is too sparse for the learned models to beat the
    /// per-campaign mean, so it is served from the baseline.
    pub const fn serving_strategy(&self) -> ServingStrategy {
        match self {
            Self::GoogleAds => ServingStrategy::Learned,
            Self::MetaAds => ServingStrategy::BaselineOnly,
        }
    }
}

impl FromStr for Channel {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google_ads" => Ok(Self::GoogleAds),
            "meta_ads" => Ok(Self::MetaAds),
            _ => Err(DataError::UnknownChannel(s.to_string())),
        }
    }
}
