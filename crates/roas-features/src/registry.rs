//! Feature Registry
//!
//! Central list of the engineered columns. Column order here is the column
//! order of every feature matrix handed to a model, so training and serving
//! agree on the layout.

use roas_data::Channel;
use std::collections::HashMap;

/// Name of the regression target column.
pub const TARGET_COLUMN: &str = "roas";

/// Every engineered feature, in model order. The last entry is the channel
/// indicator.
pub const FEATURE_COLUMNS: [&str; 12] = [
    "impressions",
    "clicks",
    "cost",
    "ctr",
    "cpc",
    "day_of_week",
    "is_weekend",
    "month",
    "log_cost",
    "log_impressions",
    "click_impression_ratio",
    "is_primary_channel",
];

/// Features used by per-channel models: [`FEATURE_COLUMNS`] without the
/// channel indicator, which is constant inside a channel.
pub const MODEL_FEATURES: [&str; 11] = [
    "impressions",
    "clicks",
    "cost",
    "ctr",
    "cpc",
    "day_of_week",
    "is_weekend",
    "month",
    "log_cost",
    "log_impressions",
    "click_impression_ratio",
];

/// Feature categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    /// Counters and ratios reported by the platform
    Raw,
    /// Calendar fields of the record date
    Calendar,
    /// Transformations of raw fields
    Engineered,
    /// Channel identity
    Channel,
}

/// Feature metadata
#[derive(Debug, Clone)]
pub struct FeatureInfo {
    /// Column name (unique identifier)
    pub name: &'static str,
    /// Feature category
    pub category: FeatureCategory,
    /// Brief description of the column
    pub description: &'static str,
    /// Whether per-channel models consume the column
    pub model_input: bool,
}

/// Get all engineered feature info
pub fn available_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            name: "impressions",
            category: FeatureCategory::Raw,
            description: "Impressions served, winsorized at the 99th percentile",
            model_input: true,
        },
        FeatureInfo {
            name: "clicks",
            category: FeatureCategory::Raw,
            description: "Clicks received, winsorized at the 99th percentile",
            model_input: true,
        },
        FeatureInfo {
            name: "cost",
            category: FeatureCategory::Raw,
            description: "Daily spend, winsorized at the 99th percentile",
            model_input: true,
        },
        FeatureInfo {
            name: "ctr",
            category: FeatureCategory::Raw,
            description: "Click-through rate (clicks / impressions)",
            model_input: true,
        },
        FeatureInfo {
            name: "cpc",
            category: FeatureCategory::Raw,
            description: "Cost per click (cost / clicks)",
            model_input: true,
        },
        FeatureInfo {
            name: "day_of_week",
            category: FeatureCategory::Calendar,
            description: "Day of week, 1 = Sunday through 7 = Saturday",
            model_input: true,
        },
        FeatureInfo {
            name: "is_weekend",
            category: FeatureCategory::Calendar,
            description: "1 on Saturdays and Sundays, else 0",
            model_input: true,
        },
        FeatureInfo {
            name: "month",
            category: FeatureCategory::Calendar,
            description: "Month of year, 1 through 12",
            model_input: true,
        },
        FeatureInfo {
            name: "log_cost",
            category: FeatureCategory::Engineered,
            description: "log(1 + cost)",
            model_input: true,
        },
        FeatureInfo {
            name: "log_impressions",
            category: FeatureCategory::Engineered,
            description: "log(1 + impressions)",
            model_input: true,
        },
        FeatureInfo {
            name: "click_impression_ratio",
            category: FeatureCategory::Engineered,
            description: "clicks / (impressions + 1)",
            model_input: true,
        },
        FeatureInfo {
            name: "cost_per_click_ratio",
            category: FeatureCategory::Engineered,
            description: "cost / (clicks + 1)",
            model_input: false,
        },
        FeatureInfo {
            name: "engagement_score",
            category: FeatureCategory::Engineered,
            description: "clicks * 100 / (impressions + 1)",
            model_input: false,
        },
        FeatureInfo {
            name: "is_primary_channel",
            category: FeatureCategory::Channel,
            description: "1 for the primary channel, else 0",
            model_input: false,
        },
    ]
}

/// Get features by category
pub fn features_by_category(category: FeatureCategory) -> Vec<FeatureInfo> {
    available_features()
        .into_iter()
        .filter(|f| f.category == category)
        .collect()
}

/// Get feature info by name
pub fn get_feature_info(name: &str) -> Option<FeatureInfo> {
    available_features().into_iter().find(|f| f.name == name)
}

/// Get a map of all features indexed by name
pub fn feature_map() -> HashMap<&'static str, FeatureInfo> {
    available_features()
        .into_iter()
        .map(|f| (f.name, f))
        .collect()
}

/// Model input columns for a channel.
pub const fn channel_features(channel: Channel) -> &'static [&'static str] {
    match channel {
        Channel::GoogleAds | Channel::MetaAds => &MODEL_FEATURES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_features_count() {
        // 12 engineered model columns plus two diagnostics
        assert_eq!(available_features().len(), 14);
    }

    #[test]
    fn test_model_features_are_registered_inputs() {
        for name in MODEL_FEATURES {
            let info = get_feature_info(name).unwrap();
            assert!(info.model_input, "{name} should be a model input");
        }
        let inputs = available_features().iter().filter(|f| f.model_input).count();
        assert_eq!(inputs, MODEL_FEATURES.len());
    }

    #[test]
    fn test_model_features_prefix_feature_columns() {
        assert_eq!(&FEATURE_COLUMNS[..11], &MODEL_FEATURES[..]);
        assert_eq!(FEATURE_COLUMNS[11], "is_primary_channel");
    }

    #[test]
    fn test_features_by_category() {
        assert_eq!(features_by_category(FeatureCategory::Raw).len(), 5);
        assert_eq!(features_by_category(FeatureCategory::Calendar).len(), 3);
        assert_eq!(features_by_category(FeatureCategory::Engineered).len(), 5);
        assert_eq!(features_by_category(FeatureCategory::Channel).len(), 1);
    }

    #[test]
    fn test_channel_features() {
        for channel in Channel::all() {
            assert_eq!(channel_features(channel).len(), 11);
        }
        assert!(feature_map().contains_key("log_cost"));
        assert!(get_feature_info("unknown").is_none());
    }
}
