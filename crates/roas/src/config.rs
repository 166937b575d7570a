//! Pipeline configuration.
//!
//! Every section has defaults, so a JSON file only needs the values it
//! overrides:
//!
//! ```json
//! { "lookback_days": 60, "gbdt": { "n_estimators": 200 } }
//! ```

use crate::error::{Result, RoasError};
use roas_features::{FeatureConfig, SplitConfig};
use roas_model::{GbdtConfig, RidgeConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Candidate selection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Cleaned rows a channel needs before training is attempted (default: 30)
    pub min_channel_rows: usize,
    /// Feature importances kept in the metadata record (default: 10)
    pub top_features: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_channel_rows: 30,
            top_features: 10,
        }
    }
}

/// Prediction serving settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Upper clip of learned predictions (default: 100)
    pub prediction_clip: f64,
    /// Decimals kept in a predicted ROAS (default: 2)
    pub decimals: u32,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            prediction_clip: 100.0,
            decimals: 2,
        }
    }
}

/// Configuration of training and serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoasConfig {
    /// Cleaning and feature engineering
    pub features: FeatureConfig,
    /// Temporal split ratios
    pub split: SplitConfig,
    /// Gradient-boosted candidate
    pub gbdt: GbdtConfig,
    /// Ridge candidate
    pub ridge: RidgeConfig,
    /// Candidate selection
    pub selection: SelectionConfig,
    /// Prediction serving
    pub serving: ServingConfig,
    /// Directory of model artifacts (default: `models`)
    pub model_dir: PathBuf,
    /// Days of history used for training and baselines (default: 90)
    pub lookback_days: u32,
}

impl Default for RoasConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            gbdt: GbdtConfig::default(),
            ridge: RidgeConfig::default(),
            selection: SelectionConfig::default(),
            serving: ServingConfig::default(),
            model_dir: PathBuf::from("models"),
            lookback_days: 90,
        }
    }
}

impl RoasConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a different artifact directory.
    pub fn with_model_dir(mut self, model_dir: impl Into<PathBuf>) -> Self {
        self.model_dir = model_dir.into();
        self
    }

    /// Use a different lookback window.
    pub const fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    /// Check the sections that can be inconsistent.
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.gbdt.validate()?;

        let f = &self.features;
        let percentile = |p: f64| p > 0.0 && p <= 1.0;
        if !percentile(f.roas_percentile) || !percentile(f.feature_percentile) {
            return Err(RoasError::Config(format!(
                "percentiles must be in (0, 1], got {} and {}",
                f.roas_percentile, f.feature_percentile
            )));
        }
        if f.roas_cap <= 0.0 || self.ridge.clip_max <= 0.0 || self.serving.prediction_clip <= 0.0
        {
            return Err(RoasError::Config(
                "caps and clip bounds must be positive".to_string(),
            ));
        }
        if self.ridge.alpha < 0.0 {
            return Err(RoasError::Config(format!(
                "ridge alpha must be non-negative, got {}",
                self.ridge.alpha
            )));
        }
        if self.lookback_days == 0 {
            return Err(RoasError::Config("lookback_days must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RoasConfig::default();
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.selection.min_channel_rows, 30);
        assert_eq!(config.serving.prediction_clip, 100.0);
        assert_eq!(config.model_dir, PathBuf::from("models"));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "lookback_days": 60, "gbdt": {{ "n_estimators": 50 }}, "model_dir": "out" }}"#
        )
        .unwrap();

        let config = RoasConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.lookback_days, 60);
        assert_eq!(config.gbdt.n_estimators, 50);
        assert_eq!(config.gbdt.max_depth, GbdtConfig::default().max_depth);
        assert_eq!(config.model_dir, PathBuf::from("out"));
        assert_eq!(config.split, SplitConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = RoasConfig::default();
        config.split.train_ratio = 0.9;
        config.split.valid_ratio = 0.2;
        assert!(config.validate().is_err());

        let mut config = RoasConfig::default();
        config.features.roas_percentile = 1.5;
        assert!(matches!(config.validate(), Err(RoasError::Config(_))));

        assert!(
            RoasConfig::default()
                .with_lookback_days(0)
                .validate()
                .is_err()
        );
    }
}
