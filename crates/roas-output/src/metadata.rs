//! Per-channel model metadata.
//!
//! A metadata record is written for every trained channel, whichever
//! candidate wins, so serving can describe the model it answers with.

use chrono::{DateTime, Utc};
use roas_data::Channel;
use roas_model::{Metrics, ModelKind, improvement_pct};
use serde::{Deserialize, Serialize};

/// Row counts of the temporal split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    /// Training rows
    pub train: usize,
    /// Validation rows
    pub valid: usize,
    /// Test rows
    pub test: usize,
}

impl SplitCounts {
    /// Rows across the three windows.
    pub const fn total(&self) -> usize {
        self.train + self.valid + self.test
    }
}

impl From<(usize, usize, usize)> for SplitCounts {
    fn from((train, valid, test): (usize, usize, usize)) -> Self {
        Self { train, valid, test }
    }
}

/// Test-split metrics of the three candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    /// Gradient-boosted trees
    pub gradient_boosted: Metrics,
    /// Ridge regression
    pub linear: Metrics,
    /// Historical baseline
    pub baseline: Metrics,
}

impl CandidateMetrics {
    /// Metrics of one candidate.
    pub const fn get(&self, kind: ModelKind) -> &Metrics {
        match kind {
            ModelKind::GradientBoosted => &self.gradient_boosted,
            ModelKind::Linear => &self.linear,
            ModelKind::Baseline => &self.baseline,
        }
    }

    /// RMSE improvement of a candidate over the baseline, in percent.
    pub fn improvement(&self, kind: ModelKind) -> f64 {
        improvement_pct(self.baseline.rmse, self.get(kind).rmse)
    }
}

/// Normalized split gain of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub feature: String,
    /// Share of total gain
    pub importance: f64,
}

impl From<(String, f64)> for FeatureImportance {
    fn from((feature, importance): (String, f64)) -> Self {
        Self {
            feature,
            importance,
        }
    }
}

/// What was trained for a channel and how well it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Channel the model serves
    pub channel: Channel,
    /// Winning candidate
    pub model_kind: ModelKind,
    /// Model artifact, absent when the baseline won
    pub model_path: Option<String>,
    /// Model input features in column order
    pub features: Vec<String>,
    /// Split sizes
    pub splits: SplitCounts,
    /// Test metrics of every candidate
    pub metrics: CandidateMetrics,
    /// Winner's RMSE improvement over the baseline, in percent
    pub improvement_pct: f64,
    /// Top feature importances, only for a gradient-boosted winner
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
    /// When training finished
    pub trained_at: DateTime<Utc>,
}

impl ModelMetadata {
    /// Record a winner, computing its improvement from the candidate metrics.
    ///
    /// Importances are kept only for a gradient-boosted winner.
    pub fn new(
        channel: Channel,
        model_kind: ModelKind,
        features: Vec<String>,
        splits: SplitCounts,
        metrics: CandidateMetrics,
        importances: Vec<(String, f64)>,
    ) -> Self {
        let feature_importance = if model_kind == ModelKind::GradientBoosted {
            importances.into_iter().map(FeatureImportance::from).collect()
        } else {
            Vec::new()
        };

        Self {
            channel,
            model_kind,
            model_path: None,
            features,
            splits,
            improvement_pct: metrics.improvement(model_kind),
            metrics,
            feature_importance,
            trained_at: Utc::now(),
        }
    }

    /// Attach the artifact path the model was saved under.
    pub fn with_model_path(mut self, path: Option<String>) -> Self {
        self.model_path = path;
        self
    }

    /// Test metrics of the winner.
    pub const fn best_metrics(&self) -> &Metrics {
        self.metrics.get(self.model_kind)
    }

    /// One-line performance summary, e.g. `R² 0.684, +24.1% vs baseline`.
    pub fn model_performance(&self) -> String {
        let r2 = self.best_metrics().r2;
        if self.model_kind.is_learned() {
            format!("R² {r2:.3}, {:+.1}% vs baseline", self.improvement_pct)
        } else {
            format!("R² {r2:.3}")
        }
    }
}
