//! Trained Model
//!
//! The three candidate kinds behind one prediction interface. A channel has
//! at most one trained model at a time; retraining replaces it.

use crate::baseline::BaselineTable;
use crate::error::Result;
use crate::gbdt::GbdtModel;
use crate::linear::LinearModel;
use derive_more::Display;
use ndarray::Array1;
use roas_features::{Dataset, FeatureVector};
use serde::{Deserialize, Serialize};

/// Candidate model kinds, in selection tie-break order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Gradient-boosted trees
    #[display("gradient_boosted")]
    GradientBoosted,
    /// Ridge regression on a log target
    #[display("linear")]
    Linear,
    /// Historical mean ROAS
    #[display("baseline")]
    Baseline,
}

impl ModelKind {
    /// Returns all kinds in tie-break order.
    pub const fn all() -> [Self; 3] {
        [Self::GradientBoosted, Self::Linear, Self::Baseline]
    }

    /// Identifier used in reports and metadata.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GradientBoosted => "gradient_boosted",
            Self::Linear => "linear",
            Self::Baseline => "baseline",
        }
    }

    /// Human readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GradientBoosted => "Gradient Boosting",
            Self::Linear => "Ridge (log target)",
            Self::Baseline => "Historical Baseline",
        }
    }

    /// Whether the kind is fitted on features, as opposed to the baseline.
    pub const fn is_learned(&self) -> bool {
        !matches!(self, Self::Baseline)
    }
}

/// A fitted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum TrainedModel {
    /// Gradient-boosted trees
    GradientBoosted(GbdtModel),
    /// Ridge regression with its scaler
    Linear(LinearModel),
    /// Historical means
    Baseline(BaselineTable),
}

impl TrainedModel {
    /// Kind of the model.
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::GradientBoosted(_) => ModelKind::GradientBoosted,
            Self::Linear(_) => ModelKind::Linear,
            Self::Baseline(_) => ModelKind::Baseline,
        }
    }

    /// Input features in column order; empty for the baseline.
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::GradientBoosted(m) => m.feature_names(),
            Self::Linear(m) => m.feature_names(),
            Self::Baseline(_) => &[],
        }
    }

    /// Predict ROAS for every row of a dataset.
    pub fn predict(&self, dataset: &Dataset) -> Result<Array1<f64>> {
        match self {
            Self::Baseline(table) => table.predict_dataset(dataset),
            Self::GradientBoosted(m) => m.predict(&dataset.feature_matrix(&self.feature_refs())?),
            Self::Linear(m) => m.predict(&dataset.feature_matrix(&self.feature_refs())?),
        }
    }

    /// Predict ROAS for a single request.
    pub fn predict_one(
        &self,
        campaign_id: &str,
        channel: &str,
        features: &FeatureVector,
    ) -> Result<f64> {
        match self {
            Self::Baseline(table) => Ok(table.predict(campaign_id, channel).0),
            Self::GradientBoosted(m) => {
                let row = Array1::from(features.select(&self.feature_refs())?);
                Ok(m.predict_row(row.view()))
            }
            Self::Linear(m) => {
                let row = Array1::from(features.select(&self.feature_refs())?);
                m.predict_row(row.view())
            }
        }
    }

    fn feature_refs(&self) -> Vec<&str> {
        self.feature_names().iter().map(String::as_str).collect()
    }
}

impl From<GbdtModel> for TrainedModel {
    fn from(model: GbdtModel) -> Self {
        Self::GradientBoosted(model)
    }
}

impl From<LinearModel> for TrainedModel {
    fn from(model: LinearModel) -> Self {
        Self::Linear(model)
    }
}

impl From<BaselineTable> for TrainedModel {
    fn from(table: BaselineTable) -> Self {
        Self::Baseline(table)
    }
}
