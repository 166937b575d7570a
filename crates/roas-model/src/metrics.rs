//! Evaluation metrics.

use crate::error::{ModelError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error metrics of one model on one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl Metrics {
    /// Score predictions against actual ROAS.
    ///
    /// Predictions are clipped at zero first, since a negative ROAS forecast
    /// is never acted upon. A constant target gives R² of 1 for a perfect
    /// fit and 0 otherwise.
    pub fn evaluate(actual: &Array1<f64>, predicted: &Array1<f64>) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ModelError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let n = actual.len() as f64;
        let predicted = predicted.mapv(|p| p.max(0.0));
        let residuals = actual - &predicted;

        let ss_res = residuals.mapv(|r| r * r).sum();
        let mean = actual.sum() / n;
        let ss_tot = actual.mapv(|y| (y - mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            rmse: (ss_res / n).sqrt(),
            mae: residuals.mapv(f64::abs).sum() / n,
            r2,
        })
    }

    /// Relative RMSE improvement over a baseline, in percent.
    pub fn improvement_over(&self, baseline: &Self) -> f64 {
        improvement_pct(baseline.rmse, self.rmse)
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE {:.4}, MAE {:.4}, R² {:.4}",
            self.rmse, self.mae, self.r2
        )
    }
}

/// `(baseline_rmse - model_rmse) / baseline_rmse` as a percentage.
///
/// A perfect baseline leaves no room for improvement and yields 0.
pub fn improvement_pct(baseline_rmse: f64, model_rmse: f64) -> f64 {
    if baseline_rmse > 0.0 {
        (baseline_rmse - model_rmse) / baseline_rmse * 100.0
    } else {
        0.0
    }
}
