//! Ridge regression on a log target.
//!
//! ROAS is right-skewed, so the linear candidate is fitted on `log1p(roas)`
//! over standardized features and predictions are mapped back with `expm1`
//! and clipped to `[0, clip_max]`.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the linear candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeConfig {
    /// L2 regularization strength (default: 10)
    pub alpha: f64,
    /// Upper clip of back-transformed predictions (default: 200)
    pub clip_max: f64,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            alpha: 10.0,
            clip_max: 200.0,
        }
    }
}

/// Per-feature standardization fitted on training rows.
///
/// Uses the population standard deviation; constant features get a scale
/// of 1 so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit means and scales of every column.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    /// Number of features the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Column means.
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Column scales.
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Standardize every row of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    /// Standardize one row.
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        (&row - &self.mean) / &self.scale
    }
}

/// Ridge regression with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    alpha: f64,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl RidgeRegression {
    /// Solve `(Xc'Xc + alpha I) b = Xc'yc` on centered data.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: n_samples,
                actual: y.len(),
            });
        }
        if alpha < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "ridge alpha must be non-negative, got {alpha}"
            )));
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let y_mean = y.mean().unwrap_or(0.0);
        let x_c = x - &x_mean;
        let y_c = y - y_mean;

        let mut xtx = x_c.t().dot(&x_c);
        for i in 0..n_features {
            xtx[[i, i]] += alpha;
        }
        let xty = x_c.t().dot(&y_c);

        let coefficients = match cholesky_solve(&xtx, &xty) {
            Some(b) => b,
            None => gauss_solve(xtx, xty)
                .ok_or_else(|| ModelError::Singular("ridge normal equations".to_string()))?,
        };
        let intercept = y_mean - coefficients.dot(&x_mean);

        Ok(Self {
            alpha,
            coefficients,
            intercept,
        })
    }

    /// Linear predictions for every row.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    /// Linear prediction for one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        row.dot(&self.coefficients) + self.intercept
    }

    /// Fitted coefficients.
    pub const fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Fitted intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Regularization strength.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Solve `a x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L' x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gaussian elimination with partial pivoting.
fn gauss_solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();

    for col in 0..n {
        let pivot = (col..n).max_by(|&r, &s| a[[r, col]].abs().total_cmp(&a[[s, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for j in 0..n {
                a.swap([col, j], [pivot, j]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for j in col..n {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| a[[i, j]] * x[j]).sum();
        x[i] = (b[i] - sum) / a[[i, i]];
    }
    Some(x)
}

/// Ridge model on standardized features and a `log1p` target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    feature_names: Vec<String>,
    scaler: StandardScaler,
    ridge: RidgeRegression,
    clip_max: f64,
}

impl LinearModel {
    /// Fit scaler and ridge on training rows.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[&str],
        config: RidgeConfig,
    ) -> Result<Self> {
        if x.ncols() != feature_names.len() {
            return Err(ModelError::DimensionMismatch {
                expected: feature_names.len(),
                actual: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let scaler = StandardScaler::fit(x)?;
        let x_scaled = scaler.transform(x)?;
        let target = y.mapv(transform_target);
        let ridge = RidgeRegression::fit(&x_scaled, &target, config.alpha)?;

        debug!(
            rows = x.nrows(),
            features = x.ncols(),
            alpha = config.alpha,
            "Fitted ridge model"
        );

        Ok(Self {
            feature_names: feature_names.iter().map(|s| (*s).to_string()).collect(),
            scaler,
            ridge,
            clip_max: config.clip_max,
        })
    }

    /// Predict ROAS for every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_scaled = self.scaler.transform(x)?;
        Ok(self
            .ridge
            .predict(&x_scaled)
            .mapv(|z| inverse_target(z, self.clip_max)))
    }

    /// Predict ROAS for one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        if row.len() != self.scaler.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.scaler.n_features(),
                actual: row.len(),
            });
        }
        let scaled = self.scaler.transform_row(row);
        Ok(inverse_target(
            self.ridge.predict_row(scaled.view()),
            self.clip_max,
        ))
    }

    /// Features the model was fitted on, in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Fitted scaler.
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Fitted ridge regression.
    pub const fn ridge(&self) -> &RidgeRegression {
        &self.ridge
    }

    /// Upper clip of predictions.
    pub const fn clip_max(&self) -> f64 {
        self.clip_max
    }
}

/// Forward target transform, `log(1 + roas)`.
pub fn transform_target(roas: f64) -> f64 {
    roas.max(0.0).ln_1p()
}

/// Inverse target transform, `exp(z) - 1` clipped to `[0, clip_max]`.
pub fn inverse_target(z: f64, clip_max: f64) -> f64 {
    z.exp_m1().clamp(0.0, clip_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_scaler() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert_eq!(scaler.mean(), &array![2.0, 5.0]);
        assert_eq!(scaler.scale(), &array![1.0, 1.0]);

        let z = scaler.transform(&x).unwrap();
        assert_eq!(z, array![[-1.0, 0.0], [1.0, 0.0]]);
        assert_eq!(scaler.transform_row(x.row(1)), array![1.0, 0.0]);
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_ridge_recovers_coefficients() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| {
            if j == 0 { i as f64 } else { ((i * 3) % 7) as f64 }
        });
        let y: Array1<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] - r[1] + 4.0).collect();

        let ridge = RidgeRegression::fit(&x, &y, 0.0).unwrap();
        assert_relative_eq!(ridge.coefficients()[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(ridge.coefficients()[1], -1.0, epsilon = 1e-8);
        assert_relative_eq!(ridge.intercept(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ridge_shrinks() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 3.0 * v);
        let free = RidgeRegression::fit(&x, &y, 0.0).unwrap();
        let shrunk = RidgeRegression::fit(&x, &y, 1_000.0).unwrap();
        assert!(shrunk.coefficients()[0].abs() < free.coefficients()[0].abs());
    }

    #[test]
    fn test_gauss_fallback() {
        let a = array![[0.0, 1.0], [2.0, 0.0]];
        let x = gauss_solve(a, array![3.0, 4.0]).unwrap();
        assert_relative_eq!(x[0], 2.0);
        assert_relative_eq!(x[1], 3.0);
        assert!(gauss_solve(array![[1.0, 2.0], [2.0, 4.0]], array![1.0, 2.0]).is_none());
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.5)]
    #[case(42.0)]
    #[case(199.0)]
    fn test_target_round_trip(#[case] roas: f64) {
        let back = inverse_target(transform_target(roas), 200.0);
        assert_relative_eq!(back, roas, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_target_clips() {
        assert_eq!(inverse_target(transform_target(500.0), 200.0), 200.0);
        assert_eq!(inverse_target(-3.0, 200.0), 0.0);
    }

    #[test]
    fn test_linear_model() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| {
            if j == 0 { i as f64 } else { (i % 5) as f64 }
        });
        let y: Array1<f64> = x.column(0).mapv(|v| (0.05 * v).exp_m1());

        let model = LinearModel::fit(&x, &y, &["a", "b"], RidgeConfig::default()).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(preds.iter().all(|&p| (0.0..=200.0).contains(&p)));
        assert_relative_eq!(
            model.predict_row(x.row(10)).unwrap(),
            preds[10],
            epsilon = 1e-12
        );
        assert_eq!(model.feature_names(), ["a", "b"]);
        assert!(model.predict_row(array![1.0].view()).is_err());
    }
}
