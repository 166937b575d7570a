//! Gradient-boosted regression trees with second-order approximation
//!
//! Squared-error boosting in the XGBoost formulation:
//! - leaf weights `w* = -G / (H + lambda)` with L1 soft-thresholding of `G`
//! - split gain `0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)]`,
//!   accepted only above `gamma`
//! - children must keep a hessian sum of at least `min_child_weight`
//! - every round fits on a row subsample using a column subsample
//!
//! The defaults are shallow, slow-learning and heavily regularized, suited
//! to the few hundred rows a single channel provides.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gradient boosting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    /// Boosting rounds (default: 500)
    pub n_estimators: usize,
    /// Shrinkage applied to every tree (default: 0.03)
    pub learning_rate: f64,
    /// Maximum tree depth (default: 3)
    pub max_depth: usize,
    /// Minimum hessian sum per child (default: 5)
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights (default: 2)
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights (default: 1)
    pub reg_alpha: f64,
    /// Minimum gain to make a split (default: 0.5)
    pub gamma: f64,
    /// Row share sampled per round (default: 0.7)
    pub subsample: f64,
    /// Column share sampled per tree (default: 0.7)
    pub colsample_bytree: f64,
    /// Random seed (default: 42)
    pub seed: u64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.03,
            max_depth: 3,
            min_child_weight: 5.0,
            reg_lambda: 2.0,
            reg_alpha: 1.0,
            gamma: 0.5,
            subsample: 0.7,
            colsample_bytree: 0.7,
            seed: 42,
        }
    }
}

impl GbdtConfig {
    /// Check subsample ratios and regularization strengths.
    pub fn validate(&self) -> Result<()> {
        let share = |v: f64| v > 0.0 && v <= 1.0;
        if !share(self.subsample) || !share(self.colsample_bytree) {
            return Err(ModelError::InvalidParameter(format!(
                "subsample ratios must be in (0, 1], got {} and {}",
                self.subsample, self.colsample_bytree
            )));
        }
        if self.learning_rate <= 0.0 || self.reg_lambda < 0.0 || self.reg_alpha < 0.0 {
            return Err(ModelError::InvalidParameter(
                "learning rate must be positive and regularization non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Terminal node
    Leaf {
        /// Output added to the prediction, before shrinkage
        weight: f64,
    },
    /// Internal node sending `x[feature] <= threshold` left
    Split {
        /// Feature column index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Loss reduction of the split
        gain: f64,
        /// Subtree for values at or below the threshold
        left: Box<TreeNode>,
        /// Subtree for values above the threshold
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Leaf weight reached by `row`.
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::Leaf { weight } => *weight,
            Self::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    /// Depth of the subtree; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn accumulate_gain(&self, gains: &mut [f64], splits: &mut [usize]) {
        if let Self::Split {
            feature,
            gain,
            left,
            right,
            ..
        } = self
        {
            if let (Some(total), Some(count)) =
                (gains.get_mut(*feature), splits.get_mut(*feature))
            {
                *total += gain;
                *count += 1;
            }
            left.accumulate_gain(gains, splits);
            right.accumulate_gain(gains, splits);
        }
    }
}

/// Best split found for one feature.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Inputs shared by every node of one tree.
struct TreeGrower<'a> {
    x: &'a Array2<f64>,
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
    features: &'a [usize],
    config: &'a GbdtConfig,
}

impl TreeGrower<'_> {
    fn grow(&self, rows: &[usize], depth: usize) -> TreeNode {
        let g_sum: f64 = rows.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = rows.iter().map(|&i| self.hess[i]).sum();
        let weight = leaf_weight(g_sum, h_sum, self.config.reg_lambda, self.config.reg_alpha);

        if depth >= self.config.max_depth
            || rows.len() < 2
            || h_sum < 2.0 * self.config.min_child_weight
        {
            return TreeNode::Leaf { weight };
        }

        let best = self
            .features
            .par_iter()
            .filter_map(|&feature| self.best_split(rows, feature, g_sum, h_sum))
            .max_by(|a, b| a.gain.total_cmp(&b.gain));

        let Some(split) = best.filter(|s| s.gain > self.config.gamma) else {
            return TreeNode::Leaf { weight };
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return TreeNode::Leaf { weight };
        }

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            gain: split.gain,
            left: Box::new(self.grow(&left_rows, depth + 1)),
            right: Box::new(self.grow(&right_rows, depth + 1)),
        }
    }

    /// Exact greedy scan over the sorted values of one feature.
    fn best_split(
        &self,
        rows: &[usize],
        feature: usize,
        g_total: f64,
        h_total: f64,
    ) -> Option<SplitCandidate> {
        let x = self.x;
        let lambda = self.config.reg_lambda;
        let min_child = self.config.min_child_weight;

        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let parent_score = g_total * g_total / (h_total + lambda);
        let mut g_left = 0.0;
        let mut h_left = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pair in sorted.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            g_left += self.grad[current];
            h_left += self.hess[current];

            let value = x[[current, feature]];
            let next_value = x[[next, feature]];
            if next_value - value <= f64::EPSILON * value.abs().max(1.0) {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < min_child || h_right < min_child {
                continue;
            }

            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                    - parent_score);

            if best.is_none_or(|b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next_value) / 2.0,
                    gain,
                });
            }
        }

        best
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization.
fn leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    let g = if g_sum > alpha {
        g_sum - alpha
    } else if g_sum < -alpha {
        g_sum + alpha
    } else {
        return 0.0;
    };
    -g / (h_sum + lambda)
}

/// Sorted random sample of `ceil(n * ratio)` indices out of `0..n`.
fn subsample(rng: &mut StdRng, n: usize, ratio: f64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if ratio >= 1.0 {
        return indices;
    }
    let k = ((n as f64 * ratio).ceil() as usize).clamp(1, n);
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

fn rmse(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let n = actual.len().max(1) as f64;
    ((actual - predicted).mapv(|r| r * r).sum() / n).sqrt()
}

/// Fitted gradient-boosted regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    config: GbdtConfig,
    base_score: f64,
    trees: Vec<TreeNode>,
    feature_names: Vec<String>,
    importances: Vec<f64>,
    eval_history: Vec<f64>,
    best_iteration: Option<usize>,
}

impl GbdtModel {
    /// Fit on `x` (rows x features) and target `y`.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[&str],
        config: GbdtConfig,
    ) -> Result<Self> {
        Self::fit_with_validation(x, y, None, feature_names, config)
    }

    /// Fit while recording the validation RMSE after every round.
    ///
    /// The validation split is monitored only; every round is kept.
    pub fn fit_with_validation(
        x: &Array2<f64>,
        y: &Array1<f64>,
        valid: Option<(&Array2<f64>, &Array1<f64>)>,
        feature_names: &[&str],
        config: GbdtConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (n_samples, n_features) = x.dim();
        check_shape(x, y, feature_names.len())?;
        if n_samples == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if let Some((vx, vy)) = valid {
            check_shape(vx, vy, n_features)?;
        }

        let base_score = y.mean().unwrap_or(0.0);
        let mut preds = Array1::from_elem(n_samples, base_score);
        let mut valid_preds = valid.map(|(vx, _)| Array1::from_elem(vx.nrows(), base_score));
        let hess = Array1::from_elem(n_samples, 1.0);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut eval_history = Vec::new();

        for _ in 0..config.n_estimators {
            let grad: Array1<f64> = &preds - y;
            let rows = subsample(&mut rng, n_samples, config.subsample);
            let features = subsample(&mut rng, n_features, config.colsample_bytree);

            let tree = TreeGrower {
                x,
                grad: &grad,
                hess: &hess,
                features: &features,
                config: &config,
            }
            .grow(&rows, 0);

            for (i, row) in x.rows().into_iter().enumerate() {
                preds[i] += config.learning_rate * tree.predict(row);
            }
            if let (Some((vx, vy)), Some(vp)) = (valid, valid_preds.as_mut()) {
                for (i, row) in vx.rows().into_iter().enumerate() {
                    vp[i] += config.learning_rate * tree.predict(row);
                }
                eval_history.push(rmse(vy, vp));
            }

            trees.push(tree);
        }

        let best_iteration = eval_history
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i + 1);

        let importances = gain_importances(&trees, n_features);

        debug!(
            rounds = trees.len(),
            rows = n_samples,
            features = n_features,
            ?best_iteration,
            train_rmse = rmse(y, &preds),
            "Fitted gradient-boosted model"
        );

        Ok(Self {
            config,
            base_score,
            trees,
            feature_names: feature_names.iter().map(|s| (*s).to_string()).collect(),
            importances,
            eval_history,
            best_iteration,
        })
    }

    /// Predict one feature row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score
            + self.config.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.feature_names.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.feature_names.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    /// Features the model was fitted on, in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[TreeNode] {
        &self.trees
    }

    /// Mean of the training target.
    pub const fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Training configuration.
    pub const fn config(&self) -> &GbdtConfig {
        &self.config
    }

    /// Validation RMSE after each round; empty without a validation split.
    pub fn eval_history(&self) -> &[f64] {
        &self.eval_history
    }

    /// Round count with the lowest validation RMSE.
    pub const fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    /// Mean split gain per feature, normalized to sum to 1, descending.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// The `k` most important features.
    pub fn top_features(&self, k: usize) -> Vec<(String, f64)> {
        let mut ranked = self.feature_importance();
        ranked.truncate(k);
        ranked
    }
}

/// Mean gain per split of each feature, normalized to sum to 1.
///
/// Unused features score 0.
fn gain_importances(trees: &[TreeNode], n_features: usize) -> Vec<f64> {
    let mut gains = vec![0.0; n_features];
    let mut splits = vec![0_usize; n_features];
    for tree in trees {
        tree.accumulate_gain(&mut gains, &mut splits);
    }

    let mut importances: Vec<f64> = gains
        .iter()
        .zip(&splits)
        .map(|(&gain, &count)| if count > 0 { gain / count as f64 } else { 0.0 })
        .collect();
    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    }
    importances
}

fn check_shape(x: &Array2<f64>, y: &Array1<f64>, n_features: usize) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if x.ncols() != n_features {
        return Err(ModelError::DimensionMismatch {
            expected: n_features,
            actual: x.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// y = 3 * x0 + noise-free step on x1; x2 is irrelevant.
    fn regression_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
            0 => i as f64 / n as f64,
            1 => ((i * 7) % 11) as f64,
            _ => ((i * 13) % 5) as f64,
        });
        let y = x
            .rows()
            .into_iter()
            .map(|r| 3.0 * r[0] + if r[1] > 5.0 { 2.0 } else { 0.0 })
            .collect();
        (x, y)
    }

    fn quick_config() -> GbdtConfig {
        GbdtConfig {
            n_estimators: 150,
            learning_rate: 0.1,
            reg_alpha: 0.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_leaf_weight() {
        assert_relative_eq!(leaf_weight(-10.0, 8.0, 2.0, 0.0), 1.0);
        assert_relative_eq!(leaf_weight(-10.0, 8.0, 2.0, 1.0), 0.9);
        assert_eq!(leaf_weight(0.5, 8.0, 2.0, 1.0), 0.0);
    }

    #[test]
    fn test_subsample() {
        let mut rng = StdRng::seed_from_u64(1);
        let rows = subsample(&mut rng, 10, 0.7);
        assert_eq!(rows.len(), 7);
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(subsample(&mut rng, 4, 1.0), vec![0, 1, 2, 3]);
        assert_eq!(subsample(&mut rng, 1, 0.1).len(), 1);
    }

    #[test]
    fn test_fits_signal() {
        let (x, y) = regression_data(200);
        let model = GbdtModel::fit(&x, &y, &["a", "b", "c"], quick_config()).unwrap();
        let preds = model.predict(&x).unwrap();
        let err = rmse(&y, &preds);
        let spread = y.std(0.0);
        assert!(err < 0.25 * spread, "rmse {err} vs std {spread}");
        assert!(model.trees().iter().all(|t| t.depth() <= 3));
    }

    #[test]
    fn test_importance_ranks_signal_features() {
        let (x, y) = regression_data(200);
        let model = GbdtModel::fit(&x, &y, &["a", "b", "c"], quick_config()).unwrap();
        let ranked = model.feature_importance();
        assert_relative_eq!(ranked.iter().map(|(_, v)| v).sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_eq!(ranked.last().unwrap().0, "c");
        assert_eq!(model.top_features(2).len(), 2);
    }

    #[test]
    fn test_importance_is_mean_gain_per_split() {
        let leaf = || Box::new(TreeNode::Leaf { weight: 0.0 });
        let split = |feature, gain, left, right| TreeNode::Split {
            feature,
            threshold: 0.0,
            gain,
            left,
            right,
        };
        // Feature 0 splits twice for 6 in total, feature 1 once for 6.
        let trees = vec![
            split(0, 4.0, Box::new(split(0, 2.0, leaf(), leaf())), leaf()),
            split(1, 6.0, leaf(), leaf()),
        ];

        let importances = gain_importances(&trees, 3);
        assert_relative_eq!(importances[0], 1.0 / 3.0);
        assert_relative_eq!(importances[1], 2.0 / 3.0);
        assert_eq!(importances[2], 0.0);
        assert_eq!(gain_importances(&[TreeNode::Leaf { weight: 1.0 }], 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_validation_history() {
        let (x, y) = regression_data(120);
        let (vx, vy) = regression_data(40);
        let model = GbdtModel::fit_with_validation(
            &x,
            &y,
            Some((&vx, &vy)),
            &["a", "b", "c"],
            GbdtConfig {
                n_estimators: 30,
                ..quick_config()
            },
        )
        .unwrap();
        assert_eq!(model.eval_history().len(), 30);
        assert_eq!(model.trees().len(), 30);
        let best = model.best_iteration().unwrap();
        assert!((1..=30).contains(&best));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = regression_data(80);
        let a = GbdtModel::fit(&x, &y, &["a", "b", "c"], quick_config()).unwrap();
        let b = GbdtModel::fit(&x, &y, &["a", "b", "c"], quick_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_target_predicts_mean() {
        let (x, _) = regression_data(50);
        let y = Array1::from_elem(50, 4.0);
        let model = GbdtModel::fit(&x, &y, &["a", "b", "c"], GbdtConfig::default()).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(preds.iter().all(|&p| (p - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_shape_errors() {
        let (x, y) = regression_data(10);
        assert!(GbdtModel::fit(&x, &y, &["a", "b"], quick_config()).is_err());

        let model = GbdtModel::fit(&x, &y, &["a", "b", "c"], quick_config()).unwrap();
        assert!(model.predict(&Array2::zeros((2, 2))).is_err());

        let bad = GbdtConfig {
            subsample: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            GbdtModel::fit(&x, &y, &["a", "b", "c"], bad),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
