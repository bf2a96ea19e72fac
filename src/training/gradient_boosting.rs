//! Gradient-boosted tree ensemble over both score targets
//!
//! Second-order boosting: each round grows one regression tree per target
//! on the gradient/hessian of squared error, with regularized leaf weights
//! w* = -G / (H + lambda), gain-based splits and row/column subsampling.

use crate::error::{Result, ScorecastError};
use crate::metrics::pooled_rmse;
use crate::training::config::BoostedConfig;
use crate::training::model::{FittedModel, IterativeModel};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_row(&self, sample: &ArrayView1<f64>) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict_row(sample)
                } else {
                    right.predict_row(sample)
                }
            }
        }
    }
}

/// A fitted boosted ensemble: per-target base scores plus, for each round,
/// one tree per target. A snapshot taken after round R contains exactly R
/// rounds of trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedEnsemble {
    learning_rate: f64,
    base_scores: Vec<f64>,
    rounds: Vec<Vec<TreeNode>>,
    n_features: usize,
}

impl GradientBoostedEnsemble {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(ScorecastError::DimensionMismatch {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let n = x.nrows();
        let k = self.base_scores.len();
        let mut preds = Array2::from_shape_fn((n, k), |(_, t)| self.base_scores[t]);

        for i in 0..n {
            let sample = x.row(i);
            for round in &self.rounds {
                for (t, tree) in round.iter().enumerate() {
                    preds[[i, t]] += self.learning_rate * tree.predict_row(&sample);
                }
            }
        }

        Ok(preds)
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn n_targets(&self) -> usize {
        self.base_scores.len()
    }

    /// Split-count importances, normalized to sum to 1 over all trees.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut counts = vec![0.0f64; self.n_features];
        for round in &self.rounds {
            for tree in round {
                count_splits(tree, &mut counts);
            }
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in counts.iter_mut() {
                *c /= total;
            }
        }
        Array1::from_vec(counts)
    }
}

fn count_splits(node: &TreeNode, counts: &mut [f64]) {
    if let TreeNode::Split {
        feature,
        left,
        right,
        ..
    } = node
    {
        if *feature < counts.len() {
            counts[*feature] += 1.0;
        }
        count_splits(left, counts);
        count_splits(right, counts);
    }
}

/// An in-progress boosting run over a fixed train/eval split.
///
/// Owns its copies of the data; nothing is shared with other trials.
pub struct BoostedSession {
    config: BoostedConfig,
    model: GradientBoostedEnsemble,
    train_x: Array2<f64>,
    train_y: Array2<f64>,
    eval_x: Array2<f64>,
    eval_y: Array2<f64>,
    train_preds: Array2<f64>,
    eval_preds: Array2<f64>,
    rng: Xoshiro256PlusPlus,
}

impl BoostedSession {
    pub fn new(
        config: BoostedConfig,
        train_x: Array2<f64>,
        train_y: Array2<f64>,
        eval_x: Array2<f64>,
        eval_y: Array2<f64>,
    ) -> Result<Self> {
        if train_x.nrows() != train_y.nrows() || eval_x.nrows() != eval_y.nrows() {
            return Err(ScorecastError::DimensionMismatch {
                expected: "matching feature/target row counts".to_string(),
                actual: format!(
                    "train {}x{} targets, eval {}x{} targets",
                    train_x.nrows(),
                    train_y.nrows(),
                    eval_x.nrows(),
                    eval_y.nrows()
                ),
            });
        }
        if train_x.ncols() != eval_x.ncols() {
            return Err(ScorecastError::DimensionMismatch {
                expected: format!("{} feature columns", train_x.ncols()),
                actual: format!("{} feature columns", eval_x.ncols()),
            });
        }

        let n_targets = train_y.ncols();
        let base_scores: Vec<f64> = (0..n_targets)
            .map(|t| {
                let col = train_y.column(t);
                col.sum() / col.len() as f64
            })
            .collect();

        let train_preds =
            Array2::from_shape_fn((train_y.nrows(), n_targets), |(_, t)| base_scores[t]);
        let eval_preds =
            Array2::from_shape_fn((eval_y.nrows(), n_targets), |(_, t)| base_scores[t]);

        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let model = GradientBoostedEnsemble {
            learning_rate: config.learning_rate,
            base_scores,
            rounds: Vec::new(),
            n_features: train_x.ncols(),
        };

        Ok(Self {
            config,
            model,
            train_x,
            train_y,
            eval_x,
            eval_y,
            train_preds,
            eval_preds,
            rng,
        })
    }
}

impl IterativeModel for BoostedSession {
    fn step(&mut self) -> Result<f64> {
        let n = self.train_x.nrows();
        let d = self.train_x.ncols();
        let k = self.train_y.ncols();

        let row_indices = subsample(&mut self.rng, n, self.config.subsample);
        let col_indices = subsample(&mut self.rng, d, self.config.colsample_bytree);

        let mut round_trees = Vec::with_capacity(k);
        for t in 0..k {
            // Squared error: grad = pred - y, hess = 1
            let grad: Array1<f64> = (0..n)
                .map(|i| self.train_preds[[i, t]] - self.train_y[[i, t]])
                .collect();
            let hess = Array1::from_elem(n, 1.0);

            let tree = build_tree(
                &self.train_x,
                &grad,
                &hess,
                &row_indices,
                &col_indices,
                0,
                &self.config,
            );

            for i in 0..n {
                let sample = self.train_x.row(i);
                self.train_preds[[i, t]] +=
                    self.config.learning_rate * tree.predict_row(&sample);
            }
            for i in 0..self.eval_x.nrows() {
                let sample = self.eval_x.row(i);
                self.eval_preds[[i, t]] +=
                    self.config.learning_rate * tree.predict_row(&sample);
            }

            round_trees.push(tree);
        }

        self.model.rounds.push(round_trees);
        Ok(pooled_rmse(&self.eval_y, &self.eval_preds))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.model.predict(x)
    }

    fn snapshot(&self) -> FittedModel {
        FittedModel::Boosted(self.model.clone())
    }

    fn round_budget(&self) -> usize {
        self.config.n_estimators
    }
}

/// Build one tree by exact greedy split finding over grad/hess sums.
fn build_tree(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature_indices: &[usize],
    depth: usize,
    config: &BoostedConfig,
) -> TreeNode {
    let g_sum: f64 = indices.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| hess[i]).sum();
    let leaf_weight = leaf_weight(g_sum, h_sum, config.reg_lambda, config.reg_alpha);

    if depth >= config.max_depth || indices.len() < 2 || h_sum < config.min_child_weight {
        return TreeNode::Leaf {
            weight: leaf_weight,
        };
    }

    // Each feature scans for its best split independently; equal gains
    // resolve to the lower feature index so results do not depend on
    // reduction order
    let best_split = feature_indices
        .par_iter()
        .filter_map(|&f| best_split_for_feature(x, grad, hess, indices, f, config))
        .max_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(&a.0))
        });

    match best_split {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature]] <= threshold);

            if left_idx.is_empty() || right_idx.is_empty() {
                return TreeNode::Leaf {
                    weight: leaf_weight,
                };
            }

            let left = build_tree(x, grad, hess, &left_idx, feature_indices, depth + 1, config);
            let right = build_tree(x, grad, hess, &right_idx, feature_indices, depth + 1, config);

            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => TreeNode::Leaf {
            weight: leaf_weight,
        },
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization.
fn leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    if alpha > 0.0 {
        let g_adj = if g_sum > alpha {
            g_sum - alpha
        } else if g_sum < -alpha {
            g_sum + alpha
        } else {
            return 0.0;
        };
        -g_adj / (h_sum + lambda)
    } else {
        -g_sum / (h_sum + lambda)
    }
}

fn best_split_for_feature(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    indices: &[usize],
    feature: usize,
    config: &BoostedConfig,
) -> Option<(usize, f64, f64)> {
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let g_total: f64 = sorted.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&i| hess[i]).sum();

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best_gain = f64::NEG_INFINITY;
    let mut best_threshold = 0.0;
    let lambda = config.reg_lambda;

    for (pos, &idx) in sorted.iter().enumerate() {
        g_left += grad[idx];
        h_left += hess[idx];

        // identical feature values cannot be separated
        if pos + 1 < sorted.len() {
            let next = sorted[pos + 1];
            if (x[[idx, feature]] - x[[next, feature]]).abs() < 1e-12 {
                continue;
            }
        } else {
            break;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;

        if h_left < config.min_child_weight || h_right < config.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda)
                + (g_right * g_right) / (h_right + lambda)
                - (g_total * g_total) / (h_total + lambda));

        if gain > best_gain {
            best_gain = gain;
            let next = sorted[pos + 1];
            best_threshold = (x[[idx, feature]] + x[[next, feature]]) / 2.0;
        }
    }

    if best_gain > f64::NEG_INFINITY {
        Some((feature, best_threshold, best_gain))
    } else {
        None
    }
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.max(1));
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_target_data(n: usize) -> (Array2<f64>, Array2<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(r, c)| (r as f64 * 0.1) + c as f64);
        let y = Array2::from_shape_fn((n, 2), |(r, t)| {
            let row = x.row(r);
            if t == 0 {
                row[0] * 2.0 + row[1]
            } else {
                row[2] - row[0] * 0.5
            }
        });
        (x, y)
    }

    fn session(n_estimators: usize) -> BoostedSession {
        let (x, y) = two_target_data(80);
        let train_x = x.slice(ndarray::s![..60, ..]).to_owned();
        let train_y = y.slice(ndarray::s![..60, ..]).to_owned();
        let eval_x = x.slice(ndarray::s![60.., ..]).to_owned();
        let eval_y = y.slice(ndarray::s![60.., ..]).to_owned();
        let config = BoostedConfig {
            n_estimators,
            max_depth: 3,
            learning_rate: 0.3,
            ..Default::default()
        };
        BoostedSession::new(config, train_x, train_y, eval_x, eval_y).unwrap()
    }

    #[test]
    fn test_loss_decreases_over_rounds() {
        let mut session = session(30);
        let first = session.step().unwrap();
        let mut last = first;
        for _ in 0..29 {
            last = session.step().unwrap();
        }
        assert!(
            last < first,
            "eval loss should drop: first {} last {}",
            first,
            last
        );
    }

    #[test]
    fn test_snapshot_tracks_rounds() {
        let mut session = session(10);
        session.step().unwrap();
        session.step().unwrap();
        session.step().unwrap();

        if let FittedModel::Boosted(model) = session.snapshot() {
            assert_eq!(model.n_rounds(), 3);
            assert_eq!(model.n_targets(), 2);
        } else {
            panic!("expected a boosted snapshot");
        }
    }

    #[test]
    fn test_snapshot_predicts_like_session() {
        let mut session = session(10);
        for _ in 0..5 {
            session.step().unwrap();
        }
        let (x, _) = two_target_data(8);
        let from_session = session.predict(&x).unwrap();
        let from_snapshot = session.snapshot().predict(&x).unwrap();
        for (a, b) in from_session.iter().zip(from_snapshot.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let mut session = session(5);
        session.step().unwrap();
        let bad = Array2::zeros((4, 7));
        assert!(matches!(
            session.predict(&bad),
            Err(ScorecastError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_trees() {
        let mut a = session(8);
        let mut b = session(8);
        for _ in 0..8 {
            a.step().unwrap();
            b.step().unwrap();
        }
        let (x, _) = two_target_data(10);
        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let mut session = session(10);
        for _ in 0..10 {
            session.step().unwrap();
        }
        if let FittedModel::Boosted(model) = session.snapshot() {
            let imp = model.feature_importances();
            assert_eq!(imp.len(), 3);
            let sum: f64 = imp.sum();
            assert!((sum - 1.0).abs() < 1e-9, "importances sum {}", sum);
        }
    }
}
