//! Multinomial log-loss boosting.
//!
//! Each round snapshots the softmax probabilities, derives per-class
//! gradients (`p - y`) and hessians (`p * (1 - p)`), and fits one regression
//! tree per class. Shrinkage is folded into the leaf weights, so inference
//! is a plain sum over trees. There is no row or feature sampling, which
//! makes training fully deterministic for a fixed input.

use tracing::{debug, info};

use super::tree::{fit_tree, RegressionTree, SplitParams};
use crate::config::defaults;

/// Floor on the hessian to keep Newton steps bounded near p ∈ {0, 1}.
const HESSIAN_FLOOR: f64 = 1e-6;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    /// Number of boosting rounds (trees per class).
    pub rounds: usize,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    /// Per-tree split parameters.
    pub split: SplitParams,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            rounds: defaults::BOOSTING_ROUNDS,
            learning_rate: defaults::LEARNING_RATE,
            split: SplitParams::default(),
        }
    }
}

/// Fit the boosted ensemble: `rounds × num_classes` trees.
///
/// `class_ids` holds the encoded label for each row and must be < `num_classes`.
/// Returns trees indexed `[round][class]`, leaf weights already scaled by the
/// learning rate.
pub fn fit_ensemble(
    rows: &[Vec<f64>],
    class_ids: &[usize],
    num_classes: usize,
    params: &TrainingParams,
) -> Vec<Vec<RegressionTree>> {
    let n = rows.len();
    let mut scores = vec![vec![0.0f64; num_classes]; n];
    let mut ensemble: Vec<Vec<RegressionTree>> = Vec::with_capacity(params.rounds);

    for round in 0..params.rounds {
        // Probability snapshot for this round; all class trees share it.
        let probs: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();

        let mut round_trees: Vec<RegressionTree> = Vec::with_capacity(num_classes);
        for class in 0..num_classes {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for (i, p_row) in probs.iter().enumerate() {
                let p = p_row[class];
                let y = if class_ids[i] == class { 1.0 } else { 0.0 };
                grad.push(p - y);
                hess.push((p * (1.0 - p)).max(HESSIAN_FLOOR));
            }

            let mut tree = fit_tree(rows, &grad, &hess, &params.split);
            tree.scale_leaves(params.learning_rate);
            round_trees.push(tree);
        }

        for (i, row) in rows.iter().enumerate() {
            for (class, tree) in round_trees.iter().enumerate() {
                scores[i][class] += tree.predict(row);
            }
        }
        ensemble.push(round_trees);

        if (round + 1) % 10 == 0 || round + 1 == params.rounds {
            let loss = log_loss(&scores, class_ids);
            debug!(round = round + 1, loss, "Boosting round complete");
        }
    }

    info!(
        rounds = params.rounds,
        classes = num_classes,
        rows = n,
        "Ensemble training complete"
    );
    ensemble
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Mean multinomial log loss over the current scores.
fn log_loss(scores: &[Vec<f64>], class_ids: &[usize]) -> f64 {
    let total: f64 = scores
        .iter()
        .zip(class_ids.iter())
        .map(|(s, &y)| {
            let p = softmax(s)[y].max(1e-15);
            -p.ln()
        })
        .sum();
    total / scores.len().max(1) as f64
}

/// Top-1 accuracy of an ensemble on held-out rows, as a fraction in [0, 1].
pub fn accuracy(
    ensemble: &[Vec<RegressionTree>],
    rows: &[Vec<f64>],
    class_ids: &[usize],
) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows
        .iter()
        .zip(class_ids.iter())
        .filter(|(row, y)| predict_class(ensemble, row) == **y)
        .count();
    correct as f64 / rows.len() as f64
}

/// Argmax class for one row under an ensemble.
pub fn predict_class(ensemble: &[Vec<RegressionTree>], row: &[f64]) -> usize {
    let scores = raw_scores(ensemble, row);
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(idx, _)| idx)
}

/// Per-class score sums for one row.
pub fn raw_scores(ensemble: &[Vec<RegressionTree>], row: &[f64]) -> Vec<f64> {
    let num_classes = ensemble.first().map_or(0, Vec::len);
    let mut scores = vec![0.0f64; num_classes];
    for round in ensemble {
        for (class, tree) in round.iter().enumerate() {
            scores[class] += tree.predict(row);
        }
    }
    scores
}
