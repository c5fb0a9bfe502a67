//! Regression trees for the boosting ensemble.
//!
//! Trees are stored as a flat node vector with explicit child indices and
//! traversed with a deterministic `<=` comparison, so inference is identical
//! across runs and after a serialization round trip. Split search is exact
//! greedy over every feature with Newton gain (second-order boosting).

use serde::{Deserialize, Serialize};

/// One node of a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal split: go left when `feature value <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node carrying the output weight.
    Leaf { value: f64 },
}

/// A fitted regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Evaluate the tree on one feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes (internal + leaves).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Scale every leaf weight in place (used to fold in shrinkage).
    pub fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }
}

/// Hyperparameters for a single tree fit.
#[derive(Debug, Clone, Copy)]
pub struct SplitParams {
    /// Maximum tree depth (root = depth 0).
    pub max_depth: usize,
    /// L2 regularization on leaf weights.
    pub lambda: f64,
    /// Minimum gain required to keep a split.
    pub gamma: f64,
    /// Minimum hessian sum on each side of a split.
    pub min_child_weight: f64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            max_depth: crate::config::defaults::MAX_DEPTH,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

/// Fit one regression tree to per-row gradients and hessians.
///
/// `rows` is row-major sample data; `grad`/`hess` are the first and second
/// derivatives of the loss at the current model, one entry per row. Leaf
/// weights are the Newton step `-G / (H + lambda)`.
pub fn fit_tree(
    rows: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    params: &SplitParams,
) -> RegressionTree {
    let mut builder = TreeBuilder {
        rows,
        grad,
        hess,
        params,
        nodes: Vec::new(),
    };
    let all_indices: Vec<usize> = (0..rows.len()).collect();
    builder.build_node(&all_indices, 0);
    RegressionTree {
        nodes: builder.nodes,
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a SplitParams,
    nodes: Vec<Node>,
}

/// Candidate split produced by the greedy search.
struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    /// Recursively build the subtree for `indices`; returns the node id.
    fn build_node(&mut self, indices: &[usize], depth: usize) -> usize {
        let g_sum: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        if depth >= self.params.max_depth || indices.len() < 2 {
            return self.push_leaf(g_sum, h_sum);
        }

        let Some(split) = self.find_best_split(indices, g_sum, h_sum) else {
            return self.push_leaf(g_sum, h_sum);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][split.feature] <= split.threshold);

        // Degenerate partition can only happen with pathological thresholds;
        // fall back to a leaf rather than recursing forever.
        if left_idx.is_empty() || right_idx.is_empty() {
            return self.push_leaf(g_sum, h_sum);
        }

        // Reserve the split slot before recursing so node 0 stays the root.
        let node_id = self.nodes.len();
        self.nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });

        let left = self.build_node(&left_idx, depth + 1);
        let right = self.build_node(&right_idx, depth + 1);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn push_leaf(&mut self, g_sum: f64, h_sum: f64) -> usize {
        let value = -g_sum / (h_sum + self.params.lambda);
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Exact greedy split search over every feature.
    fn find_best_split(&self, indices: &[usize], g_sum: f64, h_sum: f64) -> Option<BestSplit> {
        let num_features = self.rows.first().map_or(0, Vec::len);
        let lambda = self.params.lambda;
        let parent_score = g_sum * g_sum / (h_sum + lambda);

        let mut best: Option<BestSplit> = None;

        for feature in 0..num_features {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                self.rows[a][feature]
                    .partial_cmp(&self.rows[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut g_left = 0.0;
            let mut h_left = 0.0;

            for w in 0..order.len() - 1 {
                let i = order[w];
                g_left += self.grad[i];
                h_left += self.hess[i];

                let value = self.rows[i][feature];
                let next_value = self.rows[order[w + 1]][feature];
                // No boundary between identical values
                if next_value <= value {
                    continue;
                }

                let g_right = g_sum - g_left;
                let h_right = h_sum - h_left;
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight
                {
                    continue;
                }

                let gain = 0.5
                    * (g_left * g_left / (h_left + lambda)
                        + g_right * g_right / (h_right + lambda)
                        - parent_score)
                    - self.params.gamma;

                if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}
