//! Gradient-boosted decision-tree classifier for fault prediction.
//!
//! A small, deterministic boosting engine:
//! - [`tree`]: flat-node regression trees with exact greedy Newton splits
//! - [`training`]: multinomial log-loss boosting over the tree learner
//! - [`model`]: the versioned on-disk artifact and inference wrapper

pub mod model;
pub mod training;
pub mod tree;

pub use model::{FaultClassifier, ModelArtifact, ModelError, Prediction};
pub use training::{accuracy, fit_ensemble, TrainingParams};
pub use tree::{RegressionTree, SplitParams};
