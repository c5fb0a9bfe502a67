//! The serialized fault-classifier artifact and its inference wrapper.
//!
//! The artifact is a versioned JSON document carrying the trees, the label
//! encoder's fitted order, the feature layout, and training provenance. It
//! is written atomically (temp file + rename) and validated on load, so a
//! service never runs against a model whose feature layout it cannot feed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::training::{raw_scores, softmax};
use super::tree::RegressionTree;
use crate::types::{LabelEncoder, FEATURE_NAMES, NUM_FEATURES};

/// Current artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Errors from artifact persistence and validation.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported artifact version {found} (expected {ARTIFACT_VERSION})")]
    Version { found: u32 },
    #[error("feature layout mismatch: artifact has {got:?}")]
    FeatureMismatch { got: Vec<String> },
    #[error("artifact has no trees")]
    EmptyEnsemble,
    #[error("no label for class index {0}")]
    LabelDecode(usize),
}

/// Training provenance stored alongside the trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// RFC 3339 timestamp of when training finished.
    pub trained_at: String,
    /// Rows in the training split.
    pub training_rows: usize,
    /// Top-1 accuracy on the held-out split, as a fraction.
    pub test_accuracy: f64,
    /// Boosting rounds.
    pub rounds: usize,
    /// Learning rate (already folded into leaf weights).
    pub learning_rate: f64,
    /// Maximum tree depth.
    pub max_depth: usize,
}

/// On-disk model document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Feature order the trees were trained against.
    pub feature_names: Vec<String>,
    /// Label order from the trainer's encoder (index = class id).
    pub labels: Vec<String>,
    /// Trees indexed `[round][class]`, shrinkage folded in.
    pub trees: Vec<Vec<RegressionTree>>,
    /// Training provenance.
    pub metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Assemble an artifact from a fitted ensemble.
    pub fn new(
        trees: Vec<Vec<RegressionTree>>,
        encoder: &LabelEncoder,
        metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            labels: encoder.labels().to_vec(),
            trees,
            metadata,
        }
    }

    /// Save to disk atomically (write temp file, then rename).
    pub fn save_to_disk(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_vec(self)?;

        let tmp_path = path.with_extension("json.tmp");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), "Saved model artifact");
        Ok(())
    }

    /// Load an artifact from disk without validation.
    pub fn load_from_disk(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Helper for timestamping artifacts at training time.
pub fn metadata_now(
    training_rows: usize,
    test_accuracy: f64,
    rounds: usize,
    learning_rate: f64,
    max_depth: usize,
) -> ArtifactMetadata {
    ArtifactMetadata {
        trained_at: Utc::now().to_rfc3339(),
        training_rows,
        test_accuracy,
        rounds,
        learning_rate,
        max_depth,
    }
}

/// One prediction: decoded label and the full probability row.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Decoded class label.
    pub label: String,
    /// Probability of the predicted class (the row maximum).
    pub confidence: f64,
    /// Per-class probabilities in encoder order.
    pub probabilities: Vec<f64>,
}

/// Validated, ready-to-serve classifier.
#[derive(Debug, Clone)]
pub struct FaultClassifier {
    trees: Vec<Vec<RegressionTree>>,
    encoder: LabelEncoder,
}

impl FaultClassifier {
    /// Validate an artifact and wrap it for inference.
    ///
    /// Rejects unknown versions and any feature layout other than
    /// [`FEATURE_NAMES`]; the service assembles inputs in exactly that
    /// order, so a mismatched artifact would silently scramble features.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.version != ARTIFACT_VERSION {
            return Err(ModelError::Version {
                found: artifact.version,
            });
        }
        if artifact.feature_names != FEATURE_NAMES {
            return Err(ModelError::FeatureMismatch {
                got: artifact.feature_names,
            });
        }
        if artifact.trees.is_empty() || artifact.trees.iter().any(Vec::is_empty) {
            return Err(ModelError::EmptyEnsemble);
        }

        Ok(Self {
            trees: artifact.trees,
            encoder: LabelEncoder::from_labels(artifact.labels),
        })
    }

    /// Load and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let artifact = ModelArtifact::load_from_disk(path)?;
        let classifier = Self::from_artifact(artifact)?;
        info!(
            classes = classifier.encoder.num_classes(),
            path = %path.display(),
            "Loaded fault classifier"
        );
        Ok(classifier)
    }

    /// Classify one feature vector.
    ///
    /// Fails only if the artifact's label list is shorter than its class
    /// count, which indicates a corrupted artifact.
    pub fn predict(&self, features: &[f64; NUM_FEATURES]) -> Result<Prediction, ModelError> {
        let scores = raw_scores(&self.trees, features);
        let probabilities = softmax(&scores);

        let (best_idx, best_p) = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map_or((0, 0.0), |(i, p)| (i, *p));

        let label = self
            .encoder
            .decode(best_idx)
            .ok_or(ModelError::LabelDecode(best_idx))?
            .to_string();

        Ok(Prediction {
            label,
            confidence: best_p,
            probabilities,
        })
    }

    /// The label order this classifier decodes with.
    pub fn labels(&self) -> &[String] {
        self.encoder.labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::training::{fit_ensemble, TrainingParams};

    fn toy_classifier() -> (FaultClassifier, Vec<Vec<f64>>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = f64::from(i) * 0.01;
            rows.push(vec![1000.0 + jitter, 90.0, 13.8, 150.0, 60.0, 0.0]);
            labels.push(0);
            rows.push(vec![2000.0 + jitter, 110.0, 13.8, 150.0, 60.0, 0.0]);
            labels.push(1);
        }

        let mut encoder = LabelEncoder::default();
        let observed: Vec<&str> = labels
            .iter()
            .map(|&c| if c == 0 { "Normal" } else { "Overheating" })
            .collect();
        let class_ids = encoder.fit_transform(&observed);

        let params = TrainingParams {
            rounds: 10,
            ..TrainingParams::default()
        };
        let trees = fit_ensemble(&rows, &class_ids, encoder.num_classes(), &params);
        let artifact = ModelArtifact::new(trees, &encoder, metadata_now(40, 1.0, 10, 0.3, 4));
        (
            FaultClassifier::from_artifact(artifact).expect("valid artifact"),
            rows,
        )
    }

    #[test]
    fn test_predict_returns_known_label_and_valid_confidence() {
        let (clf, _) = toy_classifier();
        let pred = clf
            .predict(&[1000.0, 90.0, 13.8, 150.0, 60.0, 0.0])
            .expect("predict");
        assert_eq!(pred.label, "Normal");
        assert!(pred.confidence > 0.5 && pred.confidence <= 1.0);

        let sum: f64 = pred.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_fails_on_truncated_label_list() {
        let (clf, _) = toy_classifier();
        // Artifact whose label list is shorter than the tree class count
        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            labels: vec!["Normal".to_string()],
            trees: clf.trees.clone(),
            metadata: metadata_now(40, 1.0, 10, 0.3, 4),
        };
        let corrupted = FaultClassifier::from_artifact(artifact).expect("passes load checks");
        let result = corrupted.predict(&[2000.0, 110.0, 13.8, 150.0, 60.0, 0.0]);
        assert!(matches!(result, Err(ModelError::LabelDecode(1))));
    }

    #[test]
    fn test_disk_round_trip_predicts_identically() {
        let (clf, rows) = toy_classifier();

        let mut encoder = LabelEncoder::default();
        encoder.fit_transform(&["Normal", "Overheating"]);
        let artifact = ModelArtifact::new(
            clf.trees.clone(),
            &encoder,
            metadata_now(40, 1.0, 10, 0.3, 4),
        );

        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("model.json");
        artifact.save_to_disk(&path).expect("save");

        let reloaded = FaultClassifier::load(&path).expect("load");
        for row in rows.iter().take(5) {
            let features: [f64; NUM_FEATURES] = row.as_slice().try_into().expect("six features");
            let a = clf.predict(&features).expect("predict");
            let b = reloaded.predict(&features).expect("predict");
            assert_eq!(a.label, b.label);
            assert!((a.confidence - b.confidence).abs() < 1e-15);
        }
    }

    #[test]
    fn test_reject_wrong_version() {
        let (clf, _) = toy_classifier();
        let mut encoder = LabelEncoder::default();
        encoder.fit_transform(&["Normal", "Overheating"]);
        let mut artifact = ModelArtifact::new(
            clf.trees.clone(),
            &encoder,
            metadata_now(40, 1.0, 10, 0.3, 4),
        );
        artifact.version = 99;

        assert!(matches!(
            FaultClassifier::from_artifact(artifact),
            Err(ModelError::Version { found: 99 })
        ));
    }

    #[test]
    fn test_reject_feature_mismatch() {
        let (clf, _) = toy_classifier();
        let mut encoder = LabelEncoder::default();
        encoder.fit_transform(&["Normal", "Overheating"]);
        let mut artifact = ModelArtifact::new(
            clf.trees.clone(),
            &encoder,
            metadata_now(40, 1.0, 10, 0.3, 4),
        );
        artifact.feature_names = vec!["Wrong_Column".to_string()];

        assert!(matches!(
            FaultClassifier::from_artifact(artifact),
            Err(ModelError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_reject_empty_ensemble() {
        let mut encoder = LabelEncoder::default();
        encoder.fit_transform(&["Normal"]);
        let artifact = ModelArtifact::new(Vec::new(), &encoder, metadata_now(0, 0.0, 0, 0.3, 4));
        assert!(matches!(
            FaultClassifier::from_artifact(artifact),
            Err(ModelError::EmptyEnsemble)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FaultClassifier::load(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(ModelError::Io(_))));
    }
}
