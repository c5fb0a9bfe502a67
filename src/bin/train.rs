//! Offline classifier training.
//!
//! Reads the generator's CSV, label-encodes the fault column, performs the
//! seeded 80/20 split, fits the boosted ensemble, reports held-out accuracy,
//! and writes the model artifact (trees + label order) atomically.
//!
//! # Usage
//! ```bash
//! train-model --data data/vehicle_sensor_data.csv --out data/fault_classifier.json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use mechamind::config::defaults;
use mechamind::dataset::{read_csv, train_test_split, DatasetError};
use mechamind::gbdt::model::metadata_now;
use mechamind::gbdt::{accuracy, fit_ensemble, ModelArtifact, SplitParams, TrainingParams};
use mechamind::types::LabelEncoder;

#[derive(Parser, Debug)]
#[command(name = "train-model")]
#[command(about = "Train the vehicle fault classifier")]
#[command(version)]
struct Args {
    /// Input dataset CSV path
    #[arg(long, default_value = defaults::DATASET_PATH)]
    data: PathBuf,

    /// Output model artifact path
    #[arg(long, default_value = defaults::MODEL_PATH)]
    out: PathBuf,

    /// Random seed for the train/test split
    #[arg(long, default_value_t = defaults::SPLIT_SEED)]
    seed: u64,

    /// Boosting rounds
    #[arg(long, default_value_t = defaults::BOOSTING_ROUNDS)]
    rounds: usize,

    /// Learning rate
    #[arg(long, default_value_t = defaults::LEARNING_RATE)]
    learning_rate: f64,

    /// Maximum tree depth
    #[arg(long, default_value_t = defaults::MAX_DEPTH)]
    max_depth: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let samples = match read_csv(&args.data) {
        Ok(s) => s,
        Err(DatasetError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!(
                "Dataset '{}' not found. Run generate-data first.",
                args.data.display()
            );
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", args.data.display()));
        }
    };

    // Separate features from the label column and encode labels
    let rows: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| s.reading.to_features().to_vec())
        .collect();
    let observed: Vec<&str> = samples.iter().map(|s| s.label.as_str()).collect();
    let mut encoder = LabelEncoder::default();
    let class_ids = encoder.fit_transform(&observed);

    info!(
        rows = rows.len(),
        classes = encoder.num_classes(),
        labels = ?encoder.labels(),
        "Dataset loaded"
    );

    let (train_idx, test_idx) = train_test_split(rows.len(), defaults::TEST_FRACTION, args.seed);

    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let train_ids: Vec<usize> = train_idx.iter().map(|&i| class_ids[i]).collect();
    let test_rows: Vec<Vec<f64>> = test_idx.iter().map(|&i| rows[i].clone()).collect();
    let test_ids: Vec<usize> = test_idx.iter().map(|&i| class_ids[i]).collect();

    let params = TrainingParams {
        rounds: args.rounds,
        learning_rate: args.learning_rate,
        split: SplitParams {
            max_depth: args.max_depth,
            ..SplitParams::default()
        },
    };

    info!(
        train_rows = train_rows.len(),
        test_rows = test_rows.len(),
        rounds = params.rounds,
        "Training fault classifier"
    );
    let ensemble = fit_ensemble(&train_rows, &train_ids, encoder.num_classes(), &params);

    let test_accuracy = accuracy(&ensemble, &test_rows, &test_ids);
    info!("Model accuracy: {:.2}%", test_accuracy * 100.0);

    let artifact = ModelArtifact::new(
        ensemble,
        &encoder,
        metadata_now(
            train_rows.len(),
            test_accuracy,
            params.rounds,
            params.learning_rate,
            args.max_depth,
        ),
    );
    artifact
        .save_to_disk(&args.out)
        .with_context(|| format!("Failed to save model to {}", args.out.display()))?;

    info!(path = %args.out.display(), "Training complete");
    Ok(())
}
