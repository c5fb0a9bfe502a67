//! Synthetic dataset generator.
//!
//! Writes a labeled sensor CSV for offline classifier training:
//! Gaussian baseline rows plus two scripted fault windows.
//!
//! # Usage
//! ```bash
//! generate-data --samples 5000 --seed 42 --out data/vehicle_sensor_data.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mechamind::config::defaults;
use mechamind::dataset::generator::{generate, GeneratorConfig};
use mechamind::dataset::write_csv;

#[derive(Parser, Debug)]
#[command(name = "generate-data")]
#[command(about = "Synthetic vehicle sensor dataset generator")]
#[command(version)]
struct Args {
    /// Number of rows to synthesize
    #[arg(long, default_value_t = defaults::NUM_SAMPLES)]
    samples: usize,

    /// Segment count; fault windows start at 1/N and 2/N of the table
    #[arg(long, default_value_t = defaults::NUM_SEGMENTS)]
    segments: usize,

    /// Output CSV path
    #[arg(long, default_value = defaults::DATASET_PATH)]
    out: PathBuf,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
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

    let config = GeneratorConfig {
        samples: args.samples,
        segments: args.segments.max(1),
        seed: args.seed,
    };

    info!(
        samples = config.samples,
        segments = config.segments,
        "Generating synthetic dataset"
    );
    let samples = generate(&config);

    write_csv(&args.out, &samples)
        .with_context(|| format!("Failed to write dataset to {}", args.out.display()))?;

    info!(path = %args.out.display(), "Dataset generation complete");
    Ok(())
}
