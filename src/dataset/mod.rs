//! Labeled dataset I/O: the CSV contract between the generator and trainer.
//!
//! The file is a flat seven-column table (six sensor channels + fault label),
//! one row per sample, no index column. Parsing is line-oriented; malformed
//! rows are logged and skipped rather than aborting the load.

pub mod generator;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::{FaultLabel, SensorReading, FEATURE_NAMES, NUM_FEATURES};

/// Errors from dataset reading/writing.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected CSV header: expected {expected:?}, got {got:?}")]
    Header { expected: String, got: String },
    #[error("dataset is empty: {0}")]
    Empty(String),
}

/// One row of the dataset file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
    pub reading: SensorReading,
    pub label: FaultLabel,
}

/// The exact header line the generator writes and the trainer expects.
pub fn csv_header() -> String {
    let mut columns: Vec<&str> = FEATURE_NAMES.to_vec();
    columns.push("Fault_Label");
    columns.join(",")
}

/// Write samples to a CSV file, creating parent directories as needed.
pub fn write_csv(path: &Path, samples: &[LabeledSample]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "{}", csv_header())?;
    for sample in samples {
        let f = sample.reading.to_features();
        writeln!(
            w,
            "{},{},{},{},{},{},{}",
            f[0], f[1], f[2], f[3], f[4], f[5], sample.label
        )?;
    }
    w.flush()?;

    info!(count = samples.len(), path = %path.display(), "Wrote dataset CSV");
    Ok(())
}

/// Load samples from a CSV file.
///
/// A missing file or wrong header is an error; individual malformed rows are
/// logged with their line number and skipped.
pub fn read_csv(path: &Path) -> Result<Vec<LabeledSample>, DatasetError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut samples = Vec::new();
    let mut line_num = 0usize;

    for line_result in reader.lines() {
        line_num += 1;
        let line = line_result?;

        if line_num == 1 {
            let expected = csv_header();
            if line.trim() != expected {
                return Err(DatasetError::Header {
                    expected,
                    got: line,
                });
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match parse_csv_line(&line) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                warn!(line = line_num, error = %e, "Skipping malformed CSV line");
            }
        }
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty(path.display().to_string()));
    }

    info!(count = samples.len(), path = %path.display(), "Loaded dataset CSV");
    Ok(samples)
}

/// Parse a single data row into a sample.
fn parse_csv_line(line: &str) -> Result<LabeledSample, String> {
    let fields: Vec<&str> = line.split(',').collect();

    if fields.len() != NUM_FEATURES + 1 {
        return Err(format!(
            "expected {} fields, got {}",
            NUM_FEATURES + 1,
            fields.len()
        ));
    }

    let mut features = [0.0f64; NUM_FEATURES];
    for (i, raw) in fields[..NUM_FEATURES].iter().enumerate() {
        features[i] = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("column {}: {}", FEATURE_NAMES[i], e))?;
    }

    let label = FaultLabel::parse(fields[NUM_FEATURES].trim()).map_err(|e| e.to_string())?;

    Ok(LabeledSample {
        reading: SensorReading::from_features(&features),
        label,
    })
}

/// Split `n` row indices into (train, test) with a seeded shuffle.
///
/// `test_fraction` of the rows (rounded down, at least 1 when `n > 1`) go to
/// the test set. Deterministic for a fixed seed.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test_len = (n as f64 * test_fraction) as usize;
    if test_len == 0 && n > 1 {
        test_len = 1;
    }

    let test = indices.split_off(n - test_len);
    (indices, test)
}
