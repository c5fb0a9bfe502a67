//! Synthetic labeled dataset generation.
//!
//! Produces a baseline of per-channel Gaussian noise clipped to plausible
//! operating ranges, then overwrites two scripted fault windows:
//! - an overheating window (coolant ramp 95→115 °C, RPM raised 10%)
//! - a battery-failure window (voltage decline 12.5→10.5 V)
//!
//! Window starts fall on segment boundaries derived from the sample count;
//! window ends are clamped to the table size.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::LabeledSample;
use crate::types::{FaultLabel, SensorReading, NUM_FEATURES};

/// Rows in the overheating fault window.
pub const OVERHEAT_DURATION: usize = 300;
/// Coolant temperature ramp over the overheating window (°C).
const OVERHEAT_COOLANT_RANGE: (f64, f64) = (95.0, 115.0);
/// RPM multiplier applied during overheating.
const OVERHEAT_RPM_FACTOR: f64 = 1.1;

/// Rows in the battery-failure fault window.
pub const BATTERY_DURATION: usize = 250;
/// Battery voltage decline over the battery-failure window (V).
const BATTERY_VOLTAGE_RANGE: (f64, f64) = (12.5, 10.5);

/// Per-channel Gaussian parameters and clip range.
struct ChannelSpec {
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

/// Baseline distribution for each sensor channel, in feature order.
const CHANNEL_SPECS: [ChannelSpec; NUM_FEATURES] = [
    // Engine_RPM
    ChannelSpec { mean: 1500.0, std_dev: 300.0, min: 800.0, max: 3000.0 },
    // Coolant_Temp_C
    ChannelSpec { mean: 90.0, std_dev: 2.0, min: 85.0, max: 95.0 },
    // Battery_Voltage_V
    ChannelSpec { mean: 13.8, std_dev: 0.2, min: 12.8, max: 14.2 },
    // Brake_Temp_C
    ChannelSpec { mean: 150.0, std_dev: 25.0, min: 80.0, max: 250.0 },
    // Vehicle_Speed_KPH
    ChannelSpec { mean: 60.0, std_dev: 15.0, min: 0.0, max: 120.0 },
    // Short_Term_Fuel_Trim_Percent
    ChannelSpec { mean: 0.0, std_dev: 2.0, min: -5.0, max: 5.0 },
];

/// Generator parameters.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Total rows to synthesize.
    pub samples: usize,
    /// Segment count; fault windows start at 1/N and 2/N of the table.
    pub segments: usize,
    /// Seed for reproducible output; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples: crate::config::defaults::NUM_SAMPLES,
            segments: crate::config::defaults::NUM_SEGMENTS,
            seed: None,
        }
    }
}

/// Index windows of the two fault injections for a given table shape.
///
/// Both windows are half-open `[start, end)` and clamped to `samples`.
pub fn fault_windows(samples: usize, segments: usize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let segment_len = samples / segments.max(1);

    let overheat_start = segment_len.min(samples);
    let overheat_end = (overheat_start + OVERHEAT_DURATION).min(samples);

    let battery_start = (segment_len * 2).min(samples);
    let battery_end = (battery_start + BATTERY_DURATION).min(samples);

    (overheat_start..overheat_end, battery_start..battery_end)
}

/// Synthesize the labeled dataset.
pub fn generate(config: &GeneratorConfig) -> Vec<LabeledSample> {
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut samples: Vec<LabeledSample> = (0..config.samples)
        .map(|_| LabeledSample {
            reading: draw_baseline(&mut rng),
            label: FaultLabel::Normal,
        })
        .collect();

    let (overheat, battery) = fault_windows(config.samples, config.segments);

    inject_overheating(&mut samples, overheat);
    inject_battery_failure(&mut samples, battery);

    samples
}

/// Draw one baseline row: each channel independently Gaussian, clipped.
fn draw_baseline<R: Rng>(rng: &mut R) -> SensorReading {
    let mut features = [0.0f64; NUM_FEATURES];
    for (value, spec) in features.iter_mut().zip(CHANNEL_SPECS.iter()) {
        // std_dev is always positive here, so Normal::new cannot fail
        let drawn = match Normal::new(spec.mean, spec.std_dev) {
            Ok(dist) => dist.sample(rng),
            Err(_) => spec.mean,
        };
        *value = drawn.clamp(spec.min, spec.max);
    }
    SensorReading::from_features(&features)
}

/// Overwrite the overheating window: linear coolant ramp, raised RPM.
fn inject_overheating(samples: &mut [LabeledSample], window: std::ops::Range<usize>) {
    let len = window.len();
    for (step, idx) in window.enumerate() {
        let reading = &mut samples[idx].reading;
        reading.Coolant_Temp_C = ramp(OVERHEAT_COOLANT_RANGE, step, len);
        reading.Engine_RPM *= OVERHEAT_RPM_FACTOR;
        samples[idx].label = FaultLabel::Overheating;
    }
}

/// Overwrite the battery window: linear voltage decline.
fn inject_battery_failure(samples: &mut [LabeledSample], window: std::ops::Range<usize>) {
    let len = window.len();
    for (step, idx) in window.enumerate() {
        samples[idx].reading.Battery_Voltage_V = ramp(BATTERY_VOLTAGE_RANGE, step, len);
        samples[idx].label = FaultLabel::BatteryFailure;
    }
}

/// Linear interpolation across a window, endpoints inclusive.
fn ramp((from, to): (f64, f64), step: usize, len: usize) -> f64 {
    if len <= 1 {
        return from;
    }
    from + (to - from) * (step as f64) / ((len - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_matches_request() {
        let config = GeneratorConfig {
            samples: 1000,
            segments: 4,
            seed: Some(7),
        };
        assert_eq!(generate(&config).len(), 1000);
    }

    #[test]
    fn test_fault_windows_label_exactly() {
        let config = GeneratorConfig {
            samples: 2000,
            segments: 4,
            seed: Some(7),
        };
        let samples = generate(&config);
        let (overheat, battery) = fault_windows(config.samples, config.segments);

        for (i, s) in samples.iter().enumerate() {
            let expected = if overheat.contains(&i) {
                FaultLabel::Overheating
            } else if battery.contains(&i) {
                FaultLabel::BatteryFailure
            } else {
                FaultLabel::Normal
            };
            assert_eq!(s.label, expected, "row {}", i);
        }
    }

    #[test]
    fn test_overheat_ramp_endpoints() {
        let config = GeneratorConfig {
            samples: 2000,
            segments: 4,
            seed: Some(7),
        };
        let samples = generate(&config);
        let (overheat, _) = fault_windows(config.samples, config.segments);

        let first = samples[overheat.start].reading.Coolant_Temp_C;
        let last = samples[overheat.end - 1].reading.Coolant_Temp_C;
        assert!((first - 95.0).abs() < 1e-9);
        assert!((last - 115.0).abs() < 1e-9);
    }

    #[test]
    fn test_battery_ramp_is_decline() {
        let config = GeneratorConfig {
            samples: 2000,
            segments: 4,
            seed: Some(7),
        };
        let samples = generate(&config);
        let (_, battery) = fault_windows(config.samples, config.segments);

        let first = samples[battery.start].reading.Battery_Voltage_V;
        let last = samples[battery.end - 1].reading.Battery_Voltage_V;
        assert!((first - 12.5).abs() < 1e-9);
        assert!((last - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_respects_clip_ranges() {
        let config = GeneratorConfig {
            samples: 500,
            segments: 4,
            seed: Some(11),
        };
        let samples = generate(&config);
        for s in samples.iter().filter(|s| s.label == FaultLabel::Normal) {
            let f = s.reading.to_features();
            for (value, spec) in f.iter().zip(CHANNEL_SPECS.iter()) {
                assert!(*value >= spec.min && *value <= spec.max);
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let config = GeneratorConfig {
            samples: 200,
            segments: 4,
            seed: Some(99),
        };
        let a = generate(&config);
        let b = generate(&config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_windows_clamped_to_table() {
        // Small table: the second window would start past the end
        let (overheat, battery) = fault_windows(100, 4);
        assert_eq!(overheat, 25..100);
        assert_eq!(battery, 50..100);

        let config = GeneratorConfig {
            samples: 100,
            segments: 4,
            seed: Some(1),
        };
        // Must not panic on out-of-range indices
        let samples = generate(&config);
        assert_eq!(samples.len(), 100);
    }
}
