//! Core data types shared by the generator, trainer, and API service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of sensor channels in a reading.
pub const NUM_FEATURES: usize = 6;

/// Canonical feature order for the CSV columns and the model's input vector.
///
/// Every producer and consumer of feature vectors goes through this order;
/// the trained artifact records it so a mismatched model is rejected at load.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Engine_RPM",
    "Coolant_Temp_C",
    "Battery_Voltage_V",
    "Brake_Temp_C",
    "Vehicle_Speed_KPH",
    "Short_Term_Fuel_Trim_Percent",
];

/// One snapshot of the six vehicle sensor channels.
///
/// Field names double as the JSON wire names and the CSV column headers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct SensorReading {
    /// Engine speed (rev/min)
    pub Engine_RPM: f64,
    /// Coolant temperature (°C)
    pub Coolant_Temp_C: f64,
    /// Battery voltage (V)
    pub Battery_Voltage_V: f64,
    /// Brake temperature (°C)
    pub Brake_Temp_C: f64,
    /// Vehicle speed (km/h)
    pub Vehicle_Speed_KPH: f64,
    /// Short-term fuel trim (%)
    pub Short_Term_Fuel_Trim_Percent: f64,
}

impl SensorReading {
    /// Flatten into the model's feature vector, in [`FEATURE_NAMES`] order.
    pub fn to_features(&self) -> [f64; NUM_FEATURES] {
        [
            self.Engine_RPM,
            self.Coolant_Temp_C,
            self.Battery_Voltage_V,
            self.Brake_Temp_C,
            self.Vehicle_Speed_KPH,
            self.Short_Term_Fuel_Trim_Percent,
        ]
    }

    /// Build a reading from a feature vector in [`FEATURE_NAMES`] order.
    pub fn from_features(features: &[f64; NUM_FEATURES]) -> Self {
        Self {
            Engine_RPM: features[0],
            Coolant_Temp_C: features[1],
            Battery_Voltage_V: features[2],
            Brake_Temp_C: features[3],
            Vehicle_Speed_KPH: features[4],
            Short_Term_Fuel_Trim_Percent: features[5],
        }
    }
}

/// Error raised when parsing an unknown fault label string.
#[derive(Error, Debug)]
#[error("unknown fault label: {0}")]
pub struct UnknownLabel(pub String);

/// Fault category assigned to a sensor reading.
///
/// The string forms (`Normal`, `Overheating`, `Battery_Failure`) are the
/// CSV values and the `/predict` response vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultLabel {
    Normal,
    Overheating,
    BatteryFailure,
}

impl FaultLabel {
    /// Canonical string form used in the CSV and over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultLabel::Normal => "Normal",
            FaultLabel::Overheating => "Overheating",
            FaultLabel::BatteryFailure => "Battery_Failure",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Result<Self, UnknownLabel> {
        match s {
            "Normal" => Ok(FaultLabel::Normal),
            "Overheating" => Ok(FaultLabel::Overheating),
            "Battery_Failure" => Ok(FaultLabel::BatteryFailure),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

impl std::fmt::Display for FaultLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String↔index mapping for class labels, fit over the training data.
///
/// Labels are assigned indices in order of first appearance. The fitted
/// order is persisted inside the model artifact so the service never has to
/// reconstruct it independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    labels: Vec<String>,
}

impl LabelEncoder {
    /// Fit the encoder over observed label strings and return the encoded
    /// class index for each input row.
    pub fn fit_transform<S: AsRef<str>>(&mut self, observed: &[S]) -> Vec<usize> {
        observed
            .iter()
            .map(|s| {
                let s = s.as_ref();
                match self.labels.iter().position(|l| l == s) {
                    Some(idx) => idx,
                    None => {
                        self.labels.push(s.to_string());
                        self.labels.len() - 1
                    }
                }
            })
            .collect()
    }

    /// Rebuild an encoder from a persisted label order.
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Decode a class index back to its label string.
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of distinct classes seen.
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// The fitted label order (index = class id).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
