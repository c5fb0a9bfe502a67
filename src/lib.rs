//! MechaMind: vehicle diagnostics backend.
//!
//! Three independently-run pieces sharing a file interface:
//!
//! - **Dataset generator** (`generate-data`): synthetic labeled sensor CSV
//! - **Trainer** (`train-model`): fits and persists the fault classifier
//! - **API service** (`mechamind`): `/predict` and `/chat` over the loaded
//!   artifact and a hosted chat model

pub mod api;
pub mod assistant;
pub mod config;
pub mod dataset;
pub mod gbdt;
pub mod types;

// Re-export configuration
pub use config::ServiceConfig;

// Re-export commonly used types
pub use types::{FaultLabel, LabelEncoder, SensorReading, FEATURE_NAMES, NUM_FEATURES};

// Re-export classifier components
pub use gbdt::{FaultClassifier, ModelArtifact, ModelError, TrainingParams};

// Re-export the assistant client
pub use assistant::{Assistant, AssistantError};
