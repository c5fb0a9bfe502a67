//! Request handlers for the diagnostics API.
//!
//! Both POST endpoints degrade to 200-shaped structured payloads when their
//! backing capability is missing or fails, so browser clients never have to
//! special-case HTTP errors.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ApiState, Capability};
use crate::types::SensorReading;

// ============================================================================
// Wire types
// ============================================================================

/// Liveness response for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Successful prediction payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Decoded fault label.
    pub prediction: String,
    /// Maximum class probability, formatted to two decimals.
    pub confidence: String,
}

/// Structured error payload shared by degraded and failed predictions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub query: String,
}

/// Chat response body. It also carries inline error text, so the shape is
/// identical whether the remote call succeeded or not.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - liveness check.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "MechaMind backend is running".to_string(),
    })
}

/// POST /predict - classify one sensor reading.
///
/// Returns `{prediction, confidence}` on success, or `{error}` when the model
/// is unavailable or inference fails. Both shapes are HTTP 200.
pub async fn predict(State(state): State<ApiState>, Json(reading): Json<SensorReading>) -> Response {
    let classifier = match state.classifier.as_ref() {
        Capability::Ready(clf) => clf,
        Capability::Unavailable => {
            return Json(ErrorResponse {
                error: "ML model is not available.".to_string(),
            })
            .into_response();
        }
    };

    match classifier.predict(&reading.to_features()) {
        Ok(prediction) => Json(PredictResponse {
            prediction: prediction.label,
            confidence: format!("{:.2}", prediction.confidence),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Prediction failed");
            Json(ErrorResponse {
                error: format!("Prediction failed: {e}"),
            })
            .into_response()
        }
    }
}

/// POST /chat - forward a question to the hosted assistant.
///
/// Always returns the `{response}` shape: the not-configured notice, the
/// model's reply, or the remote error text.
pub async fn chat(State(state): State<ApiState>, Json(body): Json<ChatQuery>) -> Json<ChatResponse> {
    let assistant = match state.assistant.as_ref() {
        Capability::Ready(client) => client,
        Capability::Unavailable => {
            return Json(ChatResponse {
                response: "AI assistant is not configured.".to_string(),
            });
        }
    };

    match assistant.ask(&body.query).await {
        Ok(text) => Json(ChatResponse { response: text }),
        Err(e) => {
            warn!(error = %e, "Chat completion failed");
            Json(ChatResponse {
                response: format!("Error with AI service: {e}"),
            })
        }
    }
}
