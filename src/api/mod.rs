//! REST API module using Axum.
//!
//! Three endpoints:
//! - `GET /` - liveness text
//! - `POST /predict` - fault classification for one sensor reading
//! - `POST /chat` - proxied question to the hosted assistant
//!
//! Both capabilities (classifier, assistant) are optional at startup; the
//! handlers check them explicitly and degrade to structured responses.

pub mod handlers;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::assistant::Assistant;
use crate::gbdt::FaultClassifier;

/// An optional capability resolved once at startup.
///
/// `Unavailable` is a normal operating mode, not an error: the service keeps
/// running and the owning endpoint reports the degradation inline.
#[derive(Debug)]
pub enum Capability<T> {
    Ready(T),
    Unavailable,
}

impl<T> Capability<T> {
    /// Wrap an init result, logging the degradation on failure.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>, what: &str) -> Self {
        match result {
            Ok(value) => Capability::Ready(value),
            Err(e) => {
                warn!(error = %e, "{what} unavailable — endpoint will degrade");
                Capability::Unavailable
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }
}

/// Shared state injected into every handler. Read-only after startup.
#[derive(Clone)]
pub struct ApiState {
    pub classifier: Arc<Capability<FaultClassifier>>,
    pub assistant: Arc<Capability<Assistant>>,
}

impl ApiState {
    pub fn new(classifier: Capability<FaultClassifier>, assistant: Capability<Assistant>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            assistant: Arc::new(assistant),
        }
    }
}

/// Build the CORS layer from the configured origin allow-list.
///
/// Origins that fail to parse are dropped with a warning. Credentials are
/// allowed, which rules out wildcards; methods and headers are enumerated.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(origin = %o, error = %e, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create the complete application router.
pub fn create_app(state: ApiState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/predict", post(handlers::predict))
        .route("/chat", post(handlers::chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn degraded_state() -> ApiState {
        ApiState::new(Capability::Unavailable, Capability::Unavailable)
    }

    fn no_origins() -> Vec<String> {
        Vec::new()
    }

    #[tokio::test]
    async fn test_root_returns_200() {
        let app = create_app(degraded_state(), &no_origins());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_degrades_without_model() {
        let app = create_app(degraded_state(), &no_origins());
        let body = serde_json::json!({
            "Engine_RPM": 1500.0,
            "Coolant_Temp_C": 90.0,
            "Battery_Voltage_V": 13.8,
            "Brake_Temp_C": 150.0,
            "Vehicle_Speed_KPH": 60.0,
            "Short_Term_Fuel_Trim_Percent": 0.0
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "ML model is not available.");
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_field() {
        let app = create_app(degraded_state(), &no_origins());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"Engine_RPM": 1500.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_chat_embeds_remote_error_inline() {
        // Assistant pointed at a closed local port: the remote call fails,
        // but the caller still gets the 200-shaped {response} payload.
        let assistant = Assistant::new("test-key", "gemini-1.5-flash")
            .expect("client")
            .with_base_url("http://127.0.0.1:1");
        let state = ApiState::new(Capability::Unavailable, Capability::Ready(assistant));

        let app = create_app(state, &no_origins());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let text = v["response"].as_str().expect("response field");
        assert!(
            text.starts_with("Error with AI service: "),
            "unexpected reply: {text}"
        );
    }

    #[tokio::test]
    async fn test_chat_degrades_without_credential() {
        let app = create_app(degraded_state(), &no_origins());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "why is my car smoking?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["response"], "AI assistant is not configured.");
    }
}
