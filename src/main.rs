//! MechaMind backend service.
//!
//! Loads the trained fault classifier and configures the chat assistant at
//! startup, then serves the diagnostics API. Both capabilities are optional:
//! a missing model artifact or credential degrades the owning endpoint
//! instead of failing startup.
//!
//! # Usage
//!
//! ```bash
//! # Default config (./mechamind.toml if present, else built-in defaults)
//! cargo run --release
//!
//! # Override the bind address and model path
//! cargo run --release -- --addr 127.0.0.1:9000 --model data/fault_classifier.json
//! ```
//!
//! # Environment Variables
//!
//! - `GOOGLE_API_KEY`: credential for the hosted chat model (read after `.env`)
//! - `MECHAMIND_CONFIG`: path to a TOML config file
//! - `RUST_LOG`: logging level (default: info)

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use mechamind::api::{create_app, ApiState, Capability};
use mechamind::assistant::Assistant;
use mechamind::config::{defaults, ServiceConfig};
use mechamind::gbdt::FaultClassifier;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "mechamind")]
#[command(about = "MechaMind vehicle diagnostics API service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config)
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the model artifact path (default from config)
    #[arg(short, long)]
    model: Option<String>,
}

// ============================================================================
// Startup
// ============================================================================

/// Best-effort classifier load. Absence is a degraded mode, never fatal.
fn init_classifier(path: &str) -> Capability<FaultClassifier> {
    Capability::from_result(FaultClassifier::load(Path::new(path)), "ML model")
}

/// Best-effort assistant configuration from the environment credential.
fn init_assistant(model: &str) -> Capability<Assistant> {
    let api_key = match std::env::var(defaults::CHAT_API_KEY_VAR) {
        Ok(key) if !key.is_empty() => key,
        _ => {
            warn!(
                "{} not set — /chat will report not-configured",
                defaults::CHAT_API_KEY_VAR
            );
            return Capability::Unavailable;
        }
    };
    Capability::from_result(Assistant::new(&api_key, model), "Chat assistant")
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so the credential lookup below sees it
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = ServiceConfig::load();

    let server_addr = args.addr.unwrap_or_else(|| config.server.addr.clone());
    let model_path = args.model.unwrap_or_else(|| config.model.path.clone());

    info!("MechaMind vehicle diagnostics backend");

    let classifier = init_classifier(&model_path);
    if classifier.is_ready() {
        info!(path = %model_path, "Fault classifier ready");
    }

    let assistant = init_assistant(&config.assistant.model);
    if assistant.is_ready() {
        info!(model = %config.assistant.model, "Chat assistant configured");
    }

    let state = ApiState::new(classifier, assistant);
    let app = create_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}
