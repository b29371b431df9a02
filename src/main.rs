//! IoMT Traffic Attack Detector
//!
//! Serves a pre-trained network-flow classifier behind a web form.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    IOMT ATTACK DETECTOR                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │  Pages /   │──▶│  Traffic     │──▶│  Predictor         │  │
//! │  │  JSON API  │   │  Classifier  │   │  (loaded once)     │  │
//! │  │  (Axum)    │◀──│  (labels)    │◀──│                    │  │
//! │  └────────────┘   └──────────────┘   └─────────▲──────────┘  │
//! │                                                │             │
//! │                                   ┌────────────┴──────────┐  │
//! │                                   │ *.json.gz / *.onnx.gz │  │
//! │                                   └───────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod inference;
mod handlers;
mod error;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use config::{Config, LogFormat};
use inference::{LoadedModel, ModelMetadata, TrafficClassifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    init_tracing(config.log_format);

    tracing::info!("IoMT attack detector starting ({})...", config.environment);
    if config.is_production() && config.model_sha256.is_none() {
        tracing::warn!("MODEL_SHA256 not set, model artifact is not pinned");
    }

    // Load model - no model, no service
    let loaded = inference::load_model(&config.model_path, config.model_sha256.as_deref())
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;

    // Build application state
    let state = AppState::new(loaded, config.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.bind_addr();
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "iomt_detector=debug,tower_http=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<TrafficClassifier>,
    pub model: Arc<ModelMetadata>,
    pub config: Config,
}

impl AppState {
    pub fn new(loaded: LoadedModel, config: Config) -> Self {
        Self {
            classifier: Arc::new(TrafficClassifier::new(loaded.predictor)),
            model: Arc::new(loaded.metadata),
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Pages
    let page_routes = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/detect", get(handlers::pages::detect_form).post(handlers::pages::detect_submit));

    // JSON API
    let api_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/classify", post(handlers::classify::classify))
        .route("/api/v1/model", get(handlers::classify::model_status));

    // Combine all routes
    Router::new()
        .merge(page_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
