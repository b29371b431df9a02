//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    timestamp: i64,
    model_loaded: bool,
    model_kind: &'static str,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    // The process does not start without a model
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().timestamp(),
        model_loaded: true,
        model_kind: state.model.kind,
    })
}
