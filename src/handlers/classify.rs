//! Classification API handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::{AppState, AppResult};
use crate::inference::{EngineStats, ModelMetadata};
use crate::models::{ClassifyRequest, ClassifyResponse};

/// Classify a single flow
pub async fn classify(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ClassifyResponse>> {
    let Json(body) = body?;

    let (verdict, features) = match ClassifyRequest::from_json(body)? {
        ClassifyRequest::Positional(body) => {
            body.validate()?;
            let verdict = state.classifier.classify_values(&body.features)?;
            (verdict, body.features)
        }
        ClassifyRequest::Named(body) => {
            body.flow.validate()?;
            let verdict = state.classifier.classify_flow(&body.flow)?;
            (verdict, body.flow.to_model_row().to_vec())
        }
    };

    Ok(Json(ClassifyResponse { verdict, features }))
}

#[derive(Serialize)]
pub struct ModelStatusResponse {
    model: ModelMetadata,
    stats: EngineStats,
}

/// Loaded model metadata and engine stats
pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    Json(ModelStatusResponse {
        model: (*state.model).clone(),
        stats: state.classifier.stats(),
    })
}
