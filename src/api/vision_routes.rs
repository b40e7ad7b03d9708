//! Vision endpoints and health
//!
//! These sit beside the gate, not behind it.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{AppError, AppState};
use crate::impact::{impact_map, ImpactMap};
use crate::oracle::PromptKind;
use crate::vault::VisionId;

pub fn create_vision_router(state: AppState) -> Router {
    Router::new()
        .route("/bvn/ai_analyze_canvas", post(analyze_canvas))
        .route("/bvn/share_vision", post(share_vision))
        .route("/bvn/impact_map", get(get_impact_map))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CanvasRequest {
    pub image_data: String,
}

#[derive(Debug, Serialize)]
pub struct CanvasResponse {
    pub status: &'static str,
    pub insight: String,
}

#[derive(Debug, Serialize)]
pub struct ShareVisionResponse {
    pub status: &'static str,
    pub vision_id: VisionId,
    pub impact_prediction: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node: String,
}

pub async fn analyze_canvas(
    State(state): State<AppState>,
    payload: Result<Json<CanvasRequest>, JsonRejection>,
) -> Result<Json<CanvasResponse>, AppError> {
    let Json(request) = payload?;
    let insight = state
        .gate
        .oracle()
        .classify(PromptKind::Canvas, &request.image_data)
        .await
        .text_or_fallback();

    Ok(Json(CanvasResponse {
        status: "ANALYZED",
        insight,
    }))
}

/// Body is stored verbatim as metadata; only `content` is required.
pub async fn share_vision(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<ShareVisionResponse>, AppError> {
    let Json(metadata) = payload?;
    let content = metadata
        .get("content")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| AppError::Malformed("missing string field `content`".to_string()))?
        .to_string();

    let assessment = state
        .gate
        .oracle()
        .classify(PromptKind::Research, &content)
        .await
        .text_or_fallback();

    let vision_id = state
        .gate
        .vault()
        .store_vision(&content, metadata, assessment.clone())
        .await?;
    tracing::info!(vision_id = %vision_id, "Vision encoded");

    Ok(Json(ShareVisionResponse {
        status: "VISION_ENCODED",
        vision_id,
        impact_prediction: assessment,
    }))
}

pub async fn get_impact_map() -> Json<ImpactMap> {
    Json(impact_map())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        node: state.gate.node_label().to_string(),
    })
}
