//! POST /gate/access

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use super::{AppError, AppState};
use crate::gate::{GateDecision, GateRequest};

pub fn create_gate_router(state: AppState) -> Router {
    Router::new()
        .route("/gate/access", post(gate_access))
        .with_state(state)
}

/// Triple-lock access: identity, bio-state, intent.
pub async fn gate_access(
    State(state): State<AppState>,
    payload: Result<Json<GateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GateDecision>), AppError> {
    let Json(request) = payload?;

    let decision = state.gate.evaluate(&request).await?;
    tracing::debug!(decision = decision.label(), msg = decision.message(), "Gate decided");

    let status =
        StatusCode::from_u16(decision.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(decision)))
}
