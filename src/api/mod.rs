//! REST API for the vision gate
//!
//! POST /gate/access            : three-stage access check
//! POST /bvn/ai_analyze_canvas  : oracle insight on a sketched formula
//! POST /bvn/share_vision       : classify and store a research vision
//! GET  /bvn/impact_map         : static global impact dataset
//! GET  /health                 : liveness

pub mod error;
pub mod gate_routes;
pub mod state;
pub mod vision_routes;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::AppError;
pub use gate_routes::create_gate_router;
pub use state::AppState;
pub use vision_routes::create_vision_router;

/// Build the full router with tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(create_gate_router(state.clone()))
        .merge(create_vision_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
