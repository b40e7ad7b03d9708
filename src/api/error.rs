//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::{GateError, VaultError};

#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected before any gate stage runs.
    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error(transparent)]
    Gate(#[from] GateError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    msg: String,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl From<VaultError> for AppError {
    fn from(e: VaultError) -> Self {
        AppError::Gate(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Malformed(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    status: "MALFORMED",
                    msg,
                },
            ),
            AppError::Gate(e) => {
                tracing::error!("Gate failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        status: "ERROR",
                        msg: "Internal gate failure".to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
