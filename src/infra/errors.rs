// src/infra/errors.rs — Error types for leafmarket

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum LeafmarketError {
    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Upstream '{service}' error: {message}")]
    Upstream { service: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LeafmarketError {
    /// Short error code surfaced to RPC-style callers.
    pub fn code(&self) -> &'static str {
        match self {
            LeafmarketError::Unauthenticated => "unauthenticated",
            LeafmarketError::NotFound(_) => "not-found",
            LeafmarketError::Validation(_) => "invalid-argument",
            LeafmarketError::Decode(_) => "decode-failed",
            LeafmarketError::ModelLoad(_) => "model-load-failed",
            LeafmarketError::Upstream { .. } => "upstream",
            LeafmarketError::Storage(_) | LeafmarketError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            LeafmarketError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LeafmarketError::NotFound(_) => StatusCode::NOT_FOUND,
            LeafmarketError::Validation(_) | LeafmarketError::Decode(_) => StatusCode::BAD_REQUEST,
            LeafmarketError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            LeafmarketError::ModelLoad(_)
            | LeafmarketError::Storage(_)
            | LeafmarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every handler error passes through here: log first, then respond with the
/// uniform `{error, code}` envelope.
impl IntoResponse for LeafmarketError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        tracing::error!(code, status = status.as_u16(), "{message}");

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}
