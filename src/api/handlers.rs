// src/api/handlers.rs

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::{prelude::BASE64_STANDARD, Engine};
use bytes::Bytes;

use crate::api::{auth, types::*, ApiState};
use crate::connect::CreateAccountOutcome;
use crate::infra::errors::LeafmarketError;
use crate::model::Classification;

/// Decode a base64 payload, tolerating a `data:...;base64,` prefix.
fn decode_payload(encoded: &str) -> Result<Bytes, LeafmarketError> {
    let encoded = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    BASE64_STANDARD
        .decode(encoded.trim())
        .map(Bytes::from)
        .map_err(|e| LeafmarketError::Validation(format!("Invalid base64 payload: {e}")))
}

/// POST /api/v1/classify — single-shot image classification.
pub async fn classify(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<Classification>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;

    let image = body
        .image
        .ok_or_else(|| LeafmarketError::Validation("Missing image".into()))?;
    let bytes = decode_payload(&image)?;

    let result = state.model.classify(&bytes).await?;
    Ok(Json(result))
}

/// POST /api/v1/uploads/chunk — store one chunk of a chunked upload.
pub async fn upload_chunk(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ChunkUploadRequest>,
) -> Result<Json<serde_json::Value>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;

    let session_id = body
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LeafmarketError::Validation("Missing sessionId".into()))?;
    // chunkIndex 0 is a present value; only an absent field is an error.
    let chunk_index = body
        .chunk_index
        .ok_or_else(|| LeafmarketError::Validation("Missing chunkIndex".into()))?;
    let chunk = body
        .chunk
        .ok_or_else(|| LeafmarketError::Validation("Missing chunk".into()))?;

    let bytes = decode_payload(&chunk)?;
    state.sessions.store_chunk(&session_id, chunk_index, bytes).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/v1/uploads/assemble — reassemble a session and classify it.
pub async fn assemble_session(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<AssembleRequest>,
) -> Result<Json<Classification>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;

    let session_id = body
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LeafmarketError::Validation("Missing sessionId".into()))?;

    let buffer = state.sessions.assemble(&session_id).await?;
    let result = state.model.classify(&buffer).await?;
    Ok(Json(result))
}

/// POST /api/v1/connect/account — create (or reuse) the caller's connected
/// account and mint an onboarding link.
pub async fn create_connect_account(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountOutcome>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;
    let caller = auth::caller_identity(&headers)?;

    let base_url = body
        .base_url
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LeafmarketError::Validation("Missing baseUrl".into()))?;

    let outcome = state
        .connect
        .create_account(
            &caller.uid,
            caller.email.as_deref(),
            body.country.as_deref(),
            &base_url,
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/connect/status — refresh the persisted onboarding status
/// from the provider's capability flags.
pub async fn update_account_status(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;
    let caller = auth::caller_identity(&headers)?;

    let status = state.connect.update_account_status(&caller.uid).await?;
    Ok(Json(serde_json::json!({ "status": status.as_str() })))
}

/// POST /api/v1/connect/link — mint a fresh onboarding link.
pub async fn refresh_account_link(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<RefreshLinkRequest>,
) -> Result<Json<serde_json::Value>, LeafmarketError> {
    auth::check_service_token(&state, &headers)?;
    let caller = auth::caller_identity(&headers)?;

    let base_url = body
        .base_url
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LeafmarketError::Validation("Missing baseUrl".into()))?;

    let url = state
        .connect
        .refresh_account_link(&caller.uid, &base_url)
        .await?;
    Ok(Json(serde_json::json!({ "url": url })))
}

/// GET /api/v1/health — simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload_plain_base64() {
        let bytes = decode_payload("aGVsbG8=").unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn test_decode_payload_strips_data_url_prefix() {
        let bytes = decode_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        assert!(matches!(
            decode_payload("!!not base64!!"),
            Err(LeafmarketError::Validation(_))
        ));
    }
}
