// src/api/auth.rs
//
// End-user identity is asserted by the hosting gateway, which verifies ID
// tokens and forwards the subject as headers. The service itself only
// checks an optional shared bearer token from the gateway.

use axum::http::HeaderMap;

use crate::api::ApiState;
use crate::infra::errors::LeafmarketError;

/// Authenticated end user as forwarded by the gateway.
#[derive(Debug, Clone)]
pub struct Caller {
    pub uid: String,
    pub email: Option<String>,
}

/// Verify the service bearer token if one is configured.
pub fn check_service_token(state: &ApiState, headers: &HeaderMap) -> Result<(), LeafmarketError> {
    let Some(ref expected) = state.token else {
        return Ok(());
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(LeafmarketError::Unauthenticated)
    }
}

/// Extract the caller identity; absence means the request never passed the
/// gateway's authentication.
pub fn caller_identity(headers: &HeaderMap) -> Result<Caller, LeafmarketError> {
    let uid = headers
        .get("x-caller-uid")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(LeafmarketError::Unauthenticated)?;

    let email = headers
        .get("x-caller-email")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(Caller {
        uid: uid.to_string(),
        email,
    })
}

/// Constant-time byte comparison to prevent timing attacks on token auth.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
