// src/api/types.rs

use serde::Deserialize;

/// Body for the single-shot inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    /// Base64-encoded image, optionally with a `data:` URL prefix.
    #[serde(default)]
    pub image: Option<String>,
}

/// Body for one chunk of a chunked upload. Fields are optional so that a
/// missing `chunkIndex` can be told apart from `chunkIndex: 0` — the latter
/// is a valid index.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkUploadRequest {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default, rename = "chunkIndex")]
    pub chunk_index: Option<u64>,
    #[serde(default)]
    pub chunk: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssembleRequest {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "baseUrl")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshLinkRequest {
    #[serde(default, rename = "baseUrl")]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_index_zero_is_present() {
        let req: ChunkUploadRequest =
            serde_json::from_str(r#"{"sessionId":"s1","chunkIndex":0,"chunk":"AA=="}"#).unwrap();
        assert_eq!(req.chunk_index, Some(0));
    }

    #[test]
    fn test_chunk_index_missing_is_none() {
        let req: ChunkUploadRequest =
            serde_json::from_str(r#"{"sessionId":"s1","chunk":"AA=="}"#).unwrap();
        assert!(req.chunk_index.is_none());
    }

    #[test]
    fn test_camel_case_field_names() {
        let req: CreateAccountRequest =
            serde_json::from_str(r#"{"country":"NL","baseUrl":"https://x.y"}"#).unwrap();
        assert_eq!(req.base_url.as_deref(), Some("https://x.y"));
    }
}
