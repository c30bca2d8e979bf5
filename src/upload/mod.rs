// src/upload/mod.rs — Chunked upload sessions over the object store
//
// A session is virtual: no record exists anywhere, only chunk blobs sharing
// the `temp/{sessionId}/` prefix. Assembly lists the prefix, sorts by name,
// and concatenates — so stored chunk names must sort lexicographically in
// numeric order. Keys are therefore written with a fixed-width zero-padded
// index.

use bytes::{Bytes, BytesMut};
use futures::future::{join_all, try_join_all};
use std::sync::Arc;

use crate::infra::errors::LeafmarketError;
use crate::storage::ObjectStore;

const SESSION_PREFIX: &str = "temp";
const INDEX_WIDTH: usize = 6;

/// Exclusive upper bound keeping the padded index fixed-width.
pub const MAX_CHUNK_INDEX: u64 = 1_000_000;

const CHUNK_CONTENT_TYPE: &str = "application/octet-stream";

/// `temp/{sessionId}/` — the listing prefix for one session.
pub fn session_prefix(session_id: &str) -> String {
    format!("{SESSION_PREFIX}/{session_id}/")
}

/// `temp/{sessionId}/{chunkIndex}` with the index zero-padded to six digits.
pub fn chunk_key(session_id: &str, chunk_index: u64) -> String {
    format!("{SESSION_PREFIX}/{session_id}/{chunk_index:0INDEX_WIDTH$}")
}

pub struct UploadSessions {
    store: Arc<dyn ObjectStore>,
}

impl UploadSessions {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Persist one chunk. No size, ordering, or duplication checks at upload
    /// time; a re-upload of the same index overwrites.
    pub async fn store_chunk(
        &self,
        session_id: &str,
        chunk_index: u64,
        chunk: Bytes,
    ) -> Result<(), LeafmarketError> {
        if chunk_index >= MAX_CHUNK_INDEX {
            return Err(LeafmarketError::Validation(format!(
                "chunkIndex {chunk_index} exceeds maximum {}",
                MAX_CHUNK_INDEX - 1
            )));
        }

        let key = chunk_key(session_id, chunk_index);
        self.store.put(&key, chunk, CHUNK_CONTENT_TYPE).await?;
        tracing::debug!("Stored chunk '{key}'");
        Ok(())
    }

    /// List, sort, download concurrently, concatenate in sorted order, then
    /// delete every listed chunk. A single failed download aborts the whole
    /// assembly; deletions are best-effort.
    pub async fn assemble(&self, session_id: &str) -> Result<Bytes, LeafmarketError> {
        let prefix = session_prefix(session_id);
        let mut keys = self.store.list(&prefix).await?;
        keys.sort();

        let chunks = try_join_all(keys.iter().map(|key| self.store.get(key))).await?;

        let total: usize = chunks.iter().map(Bytes::len).sum();
        let mut buffer = BytesMut::with_capacity(total);
        for chunk in &chunks {
            buffer.extend_from_slice(chunk);
        }

        let deletions = join_all(keys.iter().map(|key| self.store.delete(key))).await;
        for (key, result) in keys.iter().zip(deletions) {
            if let Err(e) = result {
                tracing::warn!("Failed to delete chunk '{key}': {e}");
            }
        }

        tracing::info!(
            "Assembled session '{session_id}': {} chunk(s), {total} byte(s)",
            keys.len()
        );
        Ok(buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    #[test]
    fn test_chunk_key_zero_padded() {
        assert_eq!(chunk_key("s1", 0), "temp/s1/000000");
        assert_eq!(chunk_key("s1", 42), "temp/s1/000042");
        assert_eq!(chunk_key("s1", 999_999), "temp/s1/999999");
    }

    #[test]
    fn test_padded_keys_sort_numerically() {
        // The unpadded hazard: "10" < "2" lexicographically. Padding fixes it.
        let mut keys: Vec<String> = [10u64, 2, 0, 100].iter().map(|&i| chunk_key("s", i)).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["temp/s/000000", "temp/s/000002", "temp/s/000010", "temp/s/000100"]
        );
    }

    #[tokio::test]
    async fn test_assemble_orders_out_of_order_uploads() {
        let store = Arc::new(MemoryObjectStore::new());
        let sessions = UploadSessions::new(store.clone());

        // Upload 0..10 shuffled.
        for &i in &[7u64, 0, 9, 3, 1, 8, 2, 6, 4, 5] {
            sessions
                .store_chunk("sess", i, Bytes::from(vec![i as u8]))
                .await
                .unwrap();
        }

        let assembled = sessions.assemble("sess").await.unwrap();
        assert_eq!(&assembled[..], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[tokio::test]
    async fn test_assemble_deletes_all_chunks() {
        let store = Arc::new(MemoryObjectStore::new());
        let sessions = UploadSessions::new(store.clone());
        for i in 0..4u64 {
            sessions
                .store_chunk("sess", i, Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        sessions.assemble("sess").await.unwrap();
        assert!(store.list("temp/sess/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assemble_empty_session_yields_empty_buffer() {
        let store = Arc::new(MemoryObjectStore::new());
        let sessions = UploadSessions::new(store);
        let assembled = sessions.assemble("ghost").await.unwrap();
        assert!(assembled.is_empty());
    }

    #[tokio::test]
    async fn test_index_out_of_range_rejected() {
        let store = Arc::new(MemoryObjectStore::new());
        let sessions = UploadSessions::new(store);
        let err = sessions
            .store_chunk("sess", MAX_CHUNK_INDEX, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, LeafmarketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_chunk_download_aborts_assembly() {
        use crate::storage::{MockObjectStore, StorageError};
        use mockall::predicate::eq;

        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .with(eq("temp/sess/"))
            .returning(|_| Ok(vec!["temp/sess/000000".into(), "temp/sess/000001".into()]));
        store
            .expect_get()
            .with(eq("temp/sess/000000"))
            .returning(|_| Ok(Bytes::from_static(b"a")));
        store.expect_get().with(eq("temp/sess/000001")).returning(|key| {
            Err(StorageError::Read {
                key: key.to_string(),
                message: "connection reset".into(),
            })
        });
        // No deletions happen when a download fails.
        store.expect_delete().never();

        let sessions = UploadSessions::new(Arc::new(store));
        let err = sessions.assemble("sess").await.unwrap_err();
        assert!(matches!(err, LeafmarketError::Storage(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = Arc::new(MemoryObjectStore::new());
        let sessions = UploadSessions::new(store.clone());
        sessions
            .store_chunk("a", 0, Bytes::from_static(b"aa"))
            .await
            .unwrap();
        sessions
            .store_chunk("b", 0, Bytes::from_static(b"bb"))
            .await
            .unwrap();

        let assembled = sessions.assemble("a").await.unwrap();
        assert_eq!(&assembled[..], b"aa");
        // Session "b" untouched.
        assert_eq!(store.list("temp/b/").await.unwrap().len(), 1);
    }
}
