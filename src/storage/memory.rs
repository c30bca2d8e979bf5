// src/storage/memory.rs — In-memory object store (tests, ephemeral deployments)

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{ObjectStore, StorageError};

#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs, for tests.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.write().map_err(|e| StorageError::Write {
            key: key.into(),
            message: e.to_string(),
        })?;
        blobs.insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let blobs = self.blobs.read().map_err(|e| StorageError::Read {
            key: key.into(),
            message: e.to_string(),
        })?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.into()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let blobs = self.blobs.read().map_err(|e| StorageError::List {
            prefix: prefix.into(),
            message: e.to_string(),
        })?;
        Ok(blobs
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.write().map_err(|e| StorageError::Delete {
            key: key.into(),
            message: e.to_string(),
        })?;
        blobs.remove(key);
        Ok(())
    }
}
