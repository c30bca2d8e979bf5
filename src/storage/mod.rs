// src/storage/mod.rs — Object store seam

pub mod fs;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },

    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    #[error("Failed to list prefix '{prefix}': {message}")]
    List { prefix: String, message: String },

    #[error("Failed to delete '{key}': {message}")]
    Delete { key: String, message: String },
}

/// Named byte blobs behind a bucket abstraction. Keys are `/`-separated
/// paths; listing is by key prefix and returns full keys in unspecified
/// order (callers sort).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
