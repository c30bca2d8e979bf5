// src/storage/fs.rs — Directory-rooted object store

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{ObjectStore, StorageError};

/// Maps object keys to files under a root directory. Content types are
/// accepted and dropped; the filesystem has nowhere to keep them.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are server-generated, but reject traversal outright.
        if key.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(StorageError::Read {
                key: key.into(),
                message: "invalid key".into(),
            });
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write {
                    key: key.into(),
                    message: e.to_string(),
                })?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| StorageError::Write {
                key: key.into(),
                message: e.to_string(),
            })
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.into()))
            }
            Err(e) => Err(StorageError::Read {
                key: key.into(),
                message: e.to_string(),
            }),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // A prefix normally names a directory ("temp/{session}/"); walk it
        // and rebuild keys relative to the root.
        let dir = self.root.join(prefix.trim_end_matches('/'));
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut stack = vec![dir];
        while let Some(current) = stack.pop() {
            let mut entries =
                tokio::fs::read_dir(&current)
                    .await
                    .map_err(|e| StorageError::List {
                        prefix: prefix.into(),
                        message: e.to_string(),
                    })?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| StorageError::List {
                prefix: prefix.into(),
                message: e.to_string(),
            })? {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Some(key) = key_from_path(&self.root, &path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete {
                key: key.into(),
                message: e.to_string(),
            }),
        }
    }
}

fn key_from_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let key = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(key)
}
