//! File artifact store for uploaded documents.
//!
//! Wraps the on-disk files a `FileRef.file_path` points at:
//! - local filesystem storage for a deployed shop box
//! - in-memory storage for tests
//!
//! Deletion is idempotent: removing a path that is already gone is not an
//! error for the queue, only logged. The lifecycle manager leans on this to
//! make re-runs of interrupted batch cleanups converge.
//!
//! Implementation note:
//! This is intentionally a small wrapper around `object_store`, which already
//! provides local filesystem and in-memory backends.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use object_store::ObjectStore;
use object_store::ObjectStoreExt;
use object_store::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("invalid artifact store config: {0}")]
    InvalidConfig(String),

    #[error("invalid artifact path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStoreKind {
    Filesystem,
    Memory,
}

impl ArtifactStoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactStoreKind::Filesystem => "filesystem",
            ArtifactStoreKind::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ArtifactBackendConfig {
    Filesystem { root: PathBuf },
    Memory,
}

#[derive(Debug, Clone)]
pub struct ArtifactStoreConfig {
    pub backend: ArtifactBackendConfig,
    /// Optional key prefix applied to all artifact paths.
    pub prefix: Option<String>,
}

impl ArtifactStoreConfig {
    pub fn memory() -> Self {
        Self {
            backend: ArtifactBackendConfig::Memory,
            prefix: None,
        }
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: ArtifactBackendConfig::Filesystem { root: root.into() },
            prefix: None,
        }
    }

    /// Build a config from environment variables.
    ///
    /// Selection rules:
    /// - If `STORAGE_BACKEND` is set: use it (`filesystem`, `memory`)
    /// - Otherwise: default to filesystem (`./uploads`)
    ///
    /// Filesystem env vars:
    /// - `STORAGE_FS_ROOT` (default: `./uploads`)
    ///
    /// Common:
    /// - `STORAGE_PREFIX` (optional)
    pub fn from_env() -> Result<Self, ArtifactError> {
        let backend = std::env::var("STORAGE_BACKEND").ok();
        let prefix = std::env::var("STORAGE_PREFIX").ok().and_then(non_empty);

        let cfg = match backend.as_deref() {
            Some("filesystem") | Some("fs") | None => {
                let root = std::env::var("STORAGE_FS_ROOT")
                    .ok()
                    .and_then(non_empty)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./uploads"));
                Self::filesystem(root)
            }
            Some("memory") | Some("mem") => Self::memory(),
            Some(other) => {
                return Err(ArtifactError::InvalidConfig(format!(
                    "unsupported STORAGE_BACKEND={other} (expected filesystem|memory)"
                )));
            }
        };

        Ok(Self { prefix, ..cfg })
    }
}

/// Store of uploaded file artifacts, addressed by the relative paths kept in
/// `FileRef.file_path`.
#[derive(Clone)]
pub struct ArtifactStore {
    kind: ArtifactStoreKind,
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl ArtifactStore {
    pub fn kind(&self) -> ArtifactStoreKind {
        self.kind
    }

    pub fn new(cfg: ArtifactStoreConfig) -> Result<Self, ArtifactError> {
        let (kind, store) = match cfg.backend {
            ArtifactBackendConfig::Filesystem { root } => {
                ensure_dir(&root)?;
                let fs = object_store::local::LocalFileSystem::new_with_prefix(&root)?;
                (ArtifactStoreKind::Filesystem, Arc::new(fs) as _)
            }
            ArtifactBackendConfig::Memory => {
                let mem = object_store::memory::InMemory::new();
                (ArtifactStoreKind::Memory, Arc::new(mem) as _)
            }
        };

        Ok(Self {
            kind,
            store,
            prefix: cfg.prefix.and_then(non_empty),
        })
    }

    pub fn from_env() -> Result<Self, ArtifactError> {
        Self::new(ArtifactStoreConfig::from_env()?)
    }

    fn to_path(&self, key: &str) -> Result<Path, ArtifactError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(ArtifactError::InvalidPath(
                "artifact path must not be empty".to_string(),
            ));
        }

        let joined = match self.prefix.as_deref() {
            Some(prefix) => {
                let prefix = prefix.trim_matches('/');
                if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}/{key}")
                }
            }
            None => key.to_string(),
        };

        Ok(Path::from(joined))
    }

    /// Store an artifact. Used by the upload collaborator and by tests.
    pub async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<(), ArtifactError> {
        let path = self.to_path(key)?;
        self.store
            .put(&path, object_store::PutPayload::from(bytes))
            .await?;
        Ok(())
    }

    /// Read a whole artifact into memory.
    pub async fn get_bytes(&self, key: &str) -> Result<Bytes, ArtifactError> {
        let path = self.to_path(key)?;
        let res = self.store.get(&path).await?;
        Ok(res.bytes().await?)
    }

    /// Open an artifact as a chunked byte stream.
    pub async fn stream(
        &self,
        key: &str,
    ) -> Result<BoxStream<'static, object_store::Result<Bytes>>, ArtifactError> {
        let path = self.to_path(key)?;
        let res = self.store.get(&path).await?;
        Ok(res.into_stream())
    }

    /// Check whether an artifact still exists.
    pub async fn exists(&self, key: &str) -> Result<bool, ArtifactError> {
        let path = self.to_path(key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an artifact if it exists.
    ///
    /// Returns whether a file was actually removed; a missing artifact is a
    /// logged no-op, never an error.
    pub async fn delete_if_exists(&self, key: &str) -> Result<bool, ArtifactError> {
        let path = self.to_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) => {
                tracing::debug!("deleted artifact {}", path);
                Ok(true)
            }
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!("artifact {} already gone", path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn ensure_dir(root: &FsPath) -> Result<(), ArtifactError> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_round_trip() -> Result<(), ArtifactError> {
        let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
        store.put_bytes("uploads/doc.pdf", Bytes::from("hi")).await?;
        assert!(store.exists("uploads/doc.pdf").await?);
        let got = store.get_bytes("uploads/doc.pdf").await?;
        assert_eq!(got, Bytes::from("hi"));
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent() -> Result<(), ArtifactError> {
        let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
        store.put_bytes("uploads/doc.pdf", Bytes::from("hi")).await?;

        assert!(store.delete_if_exists("uploads/doc.pdf").await?);
        assert!(!store.exists("uploads/doc.pdf").await?);
        // second delete is a no-op, not an error
        assert!(!store.delete_if_exists("uploads/doc.pdf").await?);
        Ok(())
    }

    #[tokio::test]
    async fn filesystem_round_trip() -> Result<(), ArtifactError> {
        let dir = tempfile::tempdir()?;
        let store = ArtifactStore::new(ArtifactStoreConfig::filesystem(dir.path()))?;

        store.put_bytes("uploads/a.txt", Bytes::from("abc")).await?;
        assert!(dir.path().join("uploads/a.txt").exists());

        store.delete_if_exists("uploads/a.txt").await?;
        assert!(!dir.path().join("uploads/a.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn leading_slashes_are_normalized() -> Result<(), ArtifactError> {
        let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
        store.put_bytes("/uploads/a.txt", Bytes::from("abc")).await?;
        assert!(store.exists("uploads/a.txt").await?);
        assert!(store.to_path("").is_err());
        Ok(())
    }
}
