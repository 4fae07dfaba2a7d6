//! API error taxonomy.

use archive::ArchiveError;
use lifecycle::LifecycleError;
use thiserror::Error;

/// Typed failures returned by every public operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Lifecycle(LifecycleError),

    #[error(transparent)]
    Archive(ArchiveError),

    #[error("persistence failed: {0}")]
    Persistence(db::DbError),

    #[error(transparent)]
    Storage(#[from] storage::ArtifactError),

    #[error("startup failed: {0}")]
    Startup(String),
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Lifecycle(other),
        }
    }
}

impl From<ArchiveError> for ApiError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Archive(other),
        }
    }
}

impl From<db::DbError> for ApiError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Persistence(other),
        }
    }
}
