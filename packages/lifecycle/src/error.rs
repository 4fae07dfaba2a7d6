//! Lifecycle error taxonomy.

use print_core::{InvalidTransition, JobStatus, ValidationError};
use thiserror::Error;

/// Errors surfaced by lifecycle operations.
///
/// Artifact failures are deliberately absent: individual file deletions are
/// best-effort, logged and never abort the surrounding operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("batch status must be completed or deleted, got {0}")]
    InvalidBatchTarget(JobStatus),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("persistence failed: {0}")]
    Persistence(db::DbError),
}

impl From<db::DbError> for LifecycleError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::NotFound(msg) => LifecycleError::NotFound(msg),
            other => LifecycleError::Persistence(other),
        }
    }
}
