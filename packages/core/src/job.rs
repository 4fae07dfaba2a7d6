//! Print job domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{ShopId, TokenNumber};

/// Unique identifier for a print job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ink selection for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    Bw,
    Color,
}

impl std::fmt::Display for PrintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrintType::Bw => write!(f, "bw"),
            PrintType::Color => write!(f, "color"),
        }
    }
}

/// Sheet side selection for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintSide {
    Single,
    Double,
}

impl std::fmt::Display for PrintSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrintSide::Single => write!(f, "single"),
            PrintSide::Double => write!(f, "double"),
        }
    }
}

/// Current status of a print job in its lifecycle.
///
/// `Pending` is the only non-terminal state. `Completed`, `Expired` and
/// `Deleted` are terminal: the only accepted "transition" out of them is a
/// repeat of the same status, which callers treat as a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the operator to print it.
    #[default]
    Pending,
    /// Printed and handed over; backing files are gone.
    Completed,
    /// Left pending past the retention window.
    Expired,
    /// Removed by the operator; the record stays, the files are gone.
    Deleted,
}

/// Outcome of a transition check against the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The target status differs and the transition is legal.
    Apply,
    /// The job already carries the target status.
    Noop,
}

/// A status change that the state machine rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobStatus {
    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Expired | JobStatus::Deleted
        )
    }

    /// Validate a transition from `self` to `to`.
    ///
    /// Repeating the current status is accepted as [`Transition::Noop`]
    /// so retried requests stay idempotent.
    pub fn check_transition(self, to: JobStatus) -> Result<Transition, InvalidTransition> {
        if self == to {
            return Ok(Transition::Noop);
        }
        match self {
            JobStatus::Pending => Ok(Transition::Apply),
            _ => Err(InvalidTransition { from: self, to }),
        }
    }

    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Expired => "expired",
            JobStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored document attached to a job.
///
/// `file_path` points at the artifact on the backing store and is cleared
/// when the artifact is deleted; the name and size stay for the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub file_name: String,
    /// Cleared paths may come back as an absent field from the store.
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: u64,
}

impl FileRef {
    pub fn new(file_name: impl Into<String>, file_path: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            file_path: Some(file_path.into()),
            file_size,
        }
    }

    /// Whether an artifact still backs this reference.
    pub fn has_artifact(&self) -> bool {
        self.file_path.is_some()
    }

    /// Copy of this reference with the artifact path cleared.
    pub fn cleared(&self) -> Self {
        Self {
            file_name: self.file_name.clone(),
            file_path: None,
            file_size: self.file_size,
        }
    }
}

/// Rejected print job input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a print job needs at least one file")]
    EmptyFiles,
    #[error("copies must be at least 1")]
    ZeroCopies,
    #[error("token number must not be blank")]
    BlankToken,
}

/// A print job represents one customer upload batch, possibly spanning
/// multiple files, all sharing one token number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    /// Unique identifier for this job.
    pub id: JobId,
    /// The shop this job was uploaded to.
    pub shop_id: ShopId,
    /// Short code shared by every job uploaded together in one batch.
    pub token_number: TokenNumber,
    pub print_type: PrintType,
    pub print_side: PrintSide,
    /// Number of copies requested.
    pub copies: u32,
    /// Current status.
    pub status: JobStatus,
    /// Documents attached to this job, in upload order.
    pub files: Vec<FileRef>,
    /// When the batch was uploaded.
    pub uploaded_at: DateTime<Utc>,
}

impl PrintJob {
    /// Create a new pending job.
    pub fn new(
        shop_id: ShopId,
        token_number: TokenNumber,
        print_type: PrintType,
        print_side: PrintSide,
        files: Vec<FileRef>,
    ) -> Self {
        Self {
            id: JobId::new(),
            shop_id,
            token_number,
            print_type,
            print_side,
            copies: 1,
            status: JobStatus::Pending,
            files,
            uploaded_at: Utc::now(),
        }
    }

    /// Set the number of copies for this job.
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    /// Validate the job's creation input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::EmptyFiles);
        }
        if self.copies == 0 {
            return Err(ValidationError::ZeroCopies);
        }
        if self.token_number.as_str().trim().is_empty() {
            return Err(ValidationError::BlankToken);
        }
        Ok(())
    }

    /// Copy of the file list with every artifact path cleared.
    pub fn cleared_files(&self) -> Vec<FileRef> {
        self.files.iter().map(FileRef::cleared).collect()
    }

    /// Artifact paths still backed by a stored file.
    pub fn artifact_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter_map(|f| f.file_path.as_deref())
    }
}
