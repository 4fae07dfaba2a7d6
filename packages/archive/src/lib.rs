//! Download payloads for a token's print jobs.
//!
//! A single remaining file streams directly under its original name;
//! several files stream as one zip named `printjob-{token}.zip`. The zip is
//! written entry by entry to an unlinked temp file, so memory stays bounded
//! by one artifact read and no response bytes exist until the archive is
//! complete - a failure while appending surfaces as a typed error, never a
//! truncated body. Dropping the returned stream releases the spool file.

use std::collections::HashSet;
use std::io::{Seek, Write};

use bytes::Bytes;
use db::repositories::JobRepository;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use print_core::{FileRef, JobStatus, TokenNumber};
use storage::ArtifactStore;
use tokio_util::io::ReaderStream;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Chunk size for streaming the spooled archive.
const STREAM_CHUNK: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence failed: {0}")]
    Persistence(db::DbError),

    #[error(transparent)]
    Artifact(#[from] storage::ArtifactError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<db::DbError> for ArchiveError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::NotFound(msg) => ArchiveError::NotFound(msg),
            other => ArchiveError::Persistence(other),
        }
    }
}

/// Chunked body of a download response.
pub type ByteStream = BoxStream<'static, Result<Bytes, ArchiveError>>;

/// What the caller streams back to the customer.
pub enum DownloadPayload {
    /// Exactly one file left: streamed as-is under its original name.
    Single {
        file_name: String,
        size: u64,
        body: ByteStream,
    },
    /// Several files: one zip, entries named by their original file names.
    Archive { file_name: String, body: ByteStream },
}

impl DownloadPayload {
    pub fn file_name(&self) -> &str {
        match self {
            DownloadPayload::Single { file_name, .. } => file_name,
            DownloadPayload::Archive { file_name, .. } => file_name,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, DownloadPayload::Archive { .. })
    }

    pub fn into_body(self) -> ByteStream {
        match self {
            DownloadPayload::Single { body, .. } => body,
            DownloadPayload::Archive { body, .. } => body,
        }
    }
}

impl std::fmt::Debug for DownloadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadPayload::Single {
                file_name, size, ..
            } => f
                .debug_struct("Single")
                .field("file_name", file_name)
                .field("size", size)
                .finish_non_exhaustive(),
            DownloadPayload::Archive { file_name, .. } => f
                .debug_struct("Archive")
                .field("file_name", file_name)
                .finish_non_exhaustive(),
        }
    }
}

/// Build the download for every non-deleted job under a token.
///
/// Reads the job repository and artifact store only; no state is mutated.
/// File refs whose artifact no longer exists on the backing store are
/// excluded with a warning, not an error.
pub async fn build_download(
    token: &TokenNumber,
    artifacts: &ArtifactStore,
) -> Result<DownloadPayload, ArchiveError> {
    let jobs = JobRepository::find_by_token(token).await?;
    let jobs: Vec<_> = jobs
        .into_iter()
        .filter(|job| job.status != JobStatus::Deleted)
        .collect();
    if jobs.is_empty() {
        return Err(ArchiveError::NotFound(format!(
            "no print jobs for token {}",
            token
        )));
    }

    let mut files: Vec<FileRef> = Vec::new();
    for job in &jobs {
        for file in &job.files {
            let Some(path) = file.file_path.as_deref() else {
                continue;
            };
            if artifacts.exists(path).await? {
                files.push(file.clone());
            } else {
                tracing::warn!(
                    "skipping missing artifact for job {} ({})",
                    job.id,
                    path
                );
            }
        }
    }
    if files.is_empty() {
        return Err(ArchiveError::NotFound(format!(
            "no downloadable files for token {}",
            token
        )));
    }

    if files.len() == 1 {
        let mut files = files;
        single_payload(files.remove(0), artifacts).await
    } else {
        archive_payload(token, files, artifacts).await
    }
}

async fn single_payload(
    file: FileRef,
    artifacts: &ArtifactStore,
) -> Result<DownloadPayload, ArchiveError> {
    let Some(path) = file.file_path.as_deref() else {
        return Err(ArchiveError::NotFound(
            "file reference has no artifact path".into(),
        ));
    };
    let stream = artifacts.stream(path).await?;
    let body = stream
        .map_err(|e| ArchiveError::Artifact(e.into()))
        .boxed();

    Ok(DownloadPayload::Single {
        file_name: file.file_name,
        size: file.file_size,
        body,
    })
}

async fn archive_payload(
    token: &TokenNumber,
    files: Vec<FileRef>,
    artifacts: &ArtifactStore,
) -> Result<DownloadPayload, ArchiveError> {
    let spool = tempfile::tempfile()?;
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(String, Bytes)>(1);

    // the writer owns the zip; entries arrive one at a time over the channel
    let writer = tokio::task::spawn_blocking(move || -> Result<std::fs::File, ArchiveError> {
        let mut zip = ZipWriter::new(spool);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        while let Some((entry_name, bytes)) = rx.blocking_recv() {
            zip.start_file(entry_name, options)?;
            zip.write_all(&bytes)?;
        }
        let mut spool = zip.finish()?;
        spool.rewind()?;
        Ok(spool)
    });

    let mut seen = HashSet::new();
    let mut feed_error: Option<ArchiveError> = None;
    for file in files {
        let Some(path) = file.file_path.as_deref() else {
            continue;
        };
        match artifacts.get_bytes(path).await {
            Ok(bytes) => {
                let entry_name = unique_entry_name(&mut seen, &file.file_name);
                if tx.send((entry_name, bytes)).await.is_err() {
                    // writer bailed; its error surfaces below
                    break;
                }
            }
            Err(e) => {
                feed_error = Some(e.into());
                break;
            }
        }
    }
    drop(tx);

    let spool = writer.await??;
    if let Some(e) = feed_error {
        return Err(e);
    }

    let file = tokio::fs::File::from_std(spool);
    let body = ReaderStream::with_capacity(file, STREAM_CHUNK)
        .map_err(ArchiveError::from)
        .boxed();

    Ok(DownloadPayload::Archive {
        file_name: format!("printjob-{}.zip", token),
        body,
    })
}

/// Entry name for the zip, suffixed when a batch repeats a file name.
fn unique_entry_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem} ({n}).{ext}"),
            None => format!("{name} ({n})"),
        };
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
