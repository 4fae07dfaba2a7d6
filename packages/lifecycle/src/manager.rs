//! Lifecycle manager: the single writer for print job state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use db::repositories::{JobRepository, ShopRepository};
use print_core::{
    FileRef, JobId, JobStatus, PrintJob, PrintSide, PrintType, Shop, ShopEvent, ShopId,
    TokenNumber, Transition,
};
use realtime::NotificationBus;
use serde::{Deserialize, Serialize};
use storage::ArtifactStore;

use crate::LifecycleError;
use crate::token_locks::TokenLocks;

/// Input consumed from the upload collaborator: descriptors of files already
/// placed on the artifact store.
#[derive(Debug, Clone)]
pub struct NewPrintJob {
    pub shop_id: ShopId,
    pub token_number: TokenNumber,
    pub print_type: PrintType,
    pub print_side: PrintSide,
    pub copies: u32,
    pub files: Vec<FileRef>,
}

/// Result of a token-scoped status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatusChange {
    pub token: TokenNumber,
    pub status: JobStatus,
    pub count: u64,
}

/// Orchestrates file cleanup, repository mutation and event publication as
/// one logical unit per job or per token batch.
pub struct JobLifecycle {
    artifacts: ArtifactStore,
    bus: NotificationBus,
    locks: TokenLocks,
}

impl JobLifecycle {
    pub fn new(artifacts: ArtifactStore, bus: NotificationBus) -> Self {
        Self {
            artifacts,
            bus,
            locks: TokenLocks::new(),
        }
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Persist a new pending job and announce it to the shop room.
    pub async fn create_job(&self, new: NewPrintJob) -> Result<PrintJob, LifecycleError> {
        let job = PrintJob::new(
            new.shop_id,
            new.token_number,
            new.print_type,
            new.print_side,
            new.files,
        )
        .with_copies(new.copies);
        job.validate()?;

        let created = JobRepository::create(&job).await?;

        self.bus.publish(
            created.shop_id,
            ShopEvent::NewBatchPrintJob {
                id: created.id,
                token: created.token_number.clone(),
                files: created.files.clone(),
                print_type: created.print_type,
                print_side: created.print_side,
                copies: created.copies,
                status: created.status,
                upload_time: created.uploaded_at,
            },
        );

        Ok(created)
    }

    /// Transition a single job.
    ///
    /// Repeating the job's current status is an idempotent no-op; any other
    /// transition out of a terminal state is rejected before a file is
    /// touched. On a real transition the backing artifacts are deleted best
    /// effort, the status and cleared paths committed in one record write,
    /// and a `jobStatusUpdate` published after the commit.
    pub async fn update_single_status(
        &self,
        job_id: JobId,
        new_status: JobStatus,
    ) -> Result<PrintJob, LifecycleError> {
        // resolve the token outside the lock, then re-read under it
        let job = JobRepository::get(job_id).await?;
        let _guard = self.locks.acquire(job.token_number.as_str()).await;
        let job = JobRepository::get(job_id).await?;

        match job.status.check_transition(new_status)? {
            Transition::Noop => return Ok(job),
            Transition::Apply => {}
        }

        self.cleanup_files(&job).await;

        let updated =
            JobRepository::set_status_and_files(job.id, new_status, job.cleared_files()).await?;

        self.bus.publish(
            updated.shop_id,
            ShopEvent::JobStatusUpdate {
                id: updated.id,
                token: updated.token_number.clone(),
                status: updated.status,
            },
        );

        Ok(updated)
    }

    /// Transition every job presently tagged with a token.
    ///
    /// The whole batch validates before any file is touched; cleanup and the
    /// per-record commits run under the token lock, and one
    /// `batchStatusUpdate` is published after the last commit. A re-run after
    /// a partial failure converges: deleting a missing artifact is a no-op
    /// and the record updates are idempotent.
    pub async fn update_batch_status(
        &self,
        token: &TokenNumber,
        new_status: JobStatus,
    ) -> Result<BatchStatusChange, LifecycleError> {
        if !matches!(new_status, JobStatus::Completed | JobStatus::Deleted) {
            return Err(LifecycleError::InvalidBatchTarget(new_status));
        }

        let _guard = self.locks.acquire(token.as_str()).await;

        let jobs = JobRepository::find_by_token(token).await?;
        if jobs.is_empty() {
            return Err(LifecycleError::NotFound(format!(
                "no print jobs for token {}",
                token
            )));
        }

        // reject the whole batch before touching any file
        for job in &jobs {
            job.status.check_transition(new_status)?;
        }

        for job in &jobs {
            self.cleanup_files(job).await;
        }

        let updated = JobRepository::set_batch_status(token, new_status).await?;

        let change = BatchStatusChange {
            token: token.clone(),
            status: new_status,
            count: updated.len() as u64,
        };

        self.bus.publish(
            jobs[0].shop_id,
            ShopEvent::BatchStatusUpdate {
                token: change.token.clone(),
                status: change.status,
                count: change.count,
            },
        );

        Ok(change)
    }

    /// Soft-delete a single job. Deleting an already-deleted job is a no-op.
    pub async fn delete_job(&self, job_id: JobId) -> Result<PrintJob, LifecycleError> {
        self.update_single_status(job_id, JobStatus::Deleted).await
    }

    /// Soft-delete every job under a token.
    pub async fn delete_batch(
        &self,
        token: &TokenNumber,
    ) -> Result<BatchStatusChange, LifecycleError> {
        self.update_batch_status(token, JobStatus::Deleted).await
    }

    /// Persist the shop's upload toggle and announce it to the shop room.
    pub async fn set_shop_accepting(
        &self,
        shop_id: ShopId,
        accepting: bool,
    ) -> Result<Shop, LifecycleError> {
        let shop = ShopRepository::set_accepting_uploads(shop_id, accepting).await?;

        self.bus.publish(
            shop.id,
            ShopEvent::ShopStatusUpdate {
                is_accepting_uploads: shop.is_accepting_uploads,
            },
        );

        Ok(shop)
    }

    /// Expire jobs still pending whose upload predates `cutoff`.
    ///
    /// Runs token by token under the same locks as the operator paths and
    /// applies the same cleanup discipline. Returns how many jobs expired.
    pub async fn expire_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, LifecycleError> {
        let stale = JobRepository::find_stale_pending(cutoff).await?;

        let mut by_token: BTreeMap<String, Vec<PrintJob>> = BTreeMap::new();
        for job in stale {
            by_token
                .entry(job.token_number.as_str().to_string())
                .or_default()
                .push(job);
        }

        let mut expired = 0u64;
        for (token, jobs) in by_token {
            let _guard = self.locks.acquire(&token).await;
            for job in jobs {
                // the scan ran outside the lock; re-check under it
                let job = match JobRepository::get(job.id).await {
                    Ok(job) => job,
                    Err(db::DbError::NotFound(_)) => continue,
                    Err(e) => return Err(e.into()),
                };
                if job.status != JobStatus::Pending {
                    continue;
                }

                self.cleanup_files(&job).await;

                let updated = JobRepository::set_status_and_files(
                    job.id,
                    JobStatus::Expired,
                    job.cleared_files(),
                )
                .await?;

                self.bus.publish(
                    updated.shop_id,
                    ShopEvent::JobStatusUpdate {
                        id: updated.id,
                        token: updated.token_number.clone(),
                        status: updated.status,
                    },
                );

                expired += 1;
            }
        }

        Ok(expired)
    }

    /// Best-effort deletion of every artifact backing a job.
    ///
    /// A missing or locked file must not block the others or abort the
    /// surrounding transition; each failure is logged with enough context
    /// for an operational audit.
    async fn cleanup_files(&self, job: &PrintJob) {
        for file in &job.files {
            let Some(path) = file.file_path.as_deref() else {
                continue;
            };
            if let Err(e) = self.artifacts.delete_if_exists(path).await {
                tracing::warn!(
                    "failed to delete artifact for job {} ({}): {}",
                    job.id,
                    path,
                    e
                );
            }
        }
    }
}
