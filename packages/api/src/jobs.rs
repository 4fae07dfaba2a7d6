//! Job operations.

use archive::DownloadPayload;
use chrono::{Duration, Utc};
use db::repositories::JobRepository;
use lifecycle::{BatchStatusChange, NewPrintJob};
use print_core::{
    FileRef, JobId, JobStatus, PrintJob, PrintSide, PrintType, ShopId, TokenNumber,
};
use serde::{Deserialize, Serialize};

use crate::{ApiError, App};

fn default_copies() -> u32 {
    1
}

/// Request type for creating a job, consumed from the upload collaborator
/// once the files are on the artifact store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub shop_id: ShopId,
    /// Token printed on the customer slip; generated when absent.
    #[serde(default)]
    pub token_number: Option<TokenNumber>,
    pub print_type: PrintType,
    pub print_side: PrintSide,
    #[serde(default = "default_copies")]
    pub copies: u32,
    pub files: Vec<FileRef>,
}

/// Status record a customer sees when checking their token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub file_names: Vec<String>,
    pub print_type: PrintType,
    pub print_side: PrintSide,
    pub copies: u32,
}

impl App {
    /// Create a pending job and announce it to the shop room.
    ///
    /// Returns the persisted job; its token is the one the customer polls
    /// with and the operator fulfils by.
    pub async fn create_job(&self, request: CreateJobRequest) -> Result<PrintJob, ApiError> {
        let token_number = request
            .token_number
            .unwrap_or_else(TokenNumber::generate);

        let job = self
            .lifecycle
            .create_job(NewPrintJob {
                shop_id: request.shop_id,
                token_number,
                print_type: request.print_type,
                print_side: request.print_side,
                copies: request.copies,
                files: request.files,
            })
            .await?;

        Ok(job)
    }

    /// Jobs a shop uploaded today (UTC), newest first.
    ///
    /// Deleted jobs stay out of the operator's day view; the status lookup
    /// by token remains unfiltered.
    pub async fn jobs_for_shop_today(&self, shop_id: ShopId) -> Result<Vec<PrintJob>, ApiError> {
        let start = Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        let end = start + Duration::days(1);

        let jobs = JobRepository::find_for_shop_window(
            shop_id,
            start,
            end,
            &[JobStatus::Pending, JobStatus::Completed, JobStatus::Expired],
        )
        .await?;

        Ok(jobs)
    }

    /// Status lookup by token.
    ///
    /// Unlike the day listing this is unfiltered: a deleted batch still
    /// reports `deleted` to the customer polling it.
    pub async fn job_status(&self, token: &TokenNumber) -> Result<JobStatusReport, ApiError> {
        let jobs = JobRepository::find_by_token(token).await?;
        let Some(first) = jobs.first() else {
            return Err(ApiError::NotFound(format!(
                "no print jobs for token {}",
                token
            )));
        };

        let file_names = jobs
            .iter()
            .flat_map(|job| job.files.iter().map(|f| f.file_name.clone()))
            .collect();

        Ok(JobStatusReport {
            status: first.status,
            file_names,
            print_type: first.print_type,
            print_side: first.print_side,
            copies: first.copies,
        })
    }

    /// Transition a single job; see the lifecycle manager for semantics.
    pub async fn update_job_status(
        &self,
        job_id: JobId,
        status: JobStatus,
    ) -> Result<PrintJob, ApiError> {
        Ok(self.lifecycle.update_single_status(job_id, status).await?)
    }

    /// Transition every job under a token.
    pub async fn update_batch_status(
        &self,
        token: &TokenNumber,
        status: JobStatus,
    ) -> Result<BatchStatusChange, ApiError> {
        Ok(self.lifecycle.update_batch_status(token, status).await?)
    }

    /// Soft-delete a single job; idempotent for already-deleted jobs.
    pub async fn delete_job(&self, job_id: JobId) -> Result<PrintJob, ApiError> {
        Ok(self.lifecycle.delete_job(job_id).await?)
    }

    /// Soft-delete every job under a token.
    pub async fn delete_batch(&self, token: &TokenNumber) -> Result<BatchStatusChange, ApiError> {
        Ok(self.lifecycle.delete_batch(token).await?)
    }

    /// Stream the downloadable files of a token's non-deleted jobs.
    pub async fn download_batch(&self, token: &TokenNumber) -> Result<DownloadPayload, ApiError> {
        Ok(archive::build_download(token, &self.artifacts).await?)
    }
}
