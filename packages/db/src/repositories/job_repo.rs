//! Print job repository.

use chrono::{DateTime, Utc};
use print_core::{FileRef, JobId, JobStatus, PrintJob, PrintSide, PrintType, ShopId, TokenNumber};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

/// Repository for print job persistence operations.
pub struct JobRepository;

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct PrintJobRecord {
    id: Option<Thing>,
    shop_id: ShopId,
    token_number: TokenNumber,
    print_type: PrintType,
    print_side: PrintSide,
    copies: u32,
    status: JobStatus,
    files: Vec<FileRef>,
    uploaded_at: DateTime<Utc>,
}

impl PrintJobRecord {
    fn into_job(self) -> PrintJob {
        // Record key is the job's ULID, written by create()
        let id_str = self.id.as_ref().map(|t| t.id.to_raw()).unwrap_or_default();
        let id = JobId::parse(&id_str).unwrap_or_else(|_| JobId::new());
        PrintJob {
            id,
            shop_id: self.shop_id,
            token_number: self.token_number,
            print_type: self.print_type,
            print_side: self.print_side,
            copies: self.copies,
            status: self.status,
            files: self.files,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Struct for creating jobs - the record id is passed separately.
#[derive(Debug, Clone, Serialize)]
struct PrintJobCreate {
    shop_id: ShopId,
    token_number: TokenNumber,
    print_type: PrintType,
    print_side: PrintSide,
    copies: u32,
    status: JobStatus,
    files: Vec<FileRef>,
    uploaded_at: DateTime<Utc>,
}

/// Format a window bound so it compares correctly against stored RFC 3339
/// strings: the truncated form is a prefix of any timestamp in the same
/// second, so fractional-second values at the boundary still sort inside.
fn window_bound(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

impl JobRepository {
    /// Create a new print job in the database.
    pub async fn create(job: &PrintJob) -> Result<PrintJob, DbError> {
        let db = get_db()?;

        let create_data = PrintJobCreate {
            shop_id: job.shop_id,
            token_number: job.token_number.clone(),
            print_type: job.print_type,
            print_side: job.print_side,
            copies: job.copies,
            status: job.status,
            files: job.files.clone(),
            uploaded_at: job.uploaded_at,
        };

        let record: Option<PrintJobRecord> = db
            .create(("print_job", job.id.to_string()))
            .content(create_data)
            .await?;

        record
            .map(PrintJobRecord::into_job)
            .ok_or_else(|| DbError::Query("Failed to create print job".into()))
    }

    /// Get a print job by ID.
    pub async fn get(id: JobId) -> Result<PrintJob, DbError> {
        let db = get_db()?;

        let record: Option<PrintJobRecord> = db.select(("print_job", id.to_string())).await?;

        record
            .map(PrintJobRecord::into_job)
            .ok_or_else(|| DbError::NotFound(format!("Print job not found: {}", id)))
    }

    /// All jobs presently tagged with a token, oldest first.
    pub async fn find_by_token(token: &TokenNumber) -> Result<Vec<PrintJob>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "SELECT * FROM print_job WHERE token_number = $tok ORDER BY uploaded_at ASC",
            )
            .bind(("tok", token.as_str().to_string()))
            .await?;

        let records: Vec<PrintJobRecord> = result.take(0)?;

        Ok(records.into_iter().map(PrintJobRecord::into_job).collect())
    }

    /// Jobs for a shop uploaded within `[start, end)` carrying one of the
    /// given statuses, newest first.
    pub async fn find_for_shop_window(
        shop_id: ShopId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[JobStatus],
    ) -> Result<Vec<PrintJob>, DbError> {
        let db = get_db()?;

        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let mut result = db
            .query(
                r#"
                SELECT * FROM print_job
                WHERE shop_id = $shop_id
                    AND uploaded_at >= $start AND uploaded_at < $end
                    AND status IN $statuses
                ORDER BY uploaded_at DESC
                "#,
            )
            .bind(("shop_id", shop_id.to_string()))
            .bind(("start", window_bound(start)))
            .bind(("end", window_bound(end)))
            .bind(("statuses", statuses))
            .await?;

        let records: Vec<PrintJobRecord> = result.take(0)?;

        Ok(records.into_iter().map(PrintJobRecord::into_job).collect())
    }

    /// Jobs still pending whose upload predates `cutoff`.
    pub async fn find_stale_pending(cutoff: DateTime<Utc>) -> Result<Vec<PrintJob>, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                r#"
                SELECT * FROM print_job
                WHERE status = "pending" AND uploaded_at < $cutoff
                ORDER BY uploaded_at ASC
                "#,
            )
            .bind(("cutoff", window_bound(cutoff)))
            .await?;

        let records: Vec<PrintJobRecord> = result.take(0)?;

        Ok(records.into_iter().map(PrintJobRecord::into_job).collect())
    }

    /// Set a job's status and replace its file list in one record update.
    ///
    /// Callers pass the cleared file list when the transition implies the
    /// backing artifacts are gone.
    pub async fn set_status_and_files(
        id: JobId,
        status: JobStatus,
        files: Vec<FileRef>,
    ) -> Result<PrintJob, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE type::thing('print_job', $id) SET status = $status, files = $files RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .bind(("files", files))
            .await?;

        let records: Vec<PrintJobRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(PrintJobRecord::into_job)
            .ok_or_else(|| DbError::NotFound(format!("Print job not found: {}", id)))
    }

    /// Apply a status to every job under a token, clearing all artifact
    /// paths.
    ///
    /// The document store only guarantees atomicity per record, so this is a
    /// sequence of idempotent single-record updates: a re-run after a partial
    /// failure converges on the same final state. Returns the updated jobs.
    pub async fn set_batch_status(
        token: &TokenNumber,
        status: JobStatus,
    ) -> Result<Vec<PrintJob>, DbError> {
        let jobs = Self::find_by_token(token).await?;

        let mut updated = Vec::with_capacity(jobs.len());
        for job in jobs {
            let cleared = job.cleared_files();
            updated.push(Self::set_status_and_files(job.id, status, cleared).await?);
        }

        Ok(updated)
    }
}
