//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    // Print job table
    db.query(PRINT_JOB_SCHEMA).await?;

    // Shop table
    db.query(SHOP_SCHEMA).await?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Print job table schema.
///
/// Timestamps are stored as RFC 3339 strings; lexicographic order on them
/// equals chronological order, which the day-window queries rely on.
const PRINT_JOB_SCHEMA: &str = r#"
-- Print job table, one record per upload batch job
DEFINE TABLE IF NOT EXISTS print_job SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS shop_id ON print_job TYPE string;
DEFINE FIELD IF NOT EXISTS token_number ON print_job TYPE string;
DEFINE FIELD IF NOT EXISTS print_type ON print_job TYPE string ASSERT $value IN ["bw", "color"];
DEFINE FIELD IF NOT EXISTS print_side ON print_job TYPE string ASSERT $value IN ["single", "double"];
DEFINE FIELD IF NOT EXISTS copies ON print_job TYPE int DEFAULT 1;
DEFINE FIELD IF NOT EXISTS status ON print_job TYPE string DEFAULT "pending"
    ASSERT $value IN ["pending", "completed", "expired", "deleted"];
DEFINE FIELD IF NOT EXISTS files ON print_job TYPE array DEFAULT [];
DEFINE FIELD IF NOT EXISTS files[*] ON print_job TYPE object;
DEFINE FIELD IF NOT EXISTS files[*].fileName ON print_job TYPE string;
DEFINE FIELD IF NOT EXISTS files[*].filePath ON print_job TYPE option<string>;
DEFINE FIELD IF NOT EXISTS files[*].fileSize ON print_job TYPE int DEFAULT 0;
DEFINE FIELD IF NOT EXISTS uploaded_at ON print_job TYPE string;

-- Indexes for the token, shop-day and sweep queries
DEFINE INDEX IF NOT EXISTS job_token ON print_job FIELDS token_number;
DEFINE INDEX IF NOT EXISTS job_shop ON print_job FIELDS shop_id;
DEFINE INDEX IF NOT EXISTS job_status ON print_job FIELDS status;
DEFINE INDEX IF NOT EXISTS job_shop_uploaded ON print_job FIELDS shop_id, uploaded_at;
"#;

/// Shop table schema.
const SHOP_SCHEMA: &str = r#"
-- Shop table for queue-facing shop state
DEFINE TABLE IF NOT EXISTS shop SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS name ON shop TYPE string;
DEFINE FIELD IF NOT EXISTS bw_cost_per_page ON shop TYPE float DEFAULT 0.0;
DEFINE FIELD IF NOT EXISTS color_cost_per_page ON shop TYPE float DEFAULT 0.0;
DEFINE FIELD IF NOT EXISTS is_accepting_uploads ON shop TYPE bool DEFAULT true;
DEFINE FIELD IF NOT EXISTS created_at ON shop TYPE string;
"#;
