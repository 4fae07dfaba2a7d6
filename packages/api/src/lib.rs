//! Operator-facing operations for the print queue.
//!
//! This crate wires the lifecycle manager, notification bus, artifact store
//! and archive builder into one [`App`] and exposes the operations a
//! transport layer calls:
//! - job creation from the upload collaborator
//! - operator status updates, single and per token batch
//! - the shop-today listing, token status lookup and batch download
//! - the shop upload toggle

mod app;
mod error;
mod jobs;
mod shops;

pub use app::{App, AppConfig, init_app, init_tracing};
pub use error::ApiError;
pub use jobs::{CreateJobRequest, JobStatusReport};

// Re-export core types for convenience
pub use archive::DownloadPayload;
pub use lifecycle::BatchStatusChange;
pub use print_core::{
    FileRef, JobId, JobStatus, PrintJob, PrintSide, PrintType, Shop, ShopEvent, ShopId,
    TokenNumber,
};
