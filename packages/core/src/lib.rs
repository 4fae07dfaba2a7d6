//! Core domain types for the print shop queue.
//!
//! This crate contains shared types used across all packages:
//! - PrintJob and JobStatus for customer print batches
//! - Shop for the owning shop record
//! - Events for real-time dashboard updates

mod events;
mod job;
mod shop;
mod token;

pub use events::ShopEvent;
pub use job::{
    FileRef, InvalidTransition, JobId, JobStatus, PrintJob, PrintSide, PrintType, Transition,
    ValidationError,
};
pub use shop::{Shop, ShopId};
pub use token::TokenNumber;
