//! Event types delivered to shop dashboard rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FileRef, JobId, JobStatus, PrintSide, PrintType, TokenNumber};

/// Events published to a shop's room after the corresponding store mutation
/// committed. Variant and field names are the wire names the dashboard
/// subscribes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ShopEvent {
    /// A customer uploaded a new batch.
    #[serde(rename_all = "camelCase")]
    NewBatchPrintJob {
        id: JobId,
        token: TokenNumber,
        files: Vec<FileRef>,
        print_type: PrintType,
        print_side: PrintSide,
        copies: u32,
        status: JobStatus,
        upload_time: DateTime<Utc>,
    },

    /// A single job changed status.
    #[serde(rename_all = "camelCase")]
    JobStatusUpdate {
        id: JobId,
        token: TokenNumber,
        status: JobStatus,
    },

    /// Every job under a token changed status together.
    #[serde(rename_all = "camelCase")]
    BatchStatusUpdate {
        token: TokenNumber,
        status: JobStatus,
        count: u64,
    },

    /// The shop toggled whether it accepts uploads.
    #[serde(rename_all = "camelCase")]
    ShopStatusUpdate { is_accepting_uploads: bool },
}

impl ShopEvent {
    /// Get the token associated with this event, if any.
    pub fn token(&self) -> Option<&TokenNumber> {
        match self {
            ShopEvent::NewBatchPrintJob { token, .. } => Some(token),
            ShopEvent::JobStatusUpdate { token, .. } => Some(token),
            ShopEvent::BatchStatusUpdate { token, .. } => Some(token),
            ShopEvent::ShopStatusUpdate { .. } => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            ShopEvent::NewBatchPrintJob { token, files, .. } => {
                format!("new batch {} ({} files)", token, files.len())
            }
            ShopEvent::JobStatusUpdate { id, status, .. } => {
                format!("job {} -> {}", id, status)
            }
            ShopEvent::BatchStatusUpdate {
                token,
                status,
                count,
            } => {
                format!("batch {} -> {} ({} jobs)", token, status, count)
            }
            ShopEvent::ShopStatusUpdate {
                is_accepting_uploads,
            } => {
                if *is_accepting_uploads {
                    "shop accepting uploads".to_string()
                } else {
                    "shop paused uploads".to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_under_wire_names() {
        let event = ShopEvent::BatchStatusUpdate {
            token: TokenNumber::new("T7K2M9"),
            status: JobStatus::Completed,
            count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "batchStatusUpdate");
        assert_eq!(json["token"], "T7K2M9");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["count"], 3);

        let toggle = ShopEvent::ShopStatusUpdate {
            is_accepting_uploads: false,
        };
        let json = serde_json::to_value(&toggle).unwrap();
        assert_eq!(json["event"], "shopStatusUpdate");
        assert_eq!(json["isAcceptingUploads"], false);
    }
}
