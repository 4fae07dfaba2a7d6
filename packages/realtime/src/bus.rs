//! Connection admission and event publication.

use std::sync::Arc;

use print_core::{ShopEvent, ShopId};
use tokio::sync::broadcast;

use crate::rooms::RoomRegistry;

/// Notification bus configuration.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Origin a connection must declare to be admitted. `"*"` admits any.
    pub allowed_origin: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
        }
    }
}

impl RealtimeConfig {
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }

    /// Build a config from `REALTIME_ALLOWED_ORIGIN` (default `"*"`).
    pub fn from_env() -> Self {
        let allowed_origin = std::env::var("REALTIME_ALLOWED_ORIGIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "*".to_string());
        Self { allowed_origin }
    }
}

/// Notification bus errors.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("connection origin not allowed: {origin:?}")]
    OriginRejected { origin: Option<String> },
}

/// Origin declared by a connecting client during the handshake.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub origin: Option<String>,
}

impl Handshake {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
        }
    }
}

/// Room-scoped publish/subscribe bus for shop dashboards.
#[derive(Clone)]
pub struct NotificationBus {
    rooms: Arc<RoomRegistry>,
    allowed_origin: String,
}

impl NotificationBus {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            rooms: Arc::new(RoomRegistry::new()),
            allowed_origin: config.allowed_origin,
        }
    }

    /// Admit a connection.
    ///
    /// Checked before any room join is processed; a mismatched origin never
    /// gets a [`Connection`] to join with.
    pub fn connect(&self, handshake: Handshake) -> Result<Connection, RealtimeError> {
        if !self.origin_allowed(handshake.origin.as_deref()) {
            tracing::warn!(
                "rejected connection with origin {:?} (allowed: {})",
                handshake.origin,
                self.allowed_origin
            );
            return Err(RealtimeError::OriginRejected {
                origin: handshake.origin,
            });
        }
        Ok(Connection {
            rooms: Arc::clone(&self.rooms),
        })
    }

    fn origin_allowed(&self, origin: Option<&str>) -> bool {
        self.allowed_origin == "*" || origin == Some(self.allowed_origin.as_str())
    }

    /// Publish an event to a shop's room, fire-and-forget.
    ///
    /// An empty room is not an error; a committed state change is never
    /// rolled back because nobody was listening.
    pub fn publish(&self, shop_id: ShopId, event: ShopEvent) {
        let description = event.description();
        let delivered = self.rooms.publish(shop_id, event);
        tracing::debug!(
            "published to shop {}: {} ({} subscribers)",
            shop_id,
            description,
            delivered
        );
    }

    /// Direct access to the room table, for inspection.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }
}

/// An admitted connection. Dropping it (and the receivers it handed out)
/// leaves its rooms; empty rooms are pruned on the next publish.
pub struct Connection {
    rooms: Arc<RoomRegistry>,
}

impl Connection {
    /// Join a shop's room. Joining is explicit, never implied by connecting.
    pub fn join_shop(&self, shop_id: ShopId) -> broadcast::Receiver<ShopEvent> {
        self.rooms.join(shop_id)
    }
}
