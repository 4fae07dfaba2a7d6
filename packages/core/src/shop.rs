//! Shop domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopId(pub Ulid);

impl ShopId {
    /// Create a new unique shop ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a shop ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for ShopId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shop owns a print queue and a dashboard room.
///
/// Account details (credentials, contact data, QR codes) live with the
/// account service; this record carries what the queue itself needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Unique identifier for this shop.
    pub id: ShopId,
    /// Display name shown to customers.
    pub name: String,
    /// Price per black-and-white page.
    pub bw_cost_per_page: f64,
    /// Price per color page.
    pub color_cost_per_page: f64,
    /// Whether the shop currently accepts new uploads.
    pub is_accepting_uploads: bool,
    /// When the shop record was created.
    pub created_at: DateTime<Utc>,
}

impl Shop {
    /// Create a new shop accepting uploads.
    pub fn new(name: impl Into<String>, bw_cost_per_page: f64, color_cost_per_page: f64) -> Self {
        Self {
            id: ShopId::new(),
            name: name.into(),
            bw_cost_per_page,
            color_cost_per_page,
            is_accepting_uploads: true,
            created_at: Utc::now(),
        }
    }
}
