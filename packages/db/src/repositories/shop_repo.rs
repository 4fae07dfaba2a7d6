//! Shop repository.

use chrono::{DateTime, Utc};
use print_core::{Shop, ShopId};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

/// Repository for shop persistence operations.
pub struct ShopRepository;

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct ShopRecord {
    id: Option<Thing>,
    name: String,
    bw_cost_per_page: f64,
    color_cost_per_page: f64,
    is_accepting_uploads: bool,
    created_at: DateTime<Utc>,
}

impl ShopRecord {
    fn into_shop(self) -> Shop {
        let id_str = self.id.as_ref().map(|t| t.id.to_raw()).unwrap_or_default();
        let id = ShopId::parse(&id_str).unwrap_or_else(|_| ShopId::new());
        Shop {
            id,
            name: self.name,
            bw_cost_per_page: self.bw_cost_per_page,
            color_cost_per_page: self.color_cost_per_page,
            is_accepting_uploads: self.is_accepting_uploads,
            created_at: self.created_at,
        }
    }
}

/// Struct for creating shops - the record id is passed separately.
#[derive(Debug, Clone, Serialize)]
struct ShopCreate {
    name: String,
    bw_cost_per_page: f64,
    color_cost_per_page: f64,
    is_accepting_uploads: bool,
    created_at: DateTime<Utc>,
}

impl ShopRepository {
    /// Create a new shop in the database.
    pub async fn create(shop: &Shop) -> Result<Shop, DbError> {
        let db = get_db()?;

        let create_data = ShopCreate {
            name: shop.name.clone(),
            bw_cost_per_page: shop.bw_cost_per_page,
            color_cost_per_page: shop.color_cost_per_page,
            is_accepting_uploads: shop.is_accepting_uploads,
            created_at: shop.created_at,
        };

        let record: Option<ShopRecord> = db
            .create(("shop", shop.id.to_string()))
            .content(create_data)
            .await?;

        record
            .map(ShopRecord::into_shop)
            .ok_or_else(|| DbError::Query("Failed to create shop".into()))
    }

    /// Get a shop by ID.
    pub async fn get(id: ShopId) -> Result<Shop, DbError> {
        let db = get_db()?;

        let record: Option<ShopRecord> = db.select(("shop", id.to_string())).await?;

        record
            .map(ShopRecord::into_shop)
            .ok_or_else(|| DbError::NotFound(format!("Shop not found: {}", id)))
    }

    /// Flip whether the shop accepts uploads.
    pub async fn set_accepting_uploads(id: ShopId, accepting: bool) -> Result<Shop, DbError> {
        let db = get_db()?;

        let mut result = db
            .query(
                "UPDATE type::thing('shop', $id) SET is_accepting_uploads = $accepting RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("accepting", accepting))
            .await?;

        let records: Vec<ShopRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(ShopRecord::into_shop)
            .ok_or_else(|| DbError::NotFound(format!("Shop not found: {}", id)))
    }
}
