//! Shop operations.

use db::repositories::ShopRepository;
use print_core::{Shop, ShopId};

use crate::{ApiError, App};

impl App {
    /// Shop details shown on the customer upload page.
    pub async fn shop_details(&self, shop_id: ShopId) -> Result<Shop, ApiError> {
        Ok(ShopRepository::get(shop_id).await?)
    }

    /// Toggle whether the shop accepts uploads and tell the dashboard.
    pub async fn toggle_accepting_uploads(
        &self,
        shop_id: ShopId,
        accepting: bool,
    ) -> Result<Shop, ApiError> {
        Ok(self.lifecycle.set_shop_accepting(shop_id, accepting).await?)
    }
}
