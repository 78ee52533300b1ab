pub mod alerts;
pub mod common;
pub mod inventory;
pub mod products;

use crate::db::DbPool;
use crate::services::{alerts::AlertService, inventory::InventoryService, products::ProductService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub inventory: Arc<InventoryService>,
    pub alerts: Arc<AlertService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, recent_sales_days: u32) -> Self {
        Self {
            products: Arc::new(ProductService::new(db_pool.clone())),
            inventory: Arc::new(InventoryService::new(db_pool.clone())),
            alerts: Arc::new(AlertService::new(db_pool, recent_sales_days)),
        }
    }
}
