use crate::{
    db::{is_foreign_key_violation, run_in_transaction},
    entities::{inventory, product, warehouse},
    errors::ServiceError,
};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const INVALID_REFERENCE: &str = "Invalid 'product_id' or 'warehouse_id'";

/// Stored stock level returned by [`InventoryService::set_stock_level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub inventory_id: i32,
    pub product_id: i32,
    pub warehouse_id: i32,
    pub quantity: i32,
}

impl From<inventory::Model> for StockLevel {
    fn from(row: inventory::Model) -> Self {
        Self {
            inventory_id: row.id,
            product_id: row.product_id,
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
        }
    }
}

/// Service for per-warehouse stock levels
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fails with a validation error unless both the product and the
    /// warehouse exist.
    #[instrument(skip(self))]
    pub async fn ensure_references(
        &self,
        product_id: i32,
        warehouse_id: i32,
    ) -> Result<(), ServiceError> {
        ensure_references(&*self.db, product_id, warehouse_id).await
    }

    /// Overwrites the stock level of a product in a warehouse, creating the
    /// row on first report.
    ///
    /// Concurrent reports for the same pair resolve on the unique
    /// `(product_id, warehouse_id)` index; the later one wins. A product or
    /// warehouse deleted since [`InventoryService::ensure_references`] ran is
    /// caught by the foreign keys.
    #[instrument(skip(self))]
    pub async fn set_stock_level(
        &self,
        product_id: i32,
        warehouse_id: i32,
        quantity: i32,
    ) -> Result<StockLevel, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::validation("'quantity' must be non-negative"));
        }

        // Write first: SQLite only retries a busy lock for a transaction that
        // has not read yet.
        let level = run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                inventory::Entity::insert(inventory::ActiveModel {
                    product_id: Set(product_id),
                    warehouse_id: Set(warehouse_id),
                    quantity: Set(quantity),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([
                        inventory::Column::ProductId,
                        inventory::Column::WarehouseId,
                    ])
                    .update_column(inventory::Column::Quantity)
                    .to_owned(),
                )
                .exec_without_returning(txn)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        ServiceError::validation(INVALID_REFERENCE)
                    } else {
                        ServiceError::DatabaseError(e)
                    }
                })?;

                let row = find_level(txn, product_id, warehouse_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InternalError("inventory row missing after upsert".to_string())
                    })?;
                debug!(inventory_id = row.id, "Stock level written");

                Ok::<_, ServiceError>(StockLevel::from(row))
            })
        })
        .await?;

        info!(
            inventory_id = level.inventory_id,
            quantity = level.quantity,
            "Inventory updated"
        );
        Ok(level)
    }
}

async fn ensure_references<C>(db: &C, product_id: i32, warehouse_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let product = product::Entity::find_by_id(product_id).one(db).await?;
    let warehouse = warehouse::Entity::find_by_id(warehouse_id).one(db).await?;
    if product.is_none() || warehouse.is_none() {
        return Err(ServiceError::validation(INVALID_REFERENCE));
    }
    Ok(())
}

async fn find_level<C>(
    db: &C,
    product_id: i32,
    warehouse_id: i32,
) -> Result<Option<inventory::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .filter(inventory::Column::WarehouseId.eq(warehouse_id))
        .one(db)
        .await?)
}
