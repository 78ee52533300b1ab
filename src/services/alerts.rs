//! Low-stock alerts.
//!
//! An inventory row raises an alert when the product sold in that warehouse
//! recently and its stock is below the product's reorder threshold. The
//! estimate of days left assumes sales continue at the recent daily average.

use crate::{
    entities::{inventory, product, sale, supplier, warehouse},
    errors::ServiceError,
};
use chrono::{Duration, Utc};
use sea_orm::{
    sea_query::{Alias, Condition, Expr, JoinType, Order, Query},
    ConnectionTrait, DatabaseConnection, FromQueryResult,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: u64 = 100;
pub const DEFAULT_OFFSET: u64 = 0;

/// Reorder threshold used when a product has no positive override.
pub fn default_threshold(product_type: Option<&str>) -> i32 {
    match product_type {
        Some("electronics") => 15,
        Some("apparel") => 25,
        Some("consumable") => 50,
        _ => 20,
    }
}

/// The product's own threshold when positive, else the type default.
pub fn effective_threshold(low_stock_threshold: Option<i32>, product_type: Option<&str>) -> i32 {
    match low_stock_threshold {
        Some(threshold) if threshold > 0 => threshold,
        _ => default_threshold(product_type),
    }
}

/// Days until stock runs out at the average daily rate, rounded up.
pub fn days_until_stockout(current_stock: i32, total_sold: i64, window_days: u32) -> Option<i64> {
    if total_sold <= 0 || window_days == 0 {
        return None;
    }
    let stock = i64::from(current_stock.max(0));
    let numerator = stock * i64::from(window_days);
    Some((numerator + total_sold - 1) / total_sold)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SupplierContact {
    pub id: i32,
    pub name: String,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LowStockAlert {
    pub product_id: i32,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: i32,
    pub warehouse_name: String,
    pub current_stock: i32,
    pub threshold: i32,
    pub days_until_stockout: Option<i64>,
    pub supplier: Option<SupplierContact>,
}

/// Page selection applied to candidate rows before threshold filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPage {
    pub limit: u64,
    pub offset: u64,
}

impl Default for AlertPage {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CandidateRow {
    product_id: i32,
    product_name: String,
    sku: String,
    product_type: Option<String>,
    low_stock_threshold: Option<i32>,
    warehouse_id: i32,
    warehouse_name: String,
    current_stock: i32,
    supplier_id: Option<i32>,
    supplier_name: Option<String>,
    supplier_contact_email: Option<String>,
    total_sold: i64,
}

impl CandidateRow {
    fn into_alert(self, window_days: u32) -> Option<LowStockAlert> {
        let threshold =
            effective_threshold(self.low_stock_threshold, self.product_type.as_deref());
        if self.current_stock >= threshold {
            return None;
        }

        let supplier = match (self.supplier_id, self.supplier_name) {
            (Some(id), Some(name)) => Some(SupplierContact {
                id,
                name,
                contact_email: self.supplier_contact_email,
            }),
            _ => None,
        };

        Some(LowStockAlert {
            product_id: self.product_id,
            product_name: self.product_name,
            sku: self.sku,
            warehouse_id: self.warehouse_id,
            warehouse_name: self.warehouse_name,
            current_stock: self.current_stock,
            threshold,
            days_until_stockout: days_until_stockout(
                self.current_stock,
                self.total_sold,
                window_days,
            ),
            supplier,
        })
    }
}

/// Read-only service computing low-stock alerts for a company
#[derive(Clone)]
pub struct AlertService {
    db: Arc<DatabaseConnection>,
    recent_sales_days: u32,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>, recent_sales_days: u32) -> Self {
        Self {
            db,
            recent_sales_days,
        }
    }

    pub fn recent_sales_days(&self) -> u32 {
        self.recent_sales_days
    }

    #[instrument(skip(self))]
    pub async fn low_stock_alerts(
        &self,
        company_id: i32,
        page: AlertPage,
    ) -> Result<Vec<LowStockAlert>, ServiceError> {
        let rows = self.candidate_rows(company_id, page).await?;
        debug!(candidates = rows.len(), "Loaded low-stock candidates");

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_alert(self.recent_sales_days))
            .collect())
    }

    /// Inventory rows of the company's products in the company's warehouses
    /// that sold within the window, ordered by inventory id.
    async fn candidate_rows(
        &self,
        company_id: i32,
        page: AlertPage,
    ) -> Result<Vec<CandidateRow>, ServiceError> {
        let cutoff = (Utc::now() - Duration::days(i64::from(self.recent_sales_days))).fixed_offset();
        let recent = Alias::new("recent_sales");
        let total_sold = Alias::new("total_sold");

        let recent_sales = Query::select()
            .column(sale::Column::ProductId)
            .column(sale::Column::WarehouseId)
            .expr_as(Expr::col(sale::Column::Quantity).sum(), total_sold.clone())
            .from(sale::Entity)
            .and_where(Expr::col(sale::Column::SaleDate).gte(cutoff))
            .group_by_columns([sale::Column::ProductId, sale::Column::WarehouseId])
            .to_owned();

        let query = Query::select()
            .expr_as(
                Expr::col((product::Entity, product::Column::Id)),
                Alias::new("product_id"),
            )
            .expr_as(
                Expr::col((product::Entity, product::Column::Name)),
                Alias::new("product_name"),
            )
            .column((product::Entity, product::Column::Sku))
            .column((product::Entity, product::Column::ProductType))
            .column((product::Entity, product::Column::LowStockThreshold))
            .expr_as(
                Expr::col((warehouse::Entity, warehouse::Column::Id)),
                Alias::new("warehouse_id"),
            )
            .expr_as(
                Expr::col((warehouse::Entity, warehouse::Column::Name)),
                Alias::new("warehouse_name"),
            )
            .expr_as(
                Expr::col((inventory::Entity, inventory::Column::Quantity)),
                Alias::new("current_stock"),
            )
            .expr_as(
                Expr::col((supplier::Entity, supplier::Column::Id)),
                Alias::new("supplier_id"),
            )
            .expr_as(
                Expr::col((supplier::Entity, supplier::Column::Name)),
                Alias::new("supplier_name"),
            )
            .expr_as(
                Expr::col((supplier::Entity, supplier::Column::ContactEmail)),
                Alias::new("supplier_contact_email"),
            )
            .expr_as(
                Expr::col((recent.clone(), total_sold.clone())),
                total_sold.clone(),
            )
            .from(inventory::Entity)
            .inner_join(
                product::Entity,
                Expr::col((product::Entity, product::Column::Id))
                    .equals((inventory::Entity, inventory::Column::ProductId)),
            )
            .inner_join(
                warehouse::Entity,
                Expr::col((warehouse::Entity, warehouse::Column::Id))
                    .equals((inventory::Entity, inventory::Column::WarehouseId)),
            )
            .join_subquery(
                JoinType::InnerJoin,
                recent_sales,
                recent.clone(),
                Condition::all()
                    .add(
                        Expr::col((recent.clone(), sale::Column::ProductId))
                            .equals((inventory::Entity, inventory::Column::ProductId)),
                    )
                    .add(
                        Expr::col((recent.clone(), sale::Column::WarehouseId))
                            .equals((inventory::Entity, inventory::Column::WarehouseId)),
                    ),
            )
            .left_join(
                supplier::Entity,
                Expr::col((supplier::Entity, supplier::Column::Id))
                    .equals((product::Entity, product::Column::SupplierId)),
            )
            .and_where(Expr::col((product::Entity, product::Column::CompanyId)).eq(company_id))
            .and_where(Expr::col((warehouse::Entity, warehouse::Column::CompanyId)).eq(company_id))
            .and_where(Expr::col((recent, total_sold)).gt(0))
            .order_by((inventory::Entity, inventory::Column::Id), Order::Asc)
            .limit(page.limit)
            .offset(page.offset)
            .to_owned();

        let backend = self.db.get_database_backend();
        Ok(CandidateRow::find_by_statement(backend.build(&query))
            .all(&*self.db)
            .await?)
    }
}
