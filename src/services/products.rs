use crate::{
    db::{is_foreign_key_violation, is_unique_violation, run_in_transaction},
    entities::{company, inventory, product, supplier},
    errors::ServiceError,
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Digits after the decimal point stored for `products.price`.
pub const PRICE_SCALE: u32 = 2;

/// Exclusive upper bound imposed by the `NUMERIC(10,2)` column.
const PRICE_LIMIT: i64 = 100_000_000;

/// Validated input for [`ProductService::create_product`].
#[derive(Debug, Clone, Validate)]
pub struct NewProduct {
    #[validate(length(
        min = 1,
        max = 255,
        message = "'name' must be at most 255 characters"
    ))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 64,
        message = "'sku' must be at most 64 characters"
    ))]
    pub sku: String,

    pub price: Decimal,

    #[validate(length(max = 64, message = "'product_type' must be at most 64 characters"))]
    pub product_type: Option<String>,

    #[validate(range(min = 0, message = "'low_stock_threshold' must be non-negative"))]
    pub low_stock_threshold: Option<i32>,

    pub company_id: Option<i32>,
    pub supplier_id: Option<i32>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            sku: sku.into(),
            price,
            product_type: None,
            low_stock_threshold: None,
            company_id: None,
            supplier_id: None,
        }
    }
}

/// Stock of a product in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseStock {
    pub warehouse_id: i32,
    pub quantity: i32,
}

/// A product together with its per-warehouse stock.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub total_stock: i64,
    pub warehouses: Vec<WarehouseStock>,
}

/// Rejects negative and oversized prices and rounds to the column scale,
/// half away from zero.
pub fn normalize_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::validation("'price' must be non-negative"));
    }

    let mut rounded =
        price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded >= Decimal::from(PRICE_LIMIT) {
        return Err(ServiceError::validation(format!(
            "'price' must be less than {}",
            PRICE_LIMIT
        )));
    }
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(PRICE_SCALE);
    Ok(rounded)
}

/// Sum of the quantities, widened so many large rows cannot overflow.
pub fn total_stock(levels: &[WarehouseStock]) -> i64 {
    levels.iter().map(|level| i64::from(level.quantity)).sum()
}

/// Service for creating and reading products
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts a product in its own transaction.
    ///
    /// SKU uniqueness is left to the store's unique constraint; a violation
    /// surfaces as [`ServiceError::Conflict`].
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let price = normalize_price(input.price)?;

        ensure_owner_references(&*self.db, input.company_id, input.supplier_id).await?;
        let created = insert_product(&self.db, input, price).await;

        match &created {
            Ok(model) => info!(product_id = model.id, "Created product"),
            Err(ServiceError::Conflict(_)) => warn!("Rejected product with duplicate SKU"),
            Err(_) => {}
        }
        created
    }

    /// Loads a product and its inventory rows ordered by inventory id.
    #[instrument(skip(self))]
    pub async fn get_product_detail(&self, product_id: i32) -> Result<ProductDetail, ServiceError> {
        load_product_detail(&*self.db, product_id).await
    }
}

/// Checks that the optional company and supplier rows exist.
async fn ensure_owner_references<C>(
    db: &C,
    company_id: Option<i32>,
    supplier_id: Option<i32>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if let Some(company_id) = company_id {
        if company::Entity::find_by_id(company_id).one(db).await?.is_none() {
            return Err(ServiceError::validation("Invalid 'company_id'"));
        }
    }
    if let Some(supplier_id) = supplier_id {
        if supplier::Entity::find_by_id(supplier_id).one(db).await?.is_none() {
            return Err(ServiceError::validation("Invalid 'supplier_id'"));
        }
    }
    Ok(())
}

fn invalid_owner_reference(company_id: Option<i32>, supplier_id: Option<i32>) -> ServiceError {
    match (company_id, supplier_id) {
        (Some(_), None) => ServiceError::validation("Invalid 'company_id'"),
        (None, Some(_)) => ServiceError::validation("Invalid 'supplier_id'"),
        _ => ServiceError::validation("Invalid 'company_id' or 'supplier_id'"),
    }
}

/// Inserts the row as the first statement of its transaction, so concurrent
/// creates contend on the write lock and the SKU index.
async fn insert_product(
    db: &DatabaseConnection,
    input: NewProduct,
    price: Decimal,
) -> Result<product::Model, ServiceError> {
    run_in_transaction(db, move |txn| {
        Box::pin(async move {
            let (company_id, supplier_id) = (input.company_id, input.supplier_id);
            product::ActiveModel {
                name: Set(input.name),
                sku: Set(input.sku),
                price: Set(price),
                company_id: Set(company_id),
                supplier_id: Set(supplier_id),
                product_type: Set(input.product_type),
                low_stock_threshold: Set(input.low_stock_threshold),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::Conflict("SKU already exists".to_string())
                } else if is_foreign_key_violation(&e) {
                    invalid_owner_reference(company_id, supplier_id)
                } else {
                    ServiceError::DatabaseError(e)
                }
            })
        })
    })
    .await
}

async fn load_product_detail<C>(db: &C, product_id: i32) -> Result<ProductDetail, ServiceError>
where
    C: ConnectionTrait,
{
    let product = product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

    let warehouses: Vec<WarehouseStock> = inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product.id))
        .order_by_asc(inventory::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|row| WarehouseStock {
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
        })
        .collect();

    // Some backends hand decimals back as floats; restore the column scale.
    let mut price = product.price.round_dp(PRICE_SCALE);
    price.rescale(PRICE_SCALE);

    Ok(ProductDetail {
        id: product.id,
        name: product.name,
        sku: product.sku,
        price,
        total_stock: total_stock(&warehouses),
        warehouses,
    })
}
