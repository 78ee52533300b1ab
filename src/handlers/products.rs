use super::common::{
    absolute_url, optional_reference, parse_price, required_text, JsonPayload,
};
use crate::{
    errors::ServiceError,
    services::products::{NewProduct, ProductDetail},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body accepted by `POST /api/products`.
///
/// Documentation only: the handler decodes fields one by one so that each
/// type error gets its own message.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Widget")]
    pub name: String,
    #[schema(example = "W-1")]
    pub sku: String,
    /// Decimal string or JSON number
    #[schema(value_type = String, example = "9.99")]
    pub price: Value,
    #[schema(example = "electronics")]
    pub product_type: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub company_id: Option<i32>,
    pub supplier_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductCreatedResponse {
    #[schema(example = "Product created")]
    pub message: String,
    pub product_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WarehouseStockResponse {
    pub warehouse_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub sku: String,
    /// Price with exactly two fractional digits
    #[schema(example = "9.99")]
    pub price: String,
    pub total_stock: i64,
    pub warehouses: Vec<WarehouseStockResponse>,
}

impl From<ProductDetail> for ProductResponse {
    fn from(detail: ProductDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name,
            sku: detail.sku,
            price: super::common::format_price(detail.price),
            total_stock: detail.total_stock,
            warehouses: detail
                .warehouses
                .into_iter()
                .map(|level| WarehouseStockResponse {
                    warehouse_id: level.warehouse_id,
                    quantity: level.quantity,
                })
                .collect(),
        }
    }
}

fn new_product_from(payload: &JsonPayload) -> Result<NewProduct, ServiceError> {
    let (name, sku) = match (
        required_text(payload.get("name")),
        required_text(payload.get("sku")),
    ) {
        (Some(name), Some(sku)) => (name, sku),
        _ => {
            return Err(ServiceError::validation(
                "Both 'name' and 'sku' are required",
            ))
        }
    };

    let price = parse_price(payload.get("price"))?;

    let product_type = match payload.get("product_type") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(_) => return Err(ServiceError::validation("'product_type' must be a string")),
    };

    let low_stock_threshold = match payload.get("low_stock_threshold") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| {
                    ServiceError::validation("'low_stock_threshold' must be an integer")
                })?,
        ),
    };

    Ok(NewProduct {
        name,
        sku,
        price,
        product_type,
        low_stock_threshold,
        company_id: optional_reference("company_id", payload.get("company_id"))?,
        supplier_id: optional_reference("supplier_id", payload.get("supplier_id"))?,
    })
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductCreatedResponse,
            headers(
                ("Location" = String, description = "URL of the created product"),
                ("X-Request-Id" = String, description = "Unique request id"),
            )
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: JsonPayload,
) -> Result<Response, ServiceError> {
    let input = new_product_from(&payload)?;
    let product = state.services.products.create_product(input).await?;

    let location = absolute_url(
        state.config.public_base_url(),
        &headers,
        &format!("/api/products/{}", product.id),
    );

    let body = Json(ProductCreatedResponse {
        message: "Product created".to_string(),
        product_id: product.id,
    });

    match HeaderValue::from_str(&location) {
        Ok(value) => Ok((StatusCode::CREATED, [(header::LOCATION, value)], body).into_response()),
        Err(_) => Ok((StatusCode::CREATED, body).into_response()),
    }
}

/// Get a product with its stock per warehouse
#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product returned", body = ProductResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductResponse>, ServiceError> {
    // Only integer ids can name a product
    let product_id: i32 = product_id
        .parse()
        .map_err(|_| ServiceError::NotFound("Product not found".to_string()))?;

    let detail = state.services.products.get_product_detail(product_id).await?;
    Ok(Json(ProductResponse::from(detail)))
}
