use super::common::{parse_quantity, success_response, JsonPayload, Reference};
use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body accepted by `POST /api/inventory`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetInventoryRequest {
    #[schema(value_type = i32, example = 1)]
    pub product_id: Value,
    #[schema(value_type = i32, example = 1)]
    pub warehouse_id: Value,
    /// Defaults to 0
    #[schema(value_type = Option<i32>, example = 25)]
    pub quantity: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryUpdatedResponse {
    #[schema(example = "Inventory updated")]
    pub message: String,
    pub inventory_id: i32,
    pub quantity: i32,
}

/// Decodes both ids: absent ones first, then malformed ones.
fn references_from(payload: &JsonPayload) -> Result<(i32, i32), ServiceError> {
    let product = Reference::parse(payload.get("product_id"));
    let warehouse = Reference::parse(payload.get("warehouse_id"));

    if product.is_missing() || warehouse.is_missing() {
        return Err(ServiceError::validation(
            "'product_id' and 'warehouse_id' are required",
        ));
    }

    match (product.id(), warehouse.id()) {
        (Some(product_id), Some(warehouse_id)) => Ok((product_id, warehouse_id)),
        _ => Err(ServiceError::validation(
            "Invalid 'product_id' or 'warehouse_id'",
        )),
    }
}

/// Set the stock level of a product in a warehouse
#[utoipa::path(
    post,
    path = "/api/inventory",
    request_body = SetInventoryRequest,
    responses(
        (status = 200, description = "Inventory updated", body = InventoryUpdatedResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn set_inventory(
    State(state): State<AppState>,
    payload: JsonPayload,
) -> Result<Response, ServiceError> {
    let (product_id, warehouse_id) = references_from(&payload)?;

    let inventory = &state.services.inventory;
    inventory.ensure_references(product_id, warehouse_id).await?;

    let quantity = parse_quantity(payload.get("quantity"))?;
    let level = inventory
        .set_stock_level(product_id, warehouse_id, quantity)
        .await?;

    Ok(success_response(InventoryUpdatedResponse {
        message: "Inventory updated".to_string(),
        inventory_id: level.inventory_id,
        quantity: level.quantity,
    }))
}
