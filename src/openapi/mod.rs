use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = r#"
# Inventory API

Products, per-warehouse stock levels and low-stock alerts.

## Error Handling

Every error response has the same shape:

```json
{ "error": "SKU already exists" }
```

Prices are exchanged as decimal strings with two fractional digits.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "inventory", description = "Stock levels per warehouse"),
        (name = "alerts", description = "Low-stock alerts"),
        (name = "health", description = "Service health")
    ),
    paths(
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::inventory::set_inventory,
        crate::handlers::alerts::low_stock_alerts,
        crate::health::health_check
    ),
    components(
        schemas(
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::ProductCreatedResponse,
            crate::handlers::products::ProductResponse,
            crate::handlers::products::WarehouseStockResponse,
            crate::handlers::inventory::SetInventoryRequest,
            crate::handlers::inventory::InventoryUpdatedResponse,
            crate::handlers::alerts::LowStockAlertsResponse,
            crate::services::alerts::LowStockAlert,
            crate::services::alerts::SupplierContact,
            crate::health::HealthResponse,
            crate::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
