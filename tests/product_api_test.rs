mod common;

use axum::http::{header, Method};
use serde_json::json;

use common::{response_json, TestApp};

#[tokio::test]
async fn widget_round_trips_exactly() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/products",
            json!({"name": "Widget", "sku": "W-1", "price": "9.99"}),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body, json!({"message": "Product created", "product_id": 1}));

    let response = app.get("/api/products/1").await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(
        body,
        json!({
            "id": 1,
            "name": "Widget",
            "sku": "W-1",
            "price": "9.99",
            "total_stock": 0,
            "warehouses": []
        })
    );
}

#[tokio::test]
async fn numeric_prices_are_rounded_to_cents() {
    let app = TestApp::new().await;

    let id = app
        .create_product(json!({"name": "Gadget", "sku": "G-1", "price": 12}))
        .await;
    let body = response_json(app.get(&format!("/api/products/{id}")).await).await;
    assert_eq!(body["price"], "12.00");

    let id = app
        .create_product(json!({"name": "Gizmo", "sku": "G-2", "price": "10.005"}))
        .await;
    let body = response_json(app.get(&format!("/api/products/{id}")).await).await;
    assert_eq!(body["price"], "10.01");
}

#[tokio::test]
async fn tiny_scientific_prices_round_to_zero() {
    let app = TestApp::new().await;

    let id = app
        .create_product(json!({"name": "Speck", "sku": "S-1", "price": "1e-30"}))
        .await;
    let body = response_json(app.get(&format!("/api/products/{id}")).await).await;
    assert_eq!(body["price"], "0.00");

    let response = app
        .post(
            "/api/products",
            json!({"name": "Boulder", "sku": "B-1", "price": "1e30"}),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn name_and_sku_are_stored_trimmed() {
    let app = TestApp::new().await;

    let id = app
        .create_product(json!({"name": "  Widget  ", "sku": " W-9 ", "price": "1.50"}))
        .await;
    let body = response_json(app.get(&format!("/api/products/{id}")).await).await;
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["sku"], "W-9");
}

#[tokio::test]
async fn location_header_uses_host() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(
            Method::POST,
            "/api/products",
            r#"{"name":"Widget","sku":"W-1","price":"9.99"}"#,
            &[("host", "inventory.local:8080")],
        )
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://inventory.local:8080/api/products/1"
    );
}

#[tokio::test]
async fn location_header_prefers_public_base_url() {
    let app = TestApp::with_config(|cfg| {
        cfg.public_base_url = Some("https://api.example.com/".to_string());
    })
    .await;

    let response = app
        .request_raw(
            Method::POST,
            "/api/products",
            r#"{"name":"Widget","sku":"W-1","price":"9.99"}"#,
            &[("host", "internal:8080")],
        )
        .await;
    assert_eq!(response.status(), 201);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://api.example.com/api/products/1"
    );
}

#[tokio::test]
async fn location_header_is_relative_without_host() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/products",
            json!({"name": "Widget", "sku": "W-1", "price": "9.99"}),
        )
        .await;
    assert_eq!(response.headers()[header::LOCATION], "/api/products/1");
}

#[tokio::test]
async fn body_is_parsed_regardless_of_content_type() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(
            Method::POST,
            "/api/products",
            r#"{"name":"Widget","sku":"W-1","price":"9.99"}"#,
            &[("content-type", "text/plain")],
        )
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn invalid_prices_are_rejected_without_persisting() {
    let app = TestApp::new().await;

    let cases = [
        (json!("abc"), "'price' must be a valid decimal"),
        (json!(null), "'price' must be a valid decimal"),
        (json!(true), "'price' must be a valid decimal"),
        (json!("-1.00"), "'price' must be non-negative"),
        (json!(-5), "'price' must be non-negative"),
        (json!("100000000"), "'price' must be less than 100000000"),
    ];

    for (price, message) in cases {
        let response = app
            .post(
                "/api/products",
                json!({"name": "Widget", "sku": "W-1", "price": price}),
            )
            .await;
        assert_eq!(response.status(), 400, "price {price} should be rejected");
        let body = response_json(response).await;
        assert_eq!(body["error"], message);
    }

    let response = app
        .post("/api/products", json!({"name": "Widget", "sku": "W-1"}))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["error"],
        "'price' must be a valid decimal"
    );

    assert_eq!(app.product_count().await, 0);
}

#[tokio::test]
async fn missing_name_or_sku_is_rejected() {
    let app = TestApp::new().await;

    for body in [
        json!({"sku": "W-1", "price": "1"}),
        json!({"name": "Widget", "price": "1"}),
        json!({"name": "   ", "sku": "W-1", "price": "1"}),
        json!({"name": "Widget", "sku": 42, "price": "1"}),
    ] {
        let response = app.post("/api/products", body).await;
        assert_eq!(response.status(), 400);
        assert_eq!(
            response_json(response).await["error"],
            "Both 'name' and 'sku' are required"
        );
    }

    assert_eq!(app.product_count().await, 0);
}

#[tokio::test]
async fn over_long_fields_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/products",
            json!({"name": "n".repeat(256), "sku": "W-1", "price": "1"}),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["error"],
        "'name' must be at most 255 characters"
    );

    let response = app
        .post(
            "/api/products",
            json!({"name": "Widget", "sku": "S".repeat(65), "price": "1"}),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["error"],
        "'sku' must be at most 64 characters"
    );

    assert_eq!(app.product_count().await, 0);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(Method::POST, "/api/products", "{not json", &[])
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["error"],
        "Request body must be valid JSON"
    );

    let response = app
        .request_raw(Method::POST, "/api/products", "[1, 2, 3]", &[])
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["error"],
        "Request body must be a JSON object"
    );
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestApp::new().await;

    app.create_product(json!({"name": "Widget", "sku": "W-1", "price": "9.99"}))
        .await;

    let response = app
        .post(
            "/api/products",
            json!({"name": "Other widget", "sku": "W-1", "price": "5"}),
        )
        .await;
    assert_eq!(response.status(), 409);
    assert_eq!(response_json(response).await["error"], "SKU already exists");
    assert_eq!(app.product_count().await, 1);
}

#[tokio::test]
async fn unknown_company_reference_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/products",
            json!({"name": "Widget", "sku": "W-1", "price": "1", "company_id": 99}),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(response_json(response).await["error"], "Invalid 'company_id'");
    assert_eq!(app.product_count().await, 0);
}

#[tokio::test]
async fn unknown_products_are_not_found() {
    let app = TestApp::new().await;

    for uri in ["/api/products/42", "/api/products/abc"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), 404);
        assert_eq!(response_json(response).await["error"], "Product not found");
    }
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::new().await;

    let response = app.get("/api/products/1").await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .request_raw(
            Method::GET,
            "/api/products/1",
            "",
            &[("x-request-id", "trace-me-123")],
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = TestApp::with_config(|cfg| cfg.max_body_size = 64).await;

    let body = json!({"name": "w".repeat(200), "sku": "W-1", "price": "1"}).to_string();
    let response = app
        .request_raw(Method::POST, "/api/products", body, &[])
        .await;
    assert_eq!(response.status(), 413);
    assert_eq!(app.product_count().await, 0);
}
