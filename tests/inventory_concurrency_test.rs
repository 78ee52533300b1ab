mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::TestApp;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_skus_create_exactly_one_product() {
    let app = TestApp::file_backed().await;

    let mut tasks = vec![];
    for i in 0..10 {
        let router = app.router();
        tasks.push(tokio::spawn(async move {
            let request = post_json(
                "/api/products",
                json!({"name": format!("Widget {i}"), "sku": "RACE-1", "price": "1.00"}),
            );
            router
                .oneshot(request)
                .await
                .map(|response| response.status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1, "exactly one create should succeed");
    assert_eq!(conflicts, 9);
    assert_eq!(app.product_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_leave_one_row_with_a_written_value() {
    let app = TestApp::file_backed().await;
    let product_id = app
        .create_product(json!({"name": "Widget", "sku": "W-1", "price": "9.99"}))
        .await;
    let warehouse = app.seed_warehouse("Main", None).await;

    let quantities: Vec<i32> = (1..=20).collect();
    let mut tasks = vec![];
    for quantity in quantities.clone() {
        let router = app.router();
        let warehouse_id = warehouse.id;
        tasks.push(tokio::spawn(async move {
            let request = post_json(
                "/api/inventory",
                json!({"product_id": product_id, "warehouse_id": warehouse_id, "quantity": quantity}),
            );
            router
                .oneshot(request)
                .await
                .map(|response| response.status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }));
    }

    for task in tasks {
        assert_eq!(task.await.expect("task panicked"), StatusCode::OK);
    }

    let rows = app.inventory_rows(product_id).await;
    assert_eq!(rows.len(), 1, "the pair must map to a single row");
    assert!(
        quantities.contains(&rows[0].quantity),
        "final quantity {} was never written",
        rows[0].quantity
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_on_distinct_warehouses_do_not_interfere() {
    let app = TestApp::file_backed().await;
    let product_id = app
        .create_product(json!({"name": "Widget", "sku": "W-1", "price": "9.99"}))
        .await;

    let mut warehouse_ids = vec![];
    for i in 0..5 {
        warehouse_ids.push(app.seed_warehouse(&format!("WH {i}"), None).await.id);
    }

    let mut tasks = vec![];
    for warehouse_id in warehouse_ids.clone() {
        let router = app.router();
        tasks.push(tokio::spawn(async move {
            let request = post_json(
                "/api/inventory",
                json!({"product_id": product_id, "warehouse_id": warehouse_id, "quantity": 3}),
            );
            router.oneshot(request).await.map(|r| r.status())
        }));
    }
    for task in tasks {
        assert_eq!(
            task.await.expect("task panicked").expect("router error"),
            StatusCode::OK
        );
    }

    let rows = app.inventory_rows(product_id).await;
    assert_eq!(rows.len(), warehouse_ids.len());

    let body = common::response_json(app.get(&format!("/api/products/{product_id}")).await).await;
    assert_eq!(body["total_stock"], 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_skus_with_owner_still_conflict() {
    let app = TestApp::file_backed().await;
    let company = app.seed_company("Acme").await;
    let supplier = app.seed_supplier("Volt", None).await;

    let mut tasks = vec![];
    for i in 0..10 {
        let router = app.router();
        let (company_id, supplier_id) = (company.id, supplier.id);
        tasks.push(tokio::spawn(async move {
            let request = post_json(
                "/api/products",
                json!({
                    "name": format!("Widget {i}"), "sku": "RACE-2", "price": "1.00",
                    "company_id": company_id, "supplier_id": supplier_id
                }),
            );
            router.oneshot(request).await.map(|response| response.status())
        }));
    }

    let mut statuses = vec![];
    for task in tasks {
        statuses.push(task.await.expect("task panicked").expect("router error"));
    }

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1,
        "statuses: {statuses:?}"
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        9,
        "statuses: {statuses:?}"
    );
}
