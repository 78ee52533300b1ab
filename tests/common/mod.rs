#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use inventory_api::{
    config::AppConfig,
    db,
    entities::{company, inventory, product, sale, supplier, warehouse},
    AppState,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up the application router backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: Option<PathBuf>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as [`TestApp::new`] with a hook to adjust the configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = test_config("sqlite::memory:".to_string());
        // A single connection keeps every request on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        adjust(&mut cfg);
        Self::start(cfg, None).await
    }

    /// Application backed by a temporary SQLite file with a pool of several
    /// connections, so that concurrent requests run overlapping transactions.
    pub async fn file_backed() -> Self {
        let db_file = std::env::temp_dir().join(format!("inventory-test-{}.db", Uuid::new_v4()));
        let mut cfg = test_config(format!("sqlite://{}?mode=rwc", db_file.display()));
        cfg.db_max_connections = 16;
        cfg.db_min_connections = 1;
        Self::start(cfg, Some(db_file)).await
    }

    async fn start(cfg: AppConfig, db_file: Option<PathBuf>) -> Self {

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = inventory_api::app_router(state.clone());

        Self {
            router,
            state,
            db_file,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Send a JSON request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => Body::from(
                serde_json::to_vec(&json).expect("failed to serialize json request body"),
            ),
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    /// Send a raw body with the given headers.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(body.into()).expect("failed to build request"))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn product_count(&self) -> u64 {
        product::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count products")
    }

    pub async fn inventory_rows(&self, product_id: i32) -> Vec<inventory::Model> {
        inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .all(self.state.db.as_ref())
            .await
            .expect("load inventory rows")
    }

    pub async fn inventory_count(&self) -> u64 {
        inventory::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count inventory rows")
    }

    pub async fn seed_company(&self, name: &str) -> company::Model {
        company::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed company")
    }

    pub async fn seed_supplier(&self, name: &str, email: Option<&str>) -> supplier::Model {
        supplier::ActiveModel {
            name: Set(name.to_string()),
            contact_email: Set(email.map(str::to_string)),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed supplier")
    }

    pub async fn seed_warehouse(&self, name: &str, company_id: Option<i32>) -> warehouse::Model {
        warehouse::ActiveModel {
            name: Set(name.to_string()),
            company_id: Set(company_id),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed warehouse")
    }

    /// Creates a product through the API and returns its id.
    pub async fn create_product(&self, body: Value) -> i32 {
        let response = self.post("/api/products", body).await;
        assert_eq!(response.status(), 201, "product creation failed");
        let json = response_json(response).await;
        json["product_id"].as_i64().expect("product id") as i32
    }

    /// Sets a stock level through the API.
    pub async fn set_stock(&self, product_id: i32, warehouse_id: i32, quantity: i32) {
        let response = self
            .post(
                "/api/inventory",
                json!({
                    "product_id": product_id,
                    "warehouse_id": warehouse_id,
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(response.status(), 200, "inventory update failed");
    }

    /// Records a sale `days_ago` days in the past.
    pub async fn seed_sale(
        &self,
        product_id: i32,
        warehouse_id: i32,
        quantity: i32,
        days_ago: i64,
    ) -> sale::Model {
        sale::ActiveModel {
            product_id: Set(product_id),
            warehouse_id: Set(warehouse_id),
            quantity: Set(quantity),
            sale_date: Set((Utc::now() - Duration::days(days_ago)).fixed_offset()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed sale")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(path) = &self.db_file {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
            }
        }
    }
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig::new(
        database_url,
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
