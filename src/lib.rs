//! Inventory API Library
//!
//! Products, per-warehouse stock levels and low-stock alerts over a
//! relational store, exposed as a JSON HTTP API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), config.low_stock_recent_sales_days);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(handlers::products::create_product))
        .route("/products/:product_id", get(handlers::products::get_product))
        .route("/inventory", post(handlers::inventory::set_inventory))
        .route(
            "/companies/:company_id/alerts/low-stock",
            get(handlers::alerts::low_stock_alerts),
        )
}

/// Full application router: API, health, docs and the request-scoped
/// middleware stack. CORS is added by the binary since it depends on the
/// deployment.
pub fn app_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .nest("/api", api_routes())
        .nest("/health", health::health_routes())
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(DefaultBodyLimit::max(max_body_size))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    metrics::histogram!("inventory_http.request.duration", duration);
    if status.is_server_error() {
        metrics::counter!("inventory_http.request.server_error", 1);
    }

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
