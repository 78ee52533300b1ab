//! Seed data script - populates the database with demo data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 1 company with 2 warehouses
//! - 2 suppliers
//! - 6 products (electronics, apparel, consumables)
//! - Stock for every product in every warehouse
//! - Sales over the last few weeks, so some rows show up as low-stock alerts

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;

use inventory_api::entities::{company, inventory, product, sale, supplier, warehouse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Inventory API Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("APP__DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite://inventory.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);
    let db = inventory_api::db::establish_connection(&database_url).await?;
    inventory_api::db::run_migrations(&db).await?;

    let company = company::ActiveModel {
        name: Set("Acme Retail".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await?;
    info!("Created company {} ({})", company.name, company.id);

    let warehouses = create_warehouses(&db, company.id).await?;
    info!("  Created {} warehouses", warehouses.len());

    let suppliers = create_suppliers(&db).await?;
    info!("  Created {} suppliers", suppliers.len());

    let products = create_products(&db, company.id, &suppliers).await?;
    info!("  Created {} products", products.len());

    let stock_rows = create_inventory(&db, &products, &warehouses).await?;
    info!("  Created {} inventory rows", stock_rows);

    let sales = create_sales(&db, &products, &warehouses).await?;
    info!("  Recorded {} sales", sales);

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/products/{}", products[0].id);
    info!(
        "  curl http://localhost:8080/api/companies/{}/alerts/low-stock",
        company.id
    );
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_warehouses(
    db: &DatabaseConnection,
    company_id: i32,
) -> anyhow::Result<Vec<warehouse::Model>> {
    let mut created = Vec::new();
    for name in ["Main Warehouse", "West Coast Hub"] {
        let model = warehouse::ActiveModel {
            name: Set(name.to_string()),
            company_id: Set(Some(company_id)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_suppliers(db: &DatabaseConnection) -> anyhow::Result<Vec<supplier::Model>> {
    let suppliers_data = [
        ("Volt Components", Some("orders@volt.example.com")),
        ("Threadworks", None),
    ];

    let mut created = Vec::new();
    for (name, email) in suppliers_data {
        let model = supplier::ActiveModel {
            name: Set(name.to_string()),
            contact_email: Set(email.map(str::to_string)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_products(
    db: &DatabaseConnection,
    company_id: i32,
    suppliers: &[supplier::Model],
) -> anyhow::Result<Vec<product::Model>> {
    let products_data: [(&str, &str, Decimal, &str, Option<i32>, usize); 6] = [
        ("Wireless Headphones", "WBH-001", dec!(79.99), "electronics", None, 0),
        ("USB-C Charger 65W", "CHG-065", dec!(34.99), "electronics", Some(40), 0),
        ("Cotton T-Shirt", "TSH-BLK-M", dec!(24.99), "apparel", None, 1),
        ("Denim Jeans", "JNS-SLM-32", dec!(89.99), "apparel", None, 1),
        ("Coffee Beans 1kg", "COF-1KG", dec!(18.50), "consumable", None, 0),
        ("Water Bottle", "BTL-SS-32", dec!(29.99), "accessories", None, 0),
    ];

    let mut created = Vec::new();
    for (name, sku, price, product_type, threshold, supplier_index) in products_data {
        let model = product::ActiveModel {
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            price: Set(price),
            company_id: Set(Some(company_id)),
            supplier_id: Set(suppliers.get(supplier_index).map(|s| s.id)),
            product_type: Set(Some(product_type.to_string())),
            low_stock_threshold: Set(threshold),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(model);
    }
    Ok(created)
}

async fn create_inventory(
    db: &DatabaseConnection,
    products: &[product::Model],
    warehouses: &[warehouse::Model],
) -> anyhow::Result<usize> {
    let mut count = 0;
    for (p, product) in products.iter().enumerate() {
        for (w, warehouse) in warehouses.iter().enumerate() {
            // Alternate between comfortable and depleted stock
            let quantity = if (p + w) % 2 == 0 { 120 } else { 8 };
            inventory::ActiveModel {
                product_id: Set(product.id),
                warehouse_id: Set(warehouse.id),
                quantity: Set(quantity),
                ..Default::default()
            }
            .insert(db)
            .await?;
            count += 1;
        }
    }
    Ok(count)
}

async fn create_sales(
    db: &DatabaseConnection,
    products: &[product::Model],
    warehouses: &[warehouse::Model],
) -> anyhow::Result<usize> {
    let now = Utc::now();
    let mut count = 0;
    for product in products {
        for warehouse in warehouses {
            for days_ago in [2_i64, 9, 16, 45] {
                sale::ActiveModel {
                    product_id: Set(product.id),
                    warehouse_id: Set(warehouse.id),
                    quantity: Set(3),
                    sale_date: Set((now - Duration::days(days_ago)).fixed_offset()),
                    ..Default::default()
                }
                .insert(db)
                .await?;
                count += 1;
            }
        }
    }
    Ok(count)
}
