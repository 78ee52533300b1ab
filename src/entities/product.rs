use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key, assigned by the store
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name, at most 255 characters
    pub name: String,

    /// Stock keeping unit, globally unique, at most 64 characters
    #[sea_orm(unique)]
    pub sku: String,

    /// Unit price, `NUMERIC(10,2)`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    /// Owning company, used by low-stock alerts
    pub company_id: Option<i32>,

    /// Preferred supplier for reordering
    pub supplier_id: Option<i32>,

    /// Free-form category such as `electronics` or `apparel`
    pub product_type: Option<String>,

    /// Per-product alert threshold overriding the type default
    pub low_stock_threshold: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventories,
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
