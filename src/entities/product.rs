//! Product entity - The catalogue item whose stock is tracked in lots.
//!
//! Products are owned by a tenant and identified within it by SKU. The sale price
//! is derived from the weighted-average cost of the product's live lots and the
//! configured profit margin; only the costing engine writes it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant (owning account) scope
    pub tenant_id: String,
    /// Stock keeping unit, unique per tenant
    pub sku: String,
    /// Human-readable product name
    pub name: String,
    /// Profit margin in percent applied on top of the average cost, if configured
    pub profit_margin: Option<f64>,
    /// Current sale price as of the last stock-creating operation
    pub sale_price: Option<f64>,
    /// Inactive products are hidden from the inventory summary
    pub is_active: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the sale price (or margin) was last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many lots
    #[sea_orm(has_many = "super::lot::Entity")]
    Lots,
    /// One product has many movements
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
