//! Lot entity - A batch of one product with its own quantity, unit cost and dates.
//!
//! Lots are never deleted. A lot whose quantity reached zero stays as history.
//! The `tenant_id` column duplicates the owning product's tenant so lot codes can be
//! indexed as unique per tenant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lots")]
pub struct Model {
    /// Unique identifier for the lot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this lot holds stock for
    pub product_id: i64,
    /// Tenant scope of the owning product
    pub tenant_id: String,
    /// Lot code, unique within the tenant
    pub code: String,
    /// Units on hand, never negative
    pub quantity: i64,
    /// Cost per unit paid on entry
    pub unit_cost: f64,
    /// When the lot entered stock; drives FIFO order
    pub entry_date: DateTimeUtc,
    /// Optional expiration
    pub expiration_date: Option<DateTimeUtc>,
}

/// Defines relationships between Lot and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lot belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// One lot is referenced by many movements
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
