//! Purchase entity - Header of a supplier purchase. Each line creates exactly one lot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase header database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier for the purchase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant that received the goods
    pub tenant_id: String,
    /// Supplier reference (supplier records live outside the ledger)
    pub supplier_id: i64,
    /// Sum of quantity times unit cost over all lines
    pub total: f64,
    /// When the purchase was received
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One purchase has many lines
    #[sea_orm(has_many = "super::purchase_line::Entity")]
    Lines,
}

impl Related<super::purchase_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
