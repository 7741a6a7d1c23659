//! Sale entity - Header of a customer sale. Lines are fulfilled from lots in FIFO order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale header database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant that made the sale
    pub tenant_id: String,
    /// Client reference (client records live outside the ledger)
    pub client_id: i64,
    /// Sum of line subtotals
    pub total: f64,
    /// Caller-defined status, e.g. `"completed"`
    pub status: String,
    /// When the sale was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One sale has many lines
    #[sea_orm(has_many = "super::sale_line::Entity")]
    Lines,
    /// One sale has many payments
    #[sea_orm(has_many = "super::sale_payment::Entity")]
    Payments,
}

impl Related<super::sale_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::sale_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
