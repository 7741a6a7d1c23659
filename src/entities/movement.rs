//! Movement entity - Append-only ledger entry for one quantity change.
//!
//! Quantities are signed: positive for inbound stock, negative for sales and
//! withdrawals. Each `kind` is stored as its lowercase string value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of stock movement
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock entering a lot (purchase or manual entry)
    #[sea_orm(string_value = "inbound")]
    Inbound,
    /// Stock leaving a lot (sale or withdrawal)
    #[sea_orm(string_value = "outbound")]
    Outbound,
    /// Corrective withdrawal (shrinkage, damage, count fix)
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    /// Unique identifier for the movement
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product whose stock changed
    pub product_id: i64,
    /// Lot that was touched, if any
    pub lot_id: Option<i64>,
    /// Tenant that performed the change
    pub tenant_id: String,
    /// Inbound, outbound or adjustment
    pub kind: MovementKind,
    /// Signed quantity (positive in, negative out)
    pub quantity: i64,
    /// Free-text description, e.g. `"Sale #12"`
    pub description: String,
    /// When the movement happened
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Movement and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each movement optionally references one lot
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id"
    )]
    Lot,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
