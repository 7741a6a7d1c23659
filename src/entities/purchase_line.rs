//! Purchase line entity - One purchased product with the lot it produced.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_lines")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning purchase
    pub purchase_id: i64,
    /// Purchased product
    pub product_id: i64,
    /// Lot created for this line
    pub lot_id: i64,
    /// Units received
    pub quantity: i64,
    /// Cost per unit
    pub unit_cost: f64,
    /// Code of the created lot
    pub lot_code: String,
    /// Expiration of the created lot, if any
    pub expiration_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one purchase
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id"
    )]
    Purchase,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
