//! Movement log - Append-only record of every stock change.
//!
//! [`record`] is the only writer. Movements are never updated or deleted; reporting code
//! reads them through the query functions below.

use crate::{
    entities::{Movement, MovementKind, movement},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};

/// Input for a new movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub product_id: i64,
    pub lot_id: Option<i64>,
    pub tenant_id: String,
    pub kind: MovementKind,
    /// Positive for inbound, negative for outbound and adjustment
    pub quantity: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Appends a movement to the log.
pub async fn record<C>(db: &C, new_movement: NewMovement) -> Result<movement::Model>
where
    C: ConnectionTrait,
{
    let active = movement::ActiveModel {
        product_id: Set(new_movement.product_id),
        lot_id: Set(new_movement.lot_id),
        tenant_id: Set(new_movement.tenant_id),
        kind: Set(new_movement.kind),
        quantity: Set(new_movement.quantity),
        description: Set(new_movement.description),
        timestamp: Set(new_movement.timestamp),
        ..Default::default()
    };
    active.insert(db).await.map_err(Into::into)
}

/// All movements that touched a lot, oldest first.
pub async fn get_movements_for_lot<C>(db: &C, lot_id: i64) -> Result<Vec<movement::Model>>
where
    C: ConnectionTrait,
{
    Movement::find()
        .filter(movement::Column::LotId.eq(lot_id))
        .order_by_asc(movement::Column::Timestamp)
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Net signed quantity the log holds for a lot.
///
/// For a consistent ledger this equals the lot's current quantity.
pub async fn ledger_balance_for_lot<C>(db: &C, lot_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = Movement::find()
        .select_only()
        .column_as(Expr::col(movement::Column::Quantity).sum(), "total")
        .filter(movement::Column::LotId.eq(lot_id))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

/// Movements of a tenant within `[from, to]`, in chronological order.
///
/// # Errors
/// Returns `InvalidDateRange` if `from` is after `to`.
pub async fn list_movements(
    db: &DatabaseConnection,
    tenant_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<movement::Model>> {
    if from > to {
        return Err(Error::InvalidDateRange);
    }

    Movement::find()
        .filter(movement::Column::TenantId.eq(tenant_id))
        .filter(movement::Column::Timestamp.gte(from))
        .filter(movement::Column::Timestamp.lte(to))
        .order_by_asc(movement::Column::Timestamp)
        .order_by_asc(movement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn inbound(product_id: i64, lot_id: i64, quantity: i64) -> NewMovement {
        NewMovement {
            product_id,
            lot_id: Some(lot_id),
            tenant_id: TENANT.to_string(),
            kind: MovementKind::Inbound,
            quantity,
            description: "Test entry".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_movement() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let lot = add_test_lot(&db, product.id, "L1", 10, 2.0, days_ago(1)).await?;

        let recorded = record(&db, inbound(product.id, lot.lot.id, 10)).await?;

        assert_eq!(recorded.product_id, product.id);
        assert_eq!(recorded.lot_id, Some(lot.lot.id));
        assert_eq!(recorded.kind, MovementKind::Inbound);
        assert_eq!(recorded.quantity, 10);
        assert_eq!(recorded.description, "Test entry");

        let stored = Movement::find_by_id(recorded.id).one(&db).await?.unwrap();
        assert_eq!(stored, recorded);

        Ok(())
    }

    #[tokio::test]
    async fn test_movements_for_lot_and_balance() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let entry = add_test_lot(&db, product.id, "L1", 10, 2.0, days_ago(1)).await?;
        let lot_id = entry.lot.id;

        let mut outbound = inbound(product.id, lot_id, -4);
        outbound.kind = MovementKind::Outbound;
        outbound.description = "Sale #1".to_string();
        record(&db, outbound).await?;

        let movements = get_movements_for_lot(&db, lot_id).await?;
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].kind, MovementKind::Inbound);
        assert_eq!(movements[1].kind, MovementKind::Outbound);
        assert_eq!(movements[1].quantity, -4);

        assert_eq!(ledger_balance_for_lot(&db, lot_id).await?, 6);
        assert_eq!(ledger_balance_for_lot(&db, 999).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_movements_invalid_range() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = list_movements(&db, TENANT, days_ago(1), days_ago(2)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidDateRange));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_movements_scoped_to_tenant_and_range() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let entry = add_test_lot(&db, product.id, "L1", 10, 2.0, days_ago(1)).await?;

        let mut old = inbound(product.id, entry.lot.id, 1);
        old.timestamp = days_ago(30);
        record(&db, old).await?;

        let mut foreign = inbound(product.id, entry.lot.id, 1);
        foreign.tenant_id = OTHER_TENANT.to_string();
        record(&db, foreign).await?;

        let movements = list_movements(&db, TENANT, days_ago(7), chrono::Utc::now()).await?;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].id, entry.movement.id);

        Ok(())
    }
}
