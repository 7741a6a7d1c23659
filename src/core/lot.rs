//! Lot store - Owns lot records and the stock primitives every other module builds on.
//!
//! Lots are created with a tenant-unique code and decremented only through
//! [`decrement_lot`], which is a single conditional `UPDATE` so a lot can never be
//! driven below zero even when two writers race. [`list_available_lots`] returns lots
//! in FIFO order (oldest entry first, ties broken by id); consumers rely on this order.
//!
//! All functions are generic over [`ConnectionTrait`] so callers can run them inside
//! the transaction of the operation that owns them.

use crate::{
    core::product::get_product_for_tenant,
    entities::{Lot, lot},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, prelude::*, sea_query::Expr};
use tracing::debug;

/// Input for a new lot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLot {
    /// Product the lot holds stock for
    pub product_id: i64,
    /// Lot code, unique within the tenant
    pub code: String,
    /// Units entering stock (at least 1)
    pub quantity: i64,
    /// Cost per unit (non-negative, finite)
    pub unit_cost: f64,
    /// Entry timestamp that fixes the lot's FIFO position
    pub entry_date: DateTime<Utc>,
    /// Optional expiration
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Checks the fields of a new lot that can be validated without the store.
pub(crate) fn validate_new_lot(new_lot: &NewLot) -> Result<()> {
    if new_lot.quantity < 1 {
        return Err(Error::InvalidQuantity {
            quantity: new_lot.quantity,
        });
    }

    if !new_lot.unit_cost.is_finite() || new_lot.unit_cost < 0.0 {
        return Err(Error::InvalidAmount {
            amount: new_lot.unit_cost,
        });
    }

    if new_lot.code.trim().is_empty() {
        return Err(Error::Config {
            message: "Lot code cannot be empty".to_string(),
        });
    }

    Ok(())
}

/// Creates a lot for a tenant's product.
///
/// The code is checked against every lot of the tenant before anything is written.
/// The unique `(tenant_id, code)` index backs this check up: an insert that loses a
/// race with a concurrent insert of the same code is reported as a conflict too.
///
/// # Errors
/// - `InvalidQuantity` / `InvalidAmount` / `Config` for invalid input
/// - `ProductNotFound` if the product does not belong to the tenant
/// - `Conflict` if the code is already used within the tenant
pub async fn create_lot<C>(db: &C, tenant_id: &str, new_lot: NewLot) -> Result<lot::Model>
where
    C: ConnectionTrait,
{
    validate_new_lot(&new_lot)?;
    let product = get_product_for_tenant(db, tenant_id, new_lot.product_id).await?;

    let code = new_lot.code.trim().to_string();
    let existing = Lot::find()
        .filter(lot::Column::TenantId.eq(tenant_id))
        .filter(lot::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict { code });
    }

    let active = lot::ActiveModel {
        product_id: Set(product.id),
        tenant_id: Set(product.tenant_id),
        code: Set(code.clone()),
        quantity: Set(new_lot.quantity),
        unit_cost: Set(new_lot.unit_cost),
        entry_date: Set(new_lot.entry_date),
        expiration_date: Set(new_lot.expiration_date),
        ..Default::default()
    };

    match active.insert(db).await {
        Ok(created) => {
            debug!(
                "Created lot {} ({}) with {} units for product {}",
                created.id, created.code, created.quantity, created.product_id
            );
            Ok(created)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::Conflict { code })
        }
        Err(e) => Err(e.into()),
    }
}

/// Takes `amount` units out of a lot.
///
/// The decrement is one statement, `UPDATE lots SET quantity = quantity - amount
/// WHERE id = ? AND quantity >= amount`, so the check and the write cannot be
/// separated by another writer. When no row matches, the lot is re-read to tell a
/// missing lot from one holding too little stock.
///
/// # Errors
/// - `InvalidQuantity` if `amount` is not positive
/// - `LotNotFound` if the lot does not exist
/// - `InvalidState` if the lot holds fewer than `amount` units
pub async fn decrement_lot<C>(db: &C, lot_id: i64, amount: i64) -> Result<lot::Model>
where
    C: ConnectionTrait,
{
    if amount < 1 {
        return Err(Error::InvalidQuantity { quantity: amount });
    }

    let result = Lot::update_many()
        .col_expr(
            lot::Column::Quantity,
            Expr::col(lot::Column::Quantity).sub(amount),
        )
        .filter(lot::Column::Id.eq(lot_id))
        .filter(lot::Column::Quantity.gte(amount))
        .exec(db)
        .await?;

    let current = get_lot_by_id(db, lot_id)
        .await?
        .ok_or(Error::LotNotFound { lot_id })?;

    if result.rows_affected == 0 {
        return Err(Error::InvalidState {
            lot_id,
            available: current.quantity,
            requested: amount,
        });
    }

    Ok(current)
}

/// Retrieves a lot by its unique ID.
pub async fn get_lot_by_id<C>(db: &C, lot_id: i64) -> Result<Option<lot::Model>>
where
    C: ConnectionTrait,
{
    Lot::find_by_id(lot_id).one(db).await.map_err(Into::into)
}

/// Retrieves a lot only if it belongs to `tenant_id`.
pub async fn get_lot_for_tenant<C>(
    db: &C,
    tenant_id: &str,
    lot_id: i64,
) -> Result<Option<lot::Model>>
where
    C: ConnectionTrait,
{
    Lot::find_by_id(lot_id)
        .filter(lot::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the lots of a product that still hold stock, oldest entry first.
pub async fn list_available_lots<C>(db: &C, product_id: i64) -> Result<Vec<lot::Model>>
where
    C: ConnectionTrait,
{
    Lot::find()
        .filter(lot::Column::ProductId.eq(product_id))
        .filter(lot::Column::Quantity.gt(0))
        .order_by_asc(lot::Column::EntryDate)
        .order_by_asc(lot::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every lot of a product, including exhausted ones, oldest entry first.
pub async fn list_all_lots<C>(db: &C, product_id: i64) -> Result<Vec<lot::Model>>
where
    C: ConnectionTrait,
{
    Lot::find()
        .filter(lot::Column::ProductId.eq(product_id))
        .order_by_asc(lot::Column::EntryDate)
        .order_by_asc(lot::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total units on hand for a product across all of its lots.
pub async fn sum_stock<C>(db: &C, product_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = Lot::find()
        .select_only()
        .column_as(Expr::col(lot::Column::Quantity).sum(), "total")
        .filter(lot::Column::ProductId.eq(product_id))
        .into_tuple()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0))
}

/// Lots of a product available for sale, in the order a sale would consume them.
///
/// Intended for display so users can see which lot the next sale draws from.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist.
pub async fn list_lots_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<lot::Model>> {
    if crate::core::product::get_product_by_id(db, product_id)
        .await?
        .is_none()
    {
        return Err(Error::ProductNotFound { product_id });
    }

    list_available_lots(db, product_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_lot(product_id: i64, code: &str, quantity: i64, entry_date: DateTime<Utc>) -> NewLot {
        NewLot {
            product_id,
            code: code.to_string(),
            quantity,
            unit_cost: 2.0,
            entry_date,
            expiration_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_lot_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_lot(&db, TENANT, new_lot(1, "L1", 0, days_ago(1))).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let mut negative_cost = new_lot(1, "L1", 5, days_ago(1));
        negative_cost.unit_cost = -1.0;
        let result = create_lot(&db, TENANT, negative_cost).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -1.0 }
        ));

        let result = create_lot(&db, TENANT, new_lot(1, "  ", 5, days_ago(1))).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_lot_integration() -> Result<()> {
        let (db, product) = setup_with_product().await?;

        let lot = create_lot(&db, TENANT, new_lot(product.id, "L1", 10, days_ago(2))).await?;

        assert_eq!(lot.product_id, product.id);
        assert_eq!(lot.tenant_id, TENANT);
        assert_eq!(lot.code, "L1");
        assert_eq!(lot.quantity, 10);
        assert_eq!(lot.unit_cost, 2.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_lot_duplicate_code_in_tenant() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let second = create_test_product(&db, TENANT, "SKU-2", None).await?;

        create_lot(&db, TENANT, new_lot(product.id, "L1", 10, days_ago(2))).await?;

        // Same code on another product of the same tenant is still a conflict
        let result = create_lot(&db, TENANT, new_lot(second.id, "L1", 3, days_ago(1))).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { code } if code == "L1"));

        // A different tenant can use the same code
        let foreign = create_test_product(&db, OTHER_TENANT, "SKU-1", None).await?;
        let lot = create_lot(&db, OTHER_TENANT, new_lot(foreign.id, "L1", 3, days_ago(1))).await?;
        assert_eq!(lot.tenant_id, OTHER_TENANT);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_lot_for_foreign_product() -> Result<()> {
        let (db, product) = setup_with_product().await?;

        let result = create_lot(&db, OTHER_TENANT, new_lot(product.id, "L1", 5, days_ago(1))).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { product_id: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_lot() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let lot = create_lot(&db, TENANT, new_lot(product.id, "L1", 10, days_ago(1))).await?;

        let updated = decrement_lot(&db, lot.id, 4).await?;
        assert_eq!(updated.quantity, 6);

        let emptied = decrement_lot(&db, lot.id, 6).await?;
        assert_eq!(emptied.quantity, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_lot_beyond_quantity() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let lot = create_lot(&db, TENANT, new_lot(product.id, "L1", 5, days_ago(1))).await?;

        let result = decrement_lot(&db, lot.id, 6).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidState {
                available: 5,
                requested: 6,
                ..
            }
        ));

        // Nothing was taken
        assert_eq!(get_lot_by_id(&db, lot.id).await?.unwrap().quantity, 5);

        let missing = decrement_lot(&db, 999, 1).await;
        assert!(matches!(
            missing.unwrap_err(),
            Error::LotNotFound { lot_id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_lots_fifo_order() -> Result<()> {
        let (db, product) = setup_with_product().await?;

        // Inserted out of entry order on purpose
        let newest = create_lot(&db, TENANT, new_lot(product.id, "NEW", 3, days_ago(1))).await?;
        let oldest = create_lot(&db, TENANT, new_lot(product.id, "OLD", 4, days_ago(5))).await?;
        let middle = create_lot(&db, TENANT, new_lot(product.id, "MID", 2, days_ago(3))).await?;
        decrement_lot(&db, middle.id, 2).await?;

        let available = list_available_lots(&db, product.id).await?;
        let ids: Vec<i64> = available.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![oldest.id, newest.id]);

        // Exhausted lots are still kept as history
        let all = list_all_lots(&db, product.id).await?;
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].id, middle.id);
        assert_eq!(all[1].quantity, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_sum_stock() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        assert_eq!(sum_stock(&db, product.id).await?, 0);

        create_lot(&db, TENANT, new_lot(product.id, "L1", 10, days_ago(2))).await?;
        let lot = create_lot(&db, TENANT, new_lot(product.id, "L2", 5, days_ago(1))).await?;
        decrement_lot(&db, lot.id, 5).await?;

        assert_eq!(sum_stock(&db, product.id).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_lots_for_product_unknown_product() -> Result<()> {
        let db = setup_test_db().await?;

        let result = list_lots_for_product(&db, 42).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { product_id: 42 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_lot_for_tenant() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let lot = create_lot(&db, TENANT, new_lot(product.id, "L1", 5, days_ago(1))).await?;

        assert!(get_lot_for_tenant(&db, TENANT, lot.id).await?.is_some());
        assert!(get_lot_for_tenant(&db, OTHER_TENANT, lot.id).await?.is_none());

        Ok(())
    }
}
