//! FIFO consumer - Satisfies a requested quantity from a product's lots, oldest first.
//!
//! [`consume`] checks the product's total stock before it touches anything, then walks
//! the available lots in entry order, taking `min(lot.quantity, remaining)` from each
//! and logging one outbound movement per lot touched. If the walk runs out of lots
//! while units remain, stock disappeared between the check and the decrements; the
//! error is `InventoryInconsistency` and the caller's transaction must be dropped so no
//! partial consumption survives.

use crate::{
    core::{
        lot::{decrement_lot, list_available_lots, sum_stock},
        movement::{NewMovement, record},
    },
    entities::{MovementKind, lot},
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::debug;

/// Units taken from one lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LotDraw {
    pub lot_id: i64,
    pub quantity: i64,
}

/// Consumes `requested` units of a product in FIFO order.
///
/// Run this inside the transaction of the operation it serves.
///
/// # Errors
/// - `InvalidQuantity` if `requested` is not positive
/// - `InsufficientStock` if the product holds fewer units than requested (nothing written)
/// - `InventoryInconsistency` if lots ran dry during consumption
pub async fn consume<C>(
    db: &C,
    tenant_id: &str,
    product_id: i64,
    requested: i64,
    description: &str,
) -> Result<Vec<LotDraw>>
where
    C: ConnectionTrait,
{
    if requested < 1 {
        return Err(Error::InvalidQuantity {
            quantity: requested,
        });
    }

    let available = sum_stock(db, product_id).await?;
    if available < requested {
        return Err(Error::InsufficientStock {
            product_id,
            available,
            requested,
        });
    }

    draw_in_entry_order(db, tenant_id, product_id, requested, description).await
}

/// The lot walk behind [`consume`], without the up-front stock check.
pub(crate) async fn draw_in_entry_order<C>(
    db: &C,
    tenant_id: &str,
    product_id: i64,
    requested: i64,
    description: &str,
) -> Result<Vec<LotDraw>>
where
    C: ConnectionTrait,
{
    let lots = list_available_lots(db, product_id).await?;
    draw_from_lots(db, tenant_id, product_id, lots, requested, description).await
}

/// Draws from `lots` as listed. A lot that holds less than its listed quantity by the
/// time it is decremented makes the walk fail with `InventoryInconsistency`.
async fn draw_from_lots<C>(
    db: &C,
    tenant_id: &str,
    product_id: i64,
    lots: Vec<lot::Model>,
    requested: i64,
    description: &str,
) -> Result<Vec<LotDraw>>
where
    C: ConnectionTrait,
{
    let mut remaining = requested;
    let mut draws = Vec::new();

    for lot in lots {
        if remaining == 0 {
            break;
        }

        let taken = lot.quantity.min(remaining);
        decrement_lot(db, lot.id, taken)
            .await
            .map_err(|e| match e {
                Error::InvalidState { .. } => Error::InventoryInconsistency {
                    product_id,
                    missing: remaining,
                },
                other => other,
            })?;

        record(
            db,
            NewMovement {
                product_id,
                lot_id: Some(lot.id),
                tenant_id: tenant_id.to_string(),
                kind: MovementKind::Outbound,
                quantity: -taken,
                description: description.to_string(),
                timestamp: chrono::Utc::now(),
            },
        )
        .await?;

        debug!("Took {} units from lot {} ({})", taken, lot.id, lot.code);
        draws.push(LotDraw {
            lot_id: lot.id,
            quantity: taken,
        });
        remaining -= taken;
    }

    if remaining > 0 {
        return Err(Error::InventoryInconsistency {
            product_id,
            missing: remaining,
        });
    }

    Ok(draws)
}
