//! Manual adjustment - Lot entry outside a purchase and explicit-lot withdrawals.
//!
//! A manual lot behaves exactly like one purchase line: duplicate-code check, lot and
//! inbound movement, cost recomputation, all in one transaction.
//!
//! [`process_outflows`] evaluates every withdrawal in a batch before deciding anything.
//! Requests that cannot be satisfied are collected as failures while the others are
//! applied provisionally. Any failure rolls the whole batch back and the caller gets both
//! lists; an all-success batch commits.

use crate::{
    core::{
        costing::recompute,
        lot::{NewLot, create_lot, decrement_lot, get_lot_for_tenant},
        movement::{NewMovement, record},
    },
    entities::{MovementKind, lot, movement},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// A lot created by hand together with its inbound movement.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub lot: lot::Model,
    pub movement: movement::Model,
}

/// Creates a lot outside a purchase and recomputes the product's cost.
///
/// # Errors
/// - `InvalidQuantity` / `InvalidAmount` / `Config` for invalid input
/// - `ProductNotFound` if the product does not belong to the tenant
/// - `Conflict` if the lot code is already used within the tenant
#[instrument(skip(db, new_lot), fields(product_id = new_lot.product_id, code = %new_lot.code))]
pub async fn create_manual_lot(
    db: &DatabaseConnection,
    tenant_id: &str,
    new_lot: NewLot,
) -> Result<ManualEntry> {
    let txn = db.begin().await?;

    let lot = create_lot(&txn, tenant_id, new_lot).await?;
    let movement = record(
        &txn,
        NewMovement {
            product_id: lot.product_id,
            lot_id: Some(lot.id),
            tenant_id: tenant_id.to_string(),
            kind: MovementKind::Inbound,
            quantity: lot.quantity,
            description: format!("Manual lot entry - unit cost: {}", lot.unit_cost),
            timestamp: chrono::Utc::now(),
        },
    )
    .await?;
    recompute(&txn, lot.product_id).await?;

    txn.commit().await?;

    info!(
        "Manual entry of lot {} ({} units) for product {}",
        lot.code, lot.quantity, lot.product_id
    );

    Ok(ManualEntry { lot, movement })
}

/// Movement kind a withdrawal is logged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutflowKind {
    Outbound,
    Adjustment,
}

impl From<OutflowKind> for MovementKind {
    fn from(kind: OutflowKind) -> Self {
        match kind {
            OutflowKind::Outbound => MovementKind::Outbound,
            OutflowKind::Adjustment => MovementKind::Adjustment,
        }
    }
}

/// One withdrawal from an explicit lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutflowRequest {
    pub lot_id: i64,
    pub quantity: i64,
    pub kind: OutflowKind,
    pub description: String,
}

/// A withdrawal that was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutflowResult {
    pub lot_id: i64,
    pub quantity: i64,
    /// The lot as it stood right after the decrement
    pub lot: lot::Model,
}

/// Why a withdrawal could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OutflowFailureReason {
    #[error("Lot not found")]
    LotNotFound,

    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },
}

/// A withdrawal that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutflowFailure {
    pub lot_id: i64,
    pub reason: OutflowFailureReason,
}

/// Applies a batch of withdrawals from explicit lots, all or nothing.
///
/// Each request is looked up within the tenant and checked against the lot's quantity.
/// Missing lots, shortfalls and non-positive quantities become per-item failures and
/// evaluation continues with the next request. Satisfiable requests decrement their lot
/// and log one movement of the requested kind. The cost basis is not recomputed.
///
/// An empty batch succeeds with no results.
///
/// # Errors
/// - `OutflowsRejected` with every failure and the reverted provisional results if any
///   request failed; no lot or movement is changed
/// - `Database` if the store fails
#[instrument(skip(db, requests), fields(requests = requests.len()))]
pub async fn process_outflows(
    db: &DatabaseConnection,
    tenant_id: &str,
    requests: Vec<OutflowRequest>,
) -> Result<Vec<OutflowResult>> {
    let txn = db.begin().await?;

    let mut applied = Vec::new();
    let mut failures = Vec::new();

    for request in requests {
        let lot_id = request.lot_id;

        if request.quantity < 1 {
            failures.push(OutflowFailure {
                lot_id,
                reason: OutflowFailureReason::InvalidQuantity {
                    quantity: request.quantity,
                },
            });
            continue;
        }

        let Some(current) = get_lot_for_tenant(&txn, tenant_id, lot_id).await? else {
            failures.push(OutflowFailure {
                lot_id,
                reason: OutflowFailureReason::LotNotFound,
            });
            continue;
        };

        let updated = match decrement_lot(&txn, lot_id, request.quantity).await {
            Ok(updated) => updated,
            Err(Error::InvalidState { available, .. }) => {
                failures.push(OutflowFailure {
                    lot_id,
                    reason: OutflowFailureReason::InsufficientStock {
                        available,
                        requested: request.quantity,
                    },
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        record(
            &txn,
            NewMovement {
                product_id: current.product_id,
                lot_id: Some(lot_id),
                tenant_id: tenant_id.to_string(),
                kind: request.kind.into(),
                quantity: -request.quantity,
                description: request.description,
                timestamp: chrono::Utc::now(),
            },
        )
        .await?;

        applied.push(OutflowResult {
            lot_id,
            quantity: request.quantity,
            lot: updated,
        });
    }

    if !failures.is_empty() {
        txn.rollback().await?;
        warn!(
            "Rejected outflow batch: {} failed, {} reverted",
            failures.len(),
            applied.len()
        );
        return Err(Error::OutflowsRejected {
            failures,
            reverted: applied,
        });
    }

    txn.commit().await?;
    info!("Applied {} outflows", applied.len());

    Ok(applied)
}
