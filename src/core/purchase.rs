//! Purchase intake - Receives supplier purchases into stock.
//!
//! A purchase is one atomic unit: the header, one lot per line, one inbound movement per
//! lot and a cost recomputation per line all commit together. A duplicate lot code on any
//! line aborts the whole purchase and nothing is written.

use crate::{
    core::{
        costing::{self, add_money, decimal_to_money, line_value, round_money},
        lot::{NewLot, create_lot, validate_new_lot},
        movement::{NewMovement, record},
    },
    entities::{MovementKind, Purchase, PurchaseLine, lot, purchase, purchase_line},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{info, instrument};

/// One purchased product.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseLineRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost: f64,
    /// Code for the lot this line creates
    pub lot_code: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// A purchase to receive.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    pub tenant_id: String,
    pub supplier_id: i64,
    pub lines: Vec<PurchaseLineRequest>,
}

/// What a received purchase produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub purchase: purchase::Model,
    pub lines: Vec<purchase_line::Model>,
    /// Lots created, in line order
    pub lots: Vec<lot::Model>,
}

/// A stored purchase with its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDetail {
    pub purchase: purchase::Model,
    pub lines: Vec<purchase_line::Model>,
}

fn purchase_total(lines: &[PurchaseLineRequest]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for line in lines {
        let value = line_value(line.unit_cost, line.quantity)?;
        total = add_money(total, value, line.unit_cost)?;
    }
    Ok(round_money(total))
}

fn validate_request(request: &PurchaseRequest, received_at: DateTime<Utc>) -> Result<()> {
    if request.lines.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let mut codes = HashSet::new();
    for line in &request.lines {
        validate_new_lot(&new_lot_for(line, received_at))?;
        let code = line.lot_code.trim();
        if !codes.insert(code) {
            return Err(Error::Conflict {
                code: code.to_string(),
            });
        }
    }
    Ok(())
}

fn new_lot_for(line: &PurchaseLineRequest, received_at: DateTime<Utc>) -> NewLot {
    NewLot {
        product_id: line.product_id,
        code: line.lot_code.clone(),
        quantity: line.quantity,
        unit_cost: line.unit_cost,
        entry_date: received_at,
        expiration_date: line.expiration_date,
    }
}

/// Receives a purchase: one lot and one inbound movement per line, then recomputes each
/// line's product cost.
///
/// # Errors
/// - `EmptyRequest` if the purchase has no lines
/// - `InvalidQuantity` / `InvalidAmount` / `Config` for an invalid line
/// - `ProductNotFound` if a line names a product outside the tenant
/// - `Conflict` if a lot code repeats within the purchase or already exists for the tenant
#[instrument(skip(db, request), fields(tenant_id = %request.tenant_id, lines = request.lines.len()))]
pub async fn receive(db: &DatabaseConnection, request: PurchaseRequest) -> Result<PurchaseReceipt> {
    let received_at = Utc::now();
    validate_request(&request, received_at)?;
    let total = purchase_total(&request.lines)?;

    let txn = db.begin().await?;

    let purchase = purchase::ActiveModel {
        tenant_id: Set(request.tenant_id.clone()),
        supplier_id: Set(request.supplier_id),
        total: Set(decimal_to_money(total)),
        created_at: Set(received_at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(request.lines.len());
    let mut lots = Vec::with_capacity(request.lines.len());

    for line in &request.lines {
        let lot = create_lot(&txn, &request.tenant_id, new_lot_for(line, received_at)).await?;

        let stored_line = purchase_line::ActiveModel {
            purchase_id: Set(purchase.id),
            product_id: Set(line.product_id),
            lot_id: Set(lot.id),
            quantity: Set(line.quantity),
            unit_cost: Set(line.unit_cost),
            lot_code: Set(lot.code.clone()),
            expiration_date: Set(line.expiration_date),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        record(
            &txn,
            NewMovement {
                product_id: line.product_id,
                lot_id: Some(lot.id),
                tenant_id: request.tenant_id.clone(),
                kind: MovementKind::Inbound,
                quantity: line.quantity,
                description: format!("Purchase #{} entry", purchase.id),
                timestamp: received_at,
            },
        )
        .await?;

        costing::recompute(&txn, line.product_id).await?;

        lines.push(stored_line);
        lots.push(lot);
    }

    txn.commit().await?;

    info!(
        "Received purchase {} with {} lots, total {}",
        purchase.id,
        lots.len(),
        purchase.total
    );

    Ok(PurchaseReceipt {
        purchase,
        lines,
        lots,
    })
}

/// Loads a tenant's purchase with its lines.
pub async fn get_purchase(
    db: &DatabaseConnection,
    tenant_id: &str,
    purchase_id: i64,
) -> Result<Option<PurchaseDetail>> {
    let Some(purchase) = Purchase::find_by_id(purchase_id)
        .filter(purchase::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let lines = PurchaseLine::find()
        .filter(purchase_line::Column::PurchaseId.eq(purchase.id))
        .order_by_asc(purchase_line::Column::Id)
        .all(db)
        .await?;

    Ok(Some(PurchaseDetail { purchase, lines }))
}

/// A tenant's purchases, newest first.
pub async fn list_purchases(db: &DatabaseConnection, tenant_id: &str) -> Result<Vec<purchase::Model>> {
    Purchase::find()
        .filter(purchase::Column::TenantId.eq(tenant_id))
        .order_by_desc(purchase::Column::CreatedAt)
        .order_by_desc(purchase::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::lot::{get_lot_by_id, sum_stock};
    use crate::core::movement::get_movements_for_lot;
    use crate::entities::{Lot, Movement, Product};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn line(product_id: i64, code: &str, quantity: i64, unit_cost: f64) -> PurchaseLineRequest {
        PurchaseLineRequest {
            product_id,
            quantity,
            unit_cost,
            lot_code: code.to_string(),
            expiration_date: None,
        }
    }

    fn request(lines: Vec<PurchaseLineRequest>) -> PurchaseRequest {
        PurchaseRequest {
            tenant_id: TENANT.to_string(),
            supplier_id: 7,
            lines,
        }
    }

    #[tokio::test]
    async fn test_receive_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = receive(&db, request(vec![])).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyRequest));

        let result = receive(&db, request(vec![line(1, "L1", 0, 1.0)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let result = receive(&db, request(vec![line(1, "L1", 1, f64::INFINITY)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));

        let result = receive(
            &db,
            request(vec![line(1, "L1", 1, 1.0), line(2, " L1 ", 2, 1.0)]),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { code } if code == "L1"));

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_rejects_overflowing_total() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = receive(&db, request(vec![line(1, "L1", 1_000_000_000, 1e20)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount } if amount == 1e20
        ));

        // Each line fits on its own, their sum does not
        let result = receive(
            &db,
            request(vec![line(1, "L1", 1, 7e28), line(2, "L2", 1, 7e28)]),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount } if amount == 7e28
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_creates_lot_per_line() -> Result<()> {
        let db = setup_test_db().await?;
        let coffee = create_test_product(&db, TENANT, "COF", Some(50.0)).await?;
        let tea = create_test_product(&db, TENANT, "TEA", None).await?;

        let expires = days_ago(-90);
        let mut coffee_line = line(coffee.id, "C-1", 10, 2.0);
        coffee_line.expiration_date = Some(expires);
        let receipt = receive(
            &db,
            request(vec![coffee_line, line(tea.id, "T-1", 4, 1.25)]),
        )
        .await?;

        assert_eq!(receipt.purchase.total, 25.0);
        assert_eq!(receipt.purchase.supplier_id, 7);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lots.len(), 2);
        assert_eq!(receipt.lines[0].lot_id, receipt.lots[0].id);
        assert_eq!(receipt.lots[0].expiration_date, Some(expires));
        assert_eq!(receipt.lots[1].code, "T-1");

        assert_eq!(sum_stock(&db, coffee.id).await?, 10);
        assert_eq!(sum_stock(&db, tea.id).await?, 4);

        let movements = get_movements_for_lot(&db, receipt.lots[0].id).await?;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Inbound);
        assert_eq!(movements[0].quantity, 10);
        assert_eq!(
            movements[0].description,
            format!("Purchase #{} entry", receipt.purchase.id)
        );

        // Costing ran for the product with a margin only
        let coffee = Product::find_by_id(coffee.id).one(&db).await?.unwrap();
        assert_eq!(coffee.sale_price, Some(3.0));
        let tea = Product::find_by_id(tea.id).one(&db).await?.unwrap();
        assert_eq!(tea.sale_price, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_duplicate_code_rolls_back_everything() -> Result<()> {
        let (db, product) = setup_with_product().await?;
        let existing = add_test_lot(&db, product.id, "L-OLD", 5, 1.0, days_ago(3)).await?;
        let price_before = Product::find_by_id(product.id)
            .one(&db)
            .await?
            .unwrap()
            .sale_price;
        let movements_before = Movement::find().count(&db).await?;

        let result = receive(
            &db,
            request(vec![
                line(product.id, "L-NEW", 10, 9.0),
                line(product.id, "L-OLD", 1, 9.0),
            ]),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { code } if code == "L-OLD"));

        assert_eq!(Lot::find().count(&db).await?, 1);
        assert_eq!(Movement::find().count(&db).await?, movements_before);
        assert_eq!(Purchase::find().count(&db).await?, 0);
        assert_eq!(PurchaseLine::find().count(&db).await?, 0);
        assert_eq!(
            get_lot_by_id(&db, existing.lot.id).await?.unwrap().quantity,
            5
        );
        let price_after = Product::find_by_id(product.id)
            .one(&db)
            .await?
            .unwrap()
            .sale_price;
        assert_eq!(price_after, price_before);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_foreign_product_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let foreign = create_test_product(&db, OTHER_TENANT, "COF", None).await?;

        let result = receive(&db, request(vec![line(foreign.id, "L1", 1, 1.0)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductNotFound { product_id } if product_id == foreign.id
        ));
        assert_eq!(Purchase::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_and_list_purchases() -> Result<()> {
        let (db, product) = setup_with_product().await?;

        let first = receive(&db, request(vec![line(product.id, "A", 1, 1.0)])).await?;
        let second = receive(
            &db,
            request(vec![line(product.id, "B", 2, 1.0), line(product.id, "C", 3, 1.0)]),
        )
        .await?;

        let detail = get_purchase(&db, TENANT, second.purchase.id).await?.unwrap();
        assert_eq!(detail.purchase, second.purchase);
        assert_eq!(detail.lines, second.lines);

        assert!(get_purchase(&db, OTHER_TENANT, first.purchase.id).await?.is_none());

        let all = list_purchases(&db, TENANT).await?;
        let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.purchase.id, first.purchase.id]);

        Ok(())
    }
}
