//! Sale fulfillment - Records a sale and draws its lines from stock in FIFO order.
//!
//! Every line is checked against the product's total stock before anything is written;
//! the first shortfall rejects the sale naming the product. The header, lines, payments,
//! lot decrements and outbound movements then commit as one transaction. A sale never
//! recomputes cost or sale price.

use crate::{
    core::{
        costing::{add_money, decimal_to_money, line_value, round_money},
        fifo::{LotDraw, consume},
        lot::sum_stock,
        product::get_product_for_tenant,
    },
    entities::{Sale, SaleLine, SalePayment, sale, sale_line, sale_payment},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// One sold product.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLineRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

/// One payment towards the sale.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub payment_method_id: i64,
    pub amount: f64,
}

/// A sale to fulfil.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRequest {
    pub tenant_id: String,
    pub client_id: i64,
    pub status: String,
    pub lines: Vec<SaleLineRequest>,
    pub payments: Vec<PaymentRequest>,
}

/// Lots a sale line was drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFulfillment {
    pub sale_line_id: i64,
    pub product_id: i64,
    pub draws: Vec<LotDraw>,
}

/// A recorded sale and the lots it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleReceipt {
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
    pub payments: Vec<sale_payment::Model>,
    pub fulfillments: Vec<LineFulfillment>,
}

/// A stored sale with lines and payments.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDetail {
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
    pub payments: Vec<sale_payment::Model>,
}

fn validate_request(request: &SaleRequest) -> Result<()> {
    if request.lines.is_empty() {
        return Err(Error::EmptyRequest);
    }

    for line in &request.lines {
        if line.quantity < 1 {
            return Err(Error::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        if !line.unit_price.is_finite() || line.unit_price < 0.0 {
            return Err(Error::InvalidAmount {
                amount: line.unit_price,
            });
        }
    }

    for payment in &request.payments {
        if !payment.amount.is_finite() || payment.amount < 0.0 {
            return Err(Error::InvalidAmount {
                amount: payment.amount,
            });
        }
    }

    Ok(())
}

fn line_subtotal(line: &SaleLineRequest) -> Result<Decimal> {
    Ok(round_money(line_value(line.unit_price, line.quantity)?))
}

/// Records a sale and consumes stock for each line in FIFO order.
///
/// # Errors
/// - `EmptyRequest` if the sale has no lines
/// - `InvalidQuantity` / `InvalidAmount` for invalid lines or payments
/// - `ProductNotFound` if a line names a product outside the tenant
/// - `InsufficientStock` naming the first product whose stock cannot cover its line
/// - `InventoryInconsistency` if stock vanished during consumption; the sale is rolled back
#[instrument(skip(db, request), fields(tenant_id = %request.tenant_id, lines = request.lines.len()))]
pub async fn sell(db: &DatabaseConnection, request: SaleRequest) -> Result<SaleReceipt> {
    validate_request(&request)?;

    let mut subtotals = Vec::with_capacity(request.lines.len());
    let mut total = Decimal::ZERO;
    for line in &request.lines {
        let subtotal = line_subtotal(line)?;
        total = add_money(total, subtotal, line.unit_price)?;
        subtotals.push(subtotal);
    }

    let txn = db.begin().await?;

    for line in &request.lines {
        get_product_for_tenant(&txn, &request.tenant_id, line.product_id).await?;
        let available = sum_stock(&txn, line.product_id).await?;
        if available < line.quantity {
            return Err(Error::InsufficientStock {
                product_id: line.product_id,
                available,
                requested: line.quantity,
            });
        }
    }

    let sale = sale::ActiveModel {
        tenant_id: Set(request.tenant_id.clone()),
        client_id: Set(request.client_id),
        total: Set(decimal_to_money(total)),
        status: Set(request.status.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(request.lines.len());
    for (line, subtotal) in request.lines.iter().zip(subtotals) {
        let stored = sale_line::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            subtotal: Set(decimal_to_money(subtotal)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        lines.push(stored);
    }

    let mut payments = Vec::with_capacity(request.payments.len());
    for payment in &request.payments {
        let stored = sale_payment::ActiveModel {
            sale_id: Set(sale.id),
            payment_method_id: Set(payment.payment_method_id),
            amount: Set(payment.amount),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        payments.push(stored);
    }

    let description = format!("Sale #{}", sale.id);
    let mut fulfillments = Vec::with_capacity(lines.len());
    for line in &lines {
        let draws = consume(
            &txn,
            &request.tenant_id,
            line.product_id,
            line.quantity,
            &description,
        )
        .await?;
        fulfillments.push(LineFulfillment {
            sale_line_id: line.id,
            product_id: line.product_id,
            draws,
        });
    }

    txn.commit().await?;

    info!(
        "Recorded sale {} with {} lines, total {}",
        sale.id,
        lines.len(),
        sale.total
    );

    Ok(SaleReceipt {
        sale,
        lines,
        payments,
        fulfillments,
    })
}

/// Loads a tenant's sale with its lines and payments.
pub async fn get_sale(
    db: &DatabaseConnection,
    tenant_id: &str,
    sale_id: i64,
) -> Result<Option<SaleDetail>> {
    let Some(sale) = Sale::find_by_id(sale_id)
        .filter(sale::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let lines = SaleLine::find()
        .filter(sale_line::Column::SaleId.eq(sale.id))
        .order_by_asc(sale_line::Column::Id)
        .all(db)
        .await?;
    let payments = SalePayment::find()
        .filter(sale_payment::Column::SaleId.eq(sale.id))
        .order_by_asc(sale_payment::Column::Id)
        .all(db)
        .await?;

    Ok(Some(SaleDetail {
        sale,
        lines,
        payments,
    }))
}
