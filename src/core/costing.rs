//! Costing engine - Weighted-average cost and the sale price derived from it.
//!
//! The average is taken over lots that still hold stock:
//! `avg = Σ(unit_cost × quantity) / Σ(quantity)`, and with a configured margin
//! `sale_price = round(avg × (1 + margin / 100), 2)` rounding half away from zero.
//! Arithmetic runs in `Decimal`; the store keeps `f64` columns.
//!
//! [`recompute`] runs after stock is created (purchase, manual lot entry) and never after
//! consumption, so the sale price reflects the stock composition at the last intake.

use crate::{
    core::lot::list_available_lots,
    entities::{Product, lot, product},
    errors::{Error, Result},
};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use sea_orm::{Set, prelude::*};
use tracing::debug;

/// Result of a cost recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct CostingOutcome {
    pub product_id: i64,
    /// Weighted-average unit cost of the live lots (zero without stock)
    pub average_cost: Decimal,
    /// Sale price after recomputation; unchanged from before when no margin is set
    pub sale_price: Option<f64>,
}

pub(crate) fn money_to_decimal(amount: f64) -> Result<Decimal> {
    Decimal::from_f64(amount).ok_or(Error::InvalidAmount { amount })
}

pub(crate) fn decimal_to_money(value: Decimal) -> f64 {
    // Decimal -> f64 always succeeds
    value.to_f64().unwrap_or_default()
}

/// `unit × quantity` in exact arithmetic.
///
/// Fails with `InvalidAmount` (carrying `unit`) when the product leaves `Decimal` range.
pub(crate) fn line_value(unit: f64, quantity: i64) -> Result<Decimal> {
    money_to_decimal(unit)?
        .checked_mul(Decimal::from(quantity))
        .ok_or(Error::InvalidAmount { amount: unit })
}

/// Adds two money values, reporting overflow as `InvalidAmount` on `amount`.
pub(crate) fn add_money(total: Decimal, value: Decimal, amount: f64) -> Result<Decimal> {
    total
        .checked_add(value)
        .ok_or(Error::InvalidAmount { amount })
}

/// Rounds to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Weighted-average unit cost over the lots with stock.
///
/// Lots with zero quantity are ignored; with no stock at all the cost is zero.
pub fn weighted_average_cost(lots: &[lot::Model]) -> Result<Decimal> {
    let mut total_quantity = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;

    for lot in lots.iter().filter(|l| l.quantity > 0) {
        total_quantity += Decimal::from(lot.quantity);
        let value = line_value(lot.unit_cost, lot.quantity)?;
        total_value = add_money(total_value, value, lot.unit_cost)?;
    }

    if total_quantity.is_zero() {
        return Ok(Decimal::ZERO);
    }

    Ok(total_value / total_quantity)
}

/// Sale price for an average cost and a margin in percent, rounded to cents.
pub fn derive_sale_price(average_cost: Decimal, profit_margin: f64) -> Result<Decimal> {
    let overflow = || Error::InvalidAmount {
        amount: profit_margin,
    };
    let margin = money_to_decimal(profit_margin)?;
    let factor = Decimal::ONE
        .checked_add(margin / Decimal::ONE_HUNDRED)
        .ok_or_else(overflow)?;
    let price = average_cost.checked_mul(factor).ok_or_else(overflow)?;
    Ok(round_money(price))
}

/// Recomputes a product's average cost and, if it has a margin, persists the new sale
/// price together with its update timestamp.
///
/// Must be called with the connection or transaction of the stock-creating operation so
/// it sees that operation's new lot.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist.
pub async fn recompute<C>(db: &C, product_id: i64) -> Result<CostingOutcome>
where
    C: ConnectionTrait,
{
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    let lots = list_available_lots(db, product_id).await?;
    let average_cost = weighted_average_cost(&lots)?;

    let Some(margin) = product.profit_margin else {
        debug!(
            "Product {} has no margin; sale price left at {:?}",
            product_id, product.sale_price
        );
        return Ok(CostingOutcome {
            product_id,
            average_cost,
            sale_price: product.sale_price,
        });
    };

    let sale_price = decimal_to_money(derive_sale_price(average_cost, margin)?);

    let mut active: product::ActiveModel = product.into();
    active.sale_price = Set(Some(sale_price));
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    debug!(
        "Product {} average cost {} -> sale price {}",
        product_id, average_cost, sale_price
    );

    Ok(CostingOutcome {
        product_id,
        average_cost,
        sale_price: Some(sale_price),
    })
}
