//! Inventory summary - A read-only, per-product view over the lot store.
//!
//! Nothing here is persisted; the figures are computed from the lots on every call.

use crate::{
    core::{costing::weighted_average_cost, product::get_active_products},
    entities::{Lot, lot},
    errors::Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// Stock position of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    /// Units on hand across all lots
    pub total_stock: i64,
    /// Number of lots ever created for the product, including exhausted ones
    pub lot_count: usize,
    /// Weighted-average unit cost of the lots with stock
    pub average_cost: Decimal,
    pub latest_entry: Option<DateTime<Utc>>,
    /// Earliest expiration among lots that still hold stock; exhausted lots are left
    /// out even when they carry an earlier date
    pub nearest_expiration: Option<DateTime<Utc>>,
    pub sale_price: Option<f64>,
}

/// Summarises the stock of every active product of a tenant that has at least one lot.
///
/// Products are returned in name order.
pub async fn summarize_inventory(
    db: &DatabaseConnection,
    tenant_id: &str,
) -> Result<Vec<InventorySummary>> {
    let products = get_active_products(db, tenant_id).await?;
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let lots = Lot::find()
        .filter(lot::Column::ProductId.is_in(product_ids))
        .order_by_asc(lot::Column::EntryDate)
        .order_by_asc(lot::Column::Id)
        .all(db)
        .await?;

    let mut by_product: HashMap<i64, Vec<lot::Model>> = HashMap::new();
    for lot in lots {
        by_product.entry(lot.product_id).or_default().push(lot);
    }

    let mut summaries = Vec::new();
    for product in products {
        let Some(lots) = by_product.remove(&product.id) else {
            continue;
        };

        summaries.push(InventorySummary {
            product_id: product.id,
            product_name: product.name,
            sku: product.sku,
            total_stock: lots.iter().map(|l| l.quantity).sum(),
            lot_count: lots.len(),
            average_cost: weighted_average_cost(&lots)?,
            latest_entry: lots.iter().map(|l| l.entry_date).max(),
            nearest_expiration: lots
                .iter()
                .filter(|l| l.quantity > 0)
                .filter_map(|l| l.expiration_date)
                .min(),
            sale_price: product.sale_price,
        });
    }

    Ok(summaries)
}
