//! Shared test utilities for the lot ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating products and lots with sensible defaults.

use crate::{
    core::{
        adjustment::{ManualEntry, create_manual_lot},
        lot::NewLot,
        product,
    },
    entities,
    errors::Result,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Tenant used by most tests.
pub const TENANT: &str = "tenant-a";
/// A second tenant for isolation checks.
pub const OTHER_TENANT: &str = "tenant-b";

/// Routes `tracing` output through the test harness; `RUST_LOG` filters it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product for `tenant_id`.
///
/// # Defaults
/// * `name`: "Product {sku}"
pub async fn create_test_product(
    db: &DatabaseConnection,
    tenant_id: &str,
    sku: &str,
    profit_margin: Option<f64>,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        tenant_id,
        sku.to_string(),
        format!("Product {sku}"),
        profit_margin,
    )
    .await
}

/// Adds a lot to a product of [`TENANT`] through manual entry, so it carries its
/// inbound movement and triggers cost recomputation like real stock.
pub async fn add_test_lot(
    db: &DatabaseConnection,
    product_id: i64,
    code: &str,
    quantity: i64,
    unit_cost: f64,
    entry_date: DateTime<Utc>,
) -> Result<ManualEntry> {
    create_manual_lot(
        db,
        TENANT,
        NewLot {
            product_id,
            code: code.to_string(),
            quantity,
            unit_cost,
            entry_date,
            expiration_date: None,
        },
    )
    .await
}

/// Sets up a complete test environment with one product of [`TENANT`] (SKU "SKU-1",
/// no margin). Returns (db, product) for common test scenarios.
pub async fn setup_with_product() -> Result<(DatabaseConnection, entities::product::Model)> {
    let db = setup_test_db().await?;
    let product = create_test_product(&db, TENANT, "SKU-1", None).await?;
    Ok((db, product))
}

/// A timestamp `days` days in the past (negative for the future), to whole seconds.
pub fn days_ago(days: i64) -> DateTime<Utc> {
    (Utc::now() - Duration::days(days)).trunc_subsecs(0)
}
