//! Database configuration module for the lot ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and the composite indexes the ledger relies on are created alongside them: the
//! per-tenant unique lot code, the `(product_id, entry_date)` FIFO ordering key, the
//! per-tenant unique SKU, and the movement lookups by lot and by tenant/time.

use crate::entities::{
    Lot, LotColumn, Movement, MovementColumn, Product, ProductColumn, Purchase, PurchaseLine,
    Sale, SaleLine, SalePayment,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/lot_ledger.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all ledger tables and indexes if they do not exist yet.
///
/// Safe to call on every start-up.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Lot),
        schema.create_table_from_entity(Movement),
        schema.create_table_from_entity(Purchase),
        schema.create_table_from_entity(PurchaseLine),
        schema.create_table_from_entity(Sale),
        schema.create_table_from_entity(SaleLine),
        schema.create_table_from_entity(SalePayment),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    for mut index in ledger_indexes() {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    info!("Ledger tables and indexes ensured.");
    Ok(())
}

fn ledger_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_lots_tenant_code")
            .table(Lot)
            .col(LotColumn::TenantId)
            .col(LotColumn::Code)
            .unique()
            .to_owned(),
        Index::create()
            .name("idx_lots_product_entry")
            .table(Lot)
            .col(LotColumn::ProductId)
            .col(LotColumn::EntryDate)
            .to_owned(),
        Index::create()
            .name("idx_products_tenant_sku")
            .table(Product)
            .col(ProductColumn::TenantId)
            .col(ProductColumn::Sku)
            .unique()
            .to_owned(),
        Index::create()
            .name("idx_movements_lot")
            .table(Movement)
            .col(MovementColumn::LotId)
            .to_owned(),
        Index::create()
            .name("idx_movements_tenant_time")
            .table(Movement)
            .col(MovementColumn::TenantId)
            .col(MovementColumn::Timestamp)
            .to_owned(),
    ]
}
