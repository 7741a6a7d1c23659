//! Product operations the ledger depends on.
//!
//! General product CRUD lives outside the ledger. This module only covers what stock
//! operations need: creating a product with its tenant-scoped SKU, tenant-scoped lookups,
//! changing the profit margin, and seeding the catalogue from configuration. The sale
//! price is owned by the costing engine and is deliberately not touched here.

use crate::{
    config::catalog,
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

fn validate_margin(profit_margin: Option<f64>) -> Result<()> {
    match profit_margin {
        Some(margin) if !margin.is_finite() || margin < 0.0 => {
            Err(Error::InvalidAmount { amount: margin })
        }
        _ => Ok(()),
    }
}

/// Creates a new active product for a tenant.
///
/// The SKU and name are trimmed and must not be empty. The SKU must be unique within
/// the tenant. The sale price starts unset until the first stock-creating operation.
///
/// # Errors
/// Returns an error if:
/// - The SKU or name is empty or whitespace-only
/// - The margin is negative or not finite
/// - The tenant already has a product with this SKU
/// - The database insert operation fails
pub async fn create_product<C>(
    db: &C,
    tenant_id: &str,
    sku: String,
    name: String,
    profit_margin: Option<f64>,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    if sku.trim().is_empty() {
        return Err(Error::Config {
            message: "Product SKU cannot be empty".to_string(),
        });
    }

    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    validate_margin(profit_margin)?;

    let sku = sku.trim().to_string();
    if get_product_by_sku(db, tenant_id, &sku).await?.is_some() {
        return Err(Error::Conflict { code: sku });
    }

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        tenant_id: Set(tenant_id.to_string()),
        sku: Set(sku),
        name: Set(name.trim().to_string()),
        profit_margin: Set(profit_margin),
        sale_price: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Retrieves a product by its unique ID regardless of tenant.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a tenant's product by SKU.
pub async fn get_product_by_sku<C>(
    db: &C,
    tenant_id: &str,
    sku: &str,
) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::TenantId.eq(tenant_id))
        .filter(product::Column::Sku.eq(sku))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a product that must belong to `tenant_id`.
///
/// A product owned by another tenant is reported exactly like a missing one.
pub async fn get_product_for_tenant<C>(
    db: &C,
    tenant_id: &str,
    product_id: i64,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { product_id })
}

/// Lists a tenant's active products ordered by name.
pub async fn get_active_products<C>(db: &C, tenant_id: &str) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::TenantId.eq(tenant_id))
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes the profit margin of a product.
///
/// The stored sale price keeps its current value until the next purchase or manual
/// lot entry for this product recomputes it.
pub async fn set_profit_margin(
    db: &DatabaseConnection,
    tenant_id: &str,
    product_id: i64,
    profit_margin: Option<f64>,
) -> Result<product::Model> {
    validate_margin(profit_margin)?;

    let mut product: product::ActiveModel = get_product_for_tenant(db, tenant_id, product_id)
        .await?
        .into();
    product.profit_margin = Set(profit_margin);
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Inserts every catalogue product that does not exist yet for its tenant.
///
/// Existing products (matched on tenant and SKU) are left as they are.
/// Returns the number of products created.
pub async fn seed_products(db: &DatabaseConnection, config: &catalog::Config) -> Result<usize> {
    let mut created = 0;
    for entry in &config.products {
        if get_product_by_sku(db, &entry.tenant_id, entry.sku.trim())
            .await?
            .is_some()
        {
            debug!(
                "Product {} already present for tenant {}",
                entry.sku, entry.tenant_id
            );
            continue;
        }
        create_product(
            db,
            &entry.tenant_id,
            entry.sku.clone(),
            entry.name.clone(),
            entry.profit_margin,
        )
        .await?;
        created += 1;
    }
    info!("Seeded {} catalogue products", created);
    Ok(created)
}
