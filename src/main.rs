use dotenvy::dotenv;
use lot_ledger::{
    config::{catalog, database},
    core::{product, summary},
    errors::{Error, Result},
};
use std::{collections::BTreeSet, path::Path};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Connect and make sure the schema exists
    if std::env::var("DATABASE_URL").is_err() {
        std::fs::create_dir_all("data").map_err(|e| Error::Config {
            message: format!("Failed to create data directory: {e}"),
        })?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 4. Seed the product catalogue, if one is present
    let tenants = if Path::new("catalog.toml").exists() {
        let catalog = catalog::load_default_config()?;
        product::seed_products(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed products: {}", e))?;
        catalog
            .products
            .into_iter()
            .map(|p| p.tenant_id)
            .collect::<BTreeSet<_>>()
    } else {
        warn!("No catalog.toml found; skipping product seeding.");
        BTreeSet::new()
    };

    // 5. Report where each tenant's stock stands
    for tenant_id in tenants {
        let summaries = summary::summarize_inventory(&db, &tenant_id).await?;
        let units: i64 = summaries.iter().map(|s| s.total_stock).sum();
        info!(
            "Tenant {}: {} stocked products, {} units on hand",
            tenant_id,
            summaries.len(),
            units
        );
    }

    Ok(())
}
