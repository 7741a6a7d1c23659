//! Product catalogue loading from catalog.toml
//!
//! This module loads the initial product catalogue from a TOML configuration file.
//! The products defined there are used to seed the database on first run or when a
//! tenant's product is missing. Stock itself is never seeded; it only enters the
//! ledger through purchases and manual lot entries.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Owning tenant
    pub tenant_id: String,
    /// Stock keeping unit, unique per tenant
    pub sku: String,
    /// Display name
    pub name: String,
    /// Profit margin in percent, if the sale price should be derived from cost
    #[serde(default)]
    pub profit_margin: Option<f64>,
}

/// Loads the product catalogue from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog.toml: {e}"),
    })
}

/// Loads the product catalogue from the default location (./catalog.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("catalog.toml")
}
