/// Database configuration and connection management
pub mod database;

/// Product catalogue loading from catalog.toml
pub mod catalog;
