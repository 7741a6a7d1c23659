use crate::core::adjustment::{OutflowFailure, OutflowResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("'{code}' already exists for this tenant")]
    Conflict { code: String },

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("Lot not found: {lot_id}")]
    LotNotFound { lot_id: i64 },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: i64 },

    #[error("Inventory inconsistency for product {product_id}: {missing} units could not be drawn from lots")]
    InventoryInconsistency { product_id: i64, missing: i64 },

    #[error("Cannot take {requested} units from lot {lot_id}, only {available} on hand")]
    InvalidState {
        lot_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Start of date range must not be after its end")]
    InvalidDateRange,

    #[error("Request contains no lines")]
    EmptyRequest,

    #[error("{} of the requested outflows could not be processed; nothing was applied", failures.len())]
    OutflowsRejected {
        failures: Vec<OutflowFailure>,
        reverted: Vec<OutflowResult>,
    },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
