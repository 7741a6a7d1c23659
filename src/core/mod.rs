//! Core ledger logic - framework-agnostic lot, movement, costing and stock operations.
//!
//! Leaf modules (`lot`, `movement`) own the records; `costing` and `fifo` build on them;
//! `purchase`, `sale` and `adjustment` are the stock-changing entry points, each running
//! inside a single store transaction. `summary` is a read-only view.

/// Manual lot entry and batch withdrawals
pub mod adjustment;
/// Weighted-average cost and derived sale price
pub mod costing;
/// Oldest-entry-first lot consumption
pub mod fifo;
/// Lot store: creation, conditional decrement, FIFO listing, stock totals
pub mod lot;
/// Append-only movement log
pub mod movement;
/// Products as seen by the ledger
pub mod product;
/// Purchase intake
pub mod purchase;
/// Sale fulfillment
pub mod sale;
/// Per-product inventory summary
pub mod summary;
