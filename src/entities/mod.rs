//! Entity module - Contains all SeaORM entity definitions for the ledger store.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod lot;
pub mod movement;
pub mod product;
pub mod purchase;
pub mod purchase_line;
pub mod sale;
pub mod sale_line;
pub mod sale_payment;

// Re-export specific types to avoid conflicts
pub use lot::{Column as LotColumn, Entity as Lot, Model as LotModel};
pub use movement::{
    Column as MovementColumn, Entity as Movement, Model as MovementModel, MovementKind,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use purchase_line::{
    Column as PurchaseLineColumn, Entity as PurchaseLine, Model as PurchaseLineModel,
};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use sale_line::{Column as SaleLineColumn, Entity as SaleLine, Model as SaleLineModel};
pub use sale_payment::{
    Column as SalePaymentColumn, Entity as SalePayment, Model as SalePaymentModel,
};
