//! Fact Model - typed records and the indexed snapshot view
//!
//! Built once per analysis run from a validated snapshot. Every engine reads
//! the same indexes; nothing downstream re-derives a join.

pub mod model;
pub mod records;

pub use model::{CustomerActivity, FactModel, FactSnapshot};
pub use records::{
    Category, Customer, Order, OrderLine, OrderStatus, Payment, Product, Review, Seller,
};
