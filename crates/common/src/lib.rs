//! Shared types for the order lifecycle engine.
//!
//! Identifier newtypes and an integer-backed money type used across
//! the domain, inventory, storage, and API crates.

pub mod types;

pub use types::{CustomerId, Money, OrderId, ProductId, Sku, Version};
