//! Variant stock storage and the stock reservation ledger.
//!
//! Stock counts are the only contended shared resource in the system, so
//! every mutation goes through an atomic conditional decrement per SKU
//! (`VariantStore::try_deduct`) rather than read-modify-write in
//! application code. The [`StockLedger`] layers order-level semantics on
//! top: deduct or restore the full item list of one order as a unit.

mod error;
mod ledger;
mod memory;
mod postgres;
mod store;
mod variant;

pub use error::{InventoryError, Result};
pub use ledger::StockLedger;
pub use memory::InMemoryVariantStore;
pub use postgres::PgVariantStore;
pub use store::VariantStore;
pub use variant::Variant;
