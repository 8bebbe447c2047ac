//! Durable storage for order aggregates.
//!
//! The repository supports read, conditional write (optimistic concurrency
//! on the order's version), filtered listing for dashboards, and the
//! aggregate stats the admin overview needs. Two implementations share the
//! same semantics: an in-memory store for tests and development, and a
//! PostgreSQL store persisting each order as a JSONB document with
//! extracted columns for filtering.

mod error;
mod memory;
mod postgres;
mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderRepository;
pub use postgres::PgOrderRepository;
pub use repository::{OrderFilter, OrderRepository, OrderStats, OrderSummary};
