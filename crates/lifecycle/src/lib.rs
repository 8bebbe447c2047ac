//! The order lifecycle engine.
//!
//! Ties the domain state machine, the stock reservation ledger, and the
//! order repository together: every admin or customer action on an order
//! goes through [`OrderEngine`], which linearizes work per order, applies
//! stock side effects in lockstep with status transitions, and appends to
//! the audit trail.

mod engine;
mod error;
mod locks;
mod refund;

pub use engine::OrderEngine;
pub use error::{LifecycleError, Result};
pub use locks::OrderLocks;
pub use refund::{InMemoryRefundNotifier, RefundNotifier, RefundNotifyError, RefundRequest};
