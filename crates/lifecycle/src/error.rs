use common::OrderId;
use domain::OrderError;
use inventory::InventoryError;
use order_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the lifecycle engine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No such order (or not visible to the caller).
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A domain rule rejected the operation (immutability, forward-only,
    /// courier gate, cancellation policy, creation validation).
    #[error(transparent)]
    Domain(#[from] OrderError),

    /// A stock rule rejected the operation (insufficient stock or a
    /// vanished variant, named per offending SKU).
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// The order store failed or detected a lost write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
