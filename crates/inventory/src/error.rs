use common::Sku;
use thiserror::Error;

/// Errors that can occur when reading or mutating variant stock.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A SKU no longer resolves to a variant.
    #[error("Variant not found: {sku}")]
    VariantNotFound { sku: Sku },

    /// Available stock does not cover the requested quantity.
    #[error("Insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: Sku,
        requested: u32,
        available: u32,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
