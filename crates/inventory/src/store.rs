use async_trait::async_trait;
use common::Sku;

use crate::{Result, Variant};

/// Storage for per-SKU variant stock.
///
/// Implementations must make `try_deduct` atomic per SKU: the
/// `stock >= quantity` check and the decrement happen as one step, so two
/// concurrent deductions can never both succeed on the last unit.
#[async_trait]
pub trait VariantStore: Send + Sync {
    /// Looks up a variant by SKU.
    async fn get(&self, sku: &Sku) -> Result<Option<Variant>>;

    /// Atomically decrements stock by `quantity` if enough is available.
    ///
    /// Clears `is_available` when stock reaches zero. Fails with
    /// `InsufficientStock` (carrying the available count) when the guard
    /// does not hold, or `VariantNotFound` when the SKU is unknown.
    async fn try_deduct(&self, sku: &Sku, quantity: u32) -> Result<()>;

    /// Increments stock by `quantity`, setting `is_available` when the
    /// resulting stock is greater than zero.
    async fn restock(&self, sku: &Sku, quantity: u32) -> Result<()>;

    /// Inserts or replaces a variant record. Used by catalog sync and
    /// test seeding; not part of the order hot path.
    async fn upsert(&self, variant: Variant) -> Result<()>;
}
