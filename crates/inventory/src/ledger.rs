use domain::OrderItem;

use crate::{Result, VariantStore};

/// Applies and reverses stock deltas for the full item list of one order
/// as a single logical unit.
///
/// `deduct` validates every item before committing anything, and rolls
/// back already-applied decrements if a commit step loses a race. The
/// ledger itself is stateless; the caller's `stock_reserved` flag on the
/// order guarantees at-most-once deduction and restoration per direction.
pub struct StockLedger<V: VariantStore> {
    store: V,
}

impl<V: VariantStore> StockLedger<V> {
    /// Creates a ledger over the given variant store.
    pub fn new(store: V) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying variant store.
    pub fn store(&self) -> &V {
        &self.store
    }

    /// Checks that every item's quantity is covered by current stock,
    /// without mutating anything. Fails on the first offending SKU.
    pub async fn check(&self, items: &[OrderItem]) -> Result<()> {
        for item in items {
            let variant = self.store.get(&item.sku).await?.ok_or_else(|| {
                crate::InventoryError::VariantNotFound {
                    sku: item.sku.clone(),
                }
            })?;
            if variant.stock < item.quantity {
                return Err(crate::InventoryError::InsufficientStock {
                    sku: item.sku.clone(),
                    requested: item.quantity,
                    available: variant.stock,
                });
            }
        }
        Ok(())
    }

    /// Deducts every item's quantity from its variant's stock,
    /// all-or-nothing.
    ///
    /// Validation runs over the whole set before any mutation. The commit
    /// phase uses the store's atomic conditional decrement per SKU; if a
    /// concurrent order consumes stock between validation and commit, the
    /// failed step triggers rollback of the decrements already applied.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn deduct(&self, items: &[OrderItem]) -> Result<()> {
        self.check(items).await?;

        for (committed, item) in items.iter().enumerate() {
            if let Err(err) = self.store.try_deduct(&item.sku, item.quantity).await {
                metrics::counter!("stock_deduction_conflicts_total").increment(1);
                tracing::warn!(
                    sku = %item.sku,
                    error = %err,
                    "stock deduction lost a race, rolling back prior items"
                );
                self.rollback(&items[..committed]).await;
                return Err(err);
            }
        }

        metrics::counter!("stock_deductions_total").increment(1);
        Ok(())
    }

    /// Restores every item's quantity to its variant's stock, re-enabling
    /// availability where stock becomes positive.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn restore(&self, items: &[OrderItem]) -> Result<()> {
        for item in items {
            self.store.restock(&item.sku, item.quantity).await?;
        }
        metrics::counter!("stock_restorations_total").increment(1);
        Ok(())
    }

    async fn rollback(&self, committed: &[OrderItem]) {
        for item in committed {
            if let Err(err) = self.store.restock(&item.sku, item.quantity).await {
                // The variant vanished mid-rollback; nothing left to undo.
                tracing::error!(sku = %item.sku, error = %err, "stock rollback failed");
            }
        }
    }
}
