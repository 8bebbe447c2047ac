use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Sku;

use crate::{InventoryError, Result, Variant, VariantStore};

/// In-memory variant store.
///
/// Mirrors the PostgreSQL implementation's semantics: the conditional
/// decrement is checked and applied under a single write lock, so it is
/// atomic per SKU.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVariantStore {
    state: Arc<RwLock<HashMap<Sku, Variant>>>,
}

impl InMemoryVariantStore {
    /// Creates a new empty in-memory variant store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a SKU, for test inspection.
    pub fn stock_of(&self, sku: &Sku) -> Option<u32> {
        self.state.read().unwrap().get(sku).map(|v| v.stock)
    }

    /// Returns the number of variants held.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().len()
    }

    /// Returns true if no variants are held.
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().is_empty()
    }
}

#[async_trait]
impl VariantStore for InMemoryVariantStore {
    async fn get(&self, sku: &Sku) -> Result<Option<Variant>> {
        Ok(self.state.read().unwrap().get(sku).cloned())
    }

    async fn try_deduct(&self, sku: &Sku, quantity: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let variant = state
            .get_mut(sku)
            .ok_or_else(|| InventoryError::VariantNotFound { sku: sku.clone() })?;

        if variant.stock < quantity {
            return Err(InventoryError::InsufficientStock {
                sku: sku.clone(),
                requested: quantity,
                available: variant.stock,
            });
        }

        variant.stock -= quantity;
        variant.is_available = variant.stock > 0;
        Ok(())
    }

    async fn restock(&self, sku: &Sku, quantity: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let variant = state
            .get_mut(sku)
            .ok_or_else(|| InventoryError::VariantNotFound { sku: sku.clone() })?;

        variant.stock += quantity;
        variant.is_available = variant.stock > 0;
        Ok(())
    }

    async fn upsert(&self, variant: Variant) -> Result<()> {
        self.state
            .write()
            .unwrap()
            .insert(variant.sku.clone(), variant);
        Ok(())
    }
}
