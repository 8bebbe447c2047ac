use common::Sku;
use serde::{Deserialize, Serialize};

/// The slice of a product variant this engine owns: its stock count and
/// the derived availability flag.
///
/// `is_available` is false exactly when `stock` is zero; the deduct and
/// restock paths re-derive it on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub sku: Sku,
    pub stock: u32,
    pub is_available: bool,
}

impl Variant {
    /// Creates a variant with availability derived from the stock count.
    pub fn new(sku: impl Into<Sku>, stock: u32) -> Self {
        Self {
            sku: sku.into(),
            stock,
            is_available: stock > 0,
        }
    }
}
