//! Threshold discount rule applied once at order creation.

use common::Money;

/// A single-threshold percentage discount.
///
/// `discount(subtotal) = subtotal >= threshold ? subtotal * percent / 100 : 0`
///
/// The discount is computed exactly once when the order is created and is
/// never recomputed, even if the policy changes later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountPolicy {
    /// Minimum subtotal that qualifies for the discount.
    pub threshold: Money,
    /// Whole-number percentage taken off the subtotal.
    pub percent: u32,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            threshold: Money::from_minor(300_000),
            percent: 5,
        }
    }
}

impl DiscountPolicy {
    /// Returns the discount amount for the given subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.threshold {
            subtotal.percent(self.percent)
        } else {
            Money::zero()
        }
    }
}
