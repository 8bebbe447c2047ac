//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, Sku};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// Who performed an order operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Customer,
    Admin,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Customer => write!(f, "customer"),
            Actor::Admin => write!(f, "admin"),
        }
    }
}

/// How the order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash collected by the courier on delivery.
    CashOnDelivery,
    /// Paid up front through the online payment gateway.
    OnlinePrepaid,
}

/// Payment state, tracked independently of the order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A line item, frozen at the moment the order is created.
///
/// `unit_price` is the price at time of purchase and does not track
/// later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Variant SKU; the unit of stock reservation.
    pub sku: Sku,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: ProductId,
        sku: impl Into<Sku>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            sku: sku.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Postal and contact details for delivery. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ShippingAddress {
    /// Checks that every field is present and non-blank.
    pub fn validate(&self) -> Result<(), OrderError> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(OrderError::MissingShippingField { field });
            }
        }
        Ok(())
    }
}

/// Shipping-carrier identity attached before the `Shipped` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    pub carrier_name: String,
    pub tracking_id: String,
    /// Stamped by the `Shipped` transition; locks the courier record.
    pub shipped_at: Option<DateTime<Utc>>,
}

/// One entry in an order's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    /// Optional admin-authored note, visible to the customer.
    pub comment: Option<String>,
    pub updated_by: Actor,
}
