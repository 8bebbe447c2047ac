//! Order aggregate and related types.

mod aggregate;
mod status;
mod value_objects;

pub use aggregate::{NewOrder, Order};
pub use status::{OrderStatus, Transition, resolve_transition};
pub use value_objects::{
    Actor, Courier, OrderItem, PaymentMethod, PaymentStatus, ShippingAddress, StatusHistoryEntry,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The order is cancelled and rejects every further change.
    #[error("Order is cancelled and can no longer be modified")]
    Immutable,

    /// Shipped orders cannot be recalled.
    #[error("Shipped orders cannot be cancelled")]
    ShippedOrderCancellation,

    /// Delivered orders are complete; the goods are with the customer.
    #[error("Delivered orders cannot be cancelled")]
    DeliveredOrderCancellation,

    /// Status may only advance along the linear sequence.
    #[error("Status can only move forward: {current} -> {requested} is not allowed")]
    NotForward {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// The requested status is not a recognized order status.
    #[error("Unknown order status: {value}")]
    UnknownStatus { value: String },

    /// Shipping requires an assigned courier with a tracking ID.
    #[error("A courier with a tracking ID must be assigned before shipping")]
    CourierRequired,

    /// The courier cannot change once the order has shipped.
    #[error("Courier cannot be reassigned after shipment")]
    CourierLocked,

    /// A courier field was empty on assignment.
    #[error("Courier {field} must not be empty")]
    EmptyCourierField { field: &'static str },

    /// Customers may only self-cancel while the order is pending.
    #[error("Orders can only be cancelled while pending (current status: {current})")]
    CancelWindowClosed { current: OrderStatus },

    /// Online-paid orders require an admin-mediated refund.
    #[error("Online-paid orders cannot be self-cancelled; contact support for a refund")]
    SelfCancelOnlinePaid,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid item quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid unit price.
    #[error("Invalid unit price: {price} (must not be negative)")]
    InvalidUnitPrice { price: i64 },

    /// A required shipping address field was missing or empty.
    #[error("Shipping address {field} must not be empty")]
    MissingShippingField { field: &'static str },
}
