//! Domain layer for the order lifecycle engine.
//!
//! This crate provides the core domain model:
//! - The `Order` aggregate with its append-only status history
//! - The `OrderStatus` state machine and transition-resolution table
//! - Order value objects (items, shipping address, courier, actors)
//! - The threshold discount policy applied at order creation

pub mod discount;
pub mod order;

pub use discount::DiscountPolicy;
pub use order::{
    Actor, Courier, NewOrder, Order, OrderError, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, ShippingAddress, StatusHistoryEntry, Transition, resolve_transition,
};
