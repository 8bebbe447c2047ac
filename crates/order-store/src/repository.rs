use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, Version};
use domain::{Order, OrderStatus};
use serde::Serialize;

use crate::Result;

/// Filter for listing orders, newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
    pub limit: Option<usize>,
}

impl OrderFilter {
    /// Restricts the listing to one customer's orders.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    /// Restricts the listing to one status.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Caps the number of returned orders.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A condensed order row for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            customer_id: order.customer_id(),
            status: order.status(),
            total_amount: order.total_amount(),
            created_at: order.created_at(),
        }
    }
}

/// Aggregate counts and revenue for the admin overview.
///
/// Revenue counts delivered orders only; money still in flight (or
/// refunded) is not revenue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    pub awaiting_payment: u64,
    pub pending: u64,
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
    pub total_revenue: Money,
    pub recent_orders: Vec<OrderSummary>,
}

/// Durable storage for order aggregates.
///
/// `update` is a conditional write: it succeeds only if the stored
/// version equals the aggregate's version, then persists the order under
/// the next version. This linearizes writes per order across processes.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a freshly created order.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Conditionally overwrites an order, bumping its version.
    ///
    /// Fails with `VersionConflict` if another write landed since the
    /// aggregate was loaded; the order is left untouched in that case.
    async fn update(&self, order: &mut Order) -> Result<Version>;

    /// Loads one order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching the filter, newest first.
    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Computes dashboard stats, including the `recent_limit` newest
    /// orders.
    async fn stats(&self, recent_limit: usize) -> Result<OrderStats>;
}
