use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Version};
use domain::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    OrderFilter, OrderRepository, OrderStats, OrderSummary, Result, StoreError,
};

/// In-memory order repository for testing and development.
///
/// Provides the same conditional-write semantics as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update(&self, order: &mut Order) -> Result<Version> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version().next());
        orders.insert(order.id(), order.clone());
        Ok(order.version())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| {
                if let Some(customer_id) = filter.customer_id
                    && order.customer_id() != customer_id
                {
                    return false;
                }
                if let Some(status) = filter.status
                    && order.status() != status
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn stats(&self, recent_limit: usize) -> Result<OrderStats> {
        let orders = self.orders.read().await;
        let mut stats = OrderStats::default();

        for order in orders.values() {
            stats.total_orders += 1;
            match order.status() {
                OrderStatus::AwaitingPayment => stats.awaiting_payment += 1,
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => {
                    stats.delivered += 1;
                    stats.total_revenue += order.total_amount();
                }
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
        }

        let mut recent: Vec<&Order> = orders.values().collect();
        recent.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        stats.recent_orders = recent
            .into_iter()
            .take(recent_limit)
            .map(OrderSummary::from)
            .collect();

        Ok(stats)
    }
}
