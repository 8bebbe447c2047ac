use chrono::Utc;
use common::{CustomerId, OrderId};
use domain::{Actor, DiscountPolicy, NewOrder, Order, OrderStatus, PaymentStatus, Transition};
use inventory::{StockLedger, VariantStore};
use order_store::{OrderFilter, OrderRepository, OrderStats};

use crate::{LifecycleError, OrderLocks, RefundNotifier, Result};

/// Number of recent orders included in the dashboard overview.
const RECENT_ORDERS: usize = 3;

/// Stock side effect applied by the current transition, tracked so a
/// failed save can be compensated.
enum StockEffect {
    None,
    Deducted,
    Restored,
}

/// Drives orders through their lifecycle.
///
/// All mutations on one order run under that order's lock, so a
/// transition's load, stock side effects, and conditional save never
/// interleave with another transition on the same order. Stock itself is
/// only touched through the ledger's atomic per-SKU operations, gated by
/// the order's `stock_reserved` flag.
pub struct OrderEngine<R, V, N>
where
    R: OrderRepository,
    V: VariantStore,
    N: RefundNotifier,
{
    repo: R,
    ledger: StockLedger<V>,
    refunds: N,
    discount: DiscountPolicy,
    locks: OrderLocks,
}

impl<R, V, N> OrderEngine<R, V, N>
where
    R: OrderRepository,
    V: VariantStore,
    N: RefundNotifier,
{
    /// Creates an engine with the default discount policy.
    pub fn new(repo: R, variants: V, refunds: N) -> Self {
        Self {
            repo,
            ledger: StockLedger::new(variants),
            refunds,
            discount: DiscountPolicy::default(),
            locks: OrderLocks::new(),
        }
    }

    /// Overrides the discount policy.
    pub fn with_discount_policy(mut self, policy: DiscountPolicy) -> Self {
        self.discount = policy;
        self
    }

    /// Returns the ledger's variant store.
    pub fn variants(&self) -> &V {
        self.ledger.store()
    }

    /// Creates an order from checkout input.
    ///
    /// Computes subtotal, discount, and total once; prechecks that every
    /// SKU currently covers its quantity (naming the offender if not) but
    /// reserves nothing — reservation happens on the `Processing`
    /// transition.
    #[tracing::instrument(skip(self, new), fields(customer_id = %new.customer_id))]
    pub async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let order = Order::create(new, &self.discount, Utc::now())?;
        self.ledger.check(order.items()).await?;
        self.repo.insert(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), "order created");
        Ok(order)
    }

    /// Loads one order.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.repo
            .get(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    /// Loads one order, visible only to its owner.
    pub async fn get_order_for(&self, id: OrderId, customer_id: CustomerId) -> Result<Order> {
        let order = self.get_order(id).await?;
        if order.customer_id() != customer_id {
            // Another customer's order looks like a missing one.
            return Err(LifecycleError::NotFound(id));
        }
        Ok(order)
    }

    /// Lists orders matching the filter, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        Ok(self.repo.list(filter).await?)
    }

    /// Computes the admin dashboard overview.
    pub async fn stats(&self) -> Result<OrderStats> {
        Ok(self.repo.stats(RECENT_ORDERS).await?)
    }

    /// Executes a validated status transition on behalf of an actor.
    ///
    /// Side effects run in lockstep with the status change: entering
    /// `Processing` deducts stock (exactly once, all-or-nothing),
    /// cancelling restores it, and `Shipped` is gated on an assigned
    /// courier. Every success appends one audit-trail entry.
    #[tracing::instrument(skip(self, comment), fields(order_id = %id, requested = %requested))]
    pub async fn transition(
        &self,
        id: OrderId,
        requested: OrderStatus,
        actor: Actor,
        comment: Option<String>,
    ) -> Result<Order> {
        let _guard = self.locks.acquire(id).await;

        let mut order = self.get_order(id).await?;
        let transition = order.resolve(requested)?;
        let now = Utc::now();
        let mut effect = StockEffect::None;

        match transition {
            Transition::Cancel => {
                if order.stock_reserved() {
                    self.ledger.restore(order.items()).await?;
                    order.set_stock_reserved(false, now);
                    effect = StockEffect::Restored;
                }
                order.record_cancellation(actor, comment, now)?;
            }
            Transition::Advance { reserves_stock, .. } => {
                if reserves_stock && !order.stock_reserved() {
                    self.ledger.deduct(order.items()).await?;
                    order.set_stock_reserved(true, now);
                    effect = StockEffect::Deducted;
                }
                order.record_advance(requested, actor, comment, now)?;
            }
        }

        if let Err(err) = self.repo.update(&mut order).await {
            self.compensate(&order, effect).await;
            return Err(err.into());
        }

        if order.status() == OrderStatus::Cancelled
            && order.payment_status() == PaymentStatus::Paid
        {
            // Refund execution belongs to the payments workflow; a failed
            // hand-off must not undo the cancellation.
            if let Err(err) = self
                .refunds
                .refund_requested(order.id(), order.total_amount())
                .await
            {
                tracing::error!(order_id = %order.id(), error = %err, "refund hand-off failed");
            }
        }

        metrics::counter!("order_transitions_total", "status" => requested.as_str()).increment(1);
        tracing::info!(status = %order.status(), "order transitioned");
        Ok(order)
    }

    /// Customer-initiated cancellation, restricted to the caller's own
    /// pending cash-on-delivery orders.
    #[tracing::instrument(skip(self, comment), fields(order_id = %id, customer_id = %customer_id))]
    pub async fn cancel_by_customer(
        &self,
        id: OrderId,
        customer_id: CustomerId,
        comment: Option<String>,
    ) -> Result<Order> {
        let _guard = self.locks.acquire(id).await;

        let mut order = self.get_order_for(id, customer_id).await?;
        // Pending orders never hold reserved stock, so no restore here.
        order.record_customer_cancellation(comment, Utc::now())?;
        self.repo.update(&mut order).await?;

        metrics::counter!("order_transitions_total", "status" => OrderStatus::Cancelled.as_str())
            .increment(1);
        tracing::info!("order cancelled by customer");
        Ok(order)
    }

    /// Attaches the shipping carrier to an order. A prerequisite for the
    /// `Shipped` transition, not a transition itself.
    #[tracing::instrument(skip(self), fields(order_id = %id))]
    pub async fn assign_courier(
        &self,
        id: OrderId,
        carrier_name: &str,
        tracking_id: &str,
    ) -> Result<Order> {
        let _guard = self.locks.acquire(id).await;

        let mut order = self.get_order(id).await?;
        order.assign_courier(carrier_name, tracking_id, Utc::now())?;
        self.repo.update(&mut order).await?;

        tracing::info!(carrier = carrier_name, "courier assigned");
        Ok(order)
    }

    /// Undoes this call's stock side effect after a failed save, so a
    /// retry starts from the pre-call stock level.
    async fn compensate(&self, order: &Order, effect: StockEffect) {
        let outcome = match effect {
            StockEffect::None => return,
            StockEffect::Deducted => self.ledger.restore(order.items()).await,
            StockEffect::Restored => self.ledger.deduct(order.items()).await,
        };
        if let Err(err) = outcome {
            tracing::error!(order_id = %order.id(), error = %err, "stock compensation failed");
        }
    }
}
