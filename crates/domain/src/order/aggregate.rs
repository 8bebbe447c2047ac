//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, Version};
use serde::{Deserialize, Serialize};

use crate::discount::DiscountPolicy;

use super::{
    Actor, Courier, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress, StatusHistoryEntry, Transition, resolve_transition,
};

/// Everything needed to create an order; produced by checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Order aggregate root.
///
/// Created once, mutated only through validated status transitions, never
/// deleted. Cancellation is a terminal status, not deletion, so the audit
/// trail in `status_history` is preserved permanently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    version: Version,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    shipping_address: ShippingAddress,
    subtotal: Money,
    discount: Money,
    total_amount: Money,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    status: OrderStatus,
    cancelled_by: Option<Actor>,
    /// True iff stock has been deducted for this order and not yet restored.
    /// Gates the ledger so each order deducts/restores at most once.
    stock_reserved: bool,
    courier: Option<Courier>,
    status_history: Vec<StatusHistoryEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order, computing subtotal, discount, and total once.
    ///
    /// Validates items and shipping address up front; no stock is reserved
    /// here. Cash-on-delivery orders start `Pending`, online-prepaid orders
    /// start `AwaitingPayment` until the gateway confirms.
    pub fn create(
        new: NewOrder,
        policy: &DiscountPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if new.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &new.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if item.unit_price.is_negative() {
                return Err(OrderError::InvalidUnitPrice {
                    price: item.unit_price.minor(),
                });
            }
        }
        new.shipping_address.validate()?;

        let subtotal: Money = new.items.iter().map(OrderItem::line_total).sum();
        let discount = policy.discount_for(subtotal);
        let total_amount = subtotal - discount;

        let status = match new.payment_method {
            PaymentMethod::CashOnDelivery => OrderStatus::Pending,
            PaymentMethod::OnlinePrepaid => OrderStatus::AwaitingPayment,
        };

        Ok(Self {
            id: OrderId::new(),
            version: Version::initial(),
            customer_id: new.customer_id,
            items: new.items,
            shipping_address: new.shipping_address,
            subtotal,
            discount,
            total_amount,
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            status,
            cancelled_by: None,
            stock_reserved: false,
            courier: None,
            status_history: vec![StatusHistoryEntry {
                status,
                at: now,
                comment: None,
                updated_by: Actor::Customer,
            }],
            created_at: now,
            updated_at: now,
        })
    }

    // -- Accessors --

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn cancelled_by(&self) -> Option<Actor> {
        self.cancelled_by
    }

    pub fn stock_reserved(&self) -> bool {
        self.stock_reserved
    }

    pub fn courier(&self) -> Option<&Courier> {
        self.courier.as_ref()
    }

    pub fn status_history(&self) -> &[StatusHistoryEntry] {
        &self.status_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Resolves a requested status change against the current status
    /// without mutating anything.
    pub fn resolve(&self, requested: OrderStatus) -> Result<Transition, OrderError> {
        resolve_transition(self.status, requested)
    }

    // -- Mutators (invoked by the lifecycle engine) --

    /// Flags whether the ledger currently holds a deduction for this order.
    pub fn set_stock_reserved(&mut self, reserved: bool, now: DateTime<Utc>) {
        self.stock_reserved = reserved;
        self.updated_at = now;
    }

    /// Records a cancellation. The caller must have restored any reserved
    /// stock first; this re-validates the guard before mutating.
    pub fn record_cancellation(
        &mut self,
        actor: Actor,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.resolve(OrderStatus::Cancelled)?;
        self.status = OrderStatus::Cancelled;
        self.cancelled_by = Some(actor);
        self.push_history(OrderStatus::Cancelled, actor, comment, now);
        Ok(())
    }

    /// Records a customer-initiated cancellation.
    ///
    /// Stricter than the admin path: only `Pending` cash-on-delivery orders
    /// qualify. No stock restoration is needed because stock is never
    /// reserved while `Pending`.
    pub fn record_customer_cancellation(
        &mut self,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::CancelWindowClosed {
                current: self.status,
            });
        }
        if self.payment_method == PaymentMethod::OnlinePrepaid {
            return Err(OrderError::SelfCancelOnlinePaid);
        }
        self.record_cancellation(Actor::Customer, comment, now)
    }

    /// Records a forward transition. Stock reservation for `Processing`
    /// must already have happened; this validates the courier gate, stamps
    /// `shipped_at`, records the payment signal, and appends history.
    pub fn record_advance(
        &mut self,
        requested: OrderStatus,
        actor: Actor,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let transition = self.resolve(requested)?;
        let Transition::Advance {
            to,
            requires_courier,
            confirms_payment,
            ..
        } = transition
        else {
            // Cancellation goes through record_cancellation.
            return Err(OrderError::NotForward {
                current: self.status,
                requested,
            });
        };

        if requires_courier {
            match &mut self.courier {
                Some(courier) if !courier.tracking_id.trim().is_empty() => {
                    courier.shipped_at = Some(now);
                }
                _ => return Err(OrderError::CourierRequired),
            }
        }

        if confirms_payment {
            self.payment_status = PaymentStatus::Paid;
        }
        // Cash is collected at the door.
        if to == OrderStatus::Delivered && self.payment_method == PaymentMethod::CashOnDelivery {
            self.payment_status = PaymentStatus::Paid;
        }

        self.status = to;
        self.push_history(to, actor, comment, now);
        Ok(())
    }

    /// Attaches the shipping carrier. A prerequisite write, not a status
    /// transition; shipping itself happens via `record_advance(Shipped)`.
    pub fn assign_courier(
        &mut self,
        carrier_name: impl Into<String>,
        tracking_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status == OrderStatus::Cancelled {
            return Err(OrderError::Immutable);
        }
        if let Some(courier) = &self.courier
            && courier.shipped_at.is_some()
        {
            return Err(OrderError::CourierLocked);
        }

        let carrier_name = carrier_name.into();
        let tracking_id = tracking_id.into();
        if carrier_name.trim().is_empty() {
            return Err(OrderError::EmptyCourierField {
                field: "carrier name",
            });
        }
        if tracking_id.trim().is_empty() {
            return Err(OrderError::EmptyCourierField {
                field: "tracking ID",
            });
        }

        self.courier = Some(Courier {
            carrier_name,
            tracking_id,
            shipped_at: None,
        });
        self.updated_at = now;
        Ok(())
    }

    fn push_history(
        &mut self,
        status: OrderStatus,
        actor: Actor,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status_history.push(StatusHistoryEntry {
            status,
            at: now,
            comment,
            updated_by: actor,
        });
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use common::ProductId;

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: "+1-555-0199".to_string(),
            address: "7 Harbor Lane".to_string(),
        }
    }

    fn item(sku: &str, unit_price: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            ProductId::new(),
            sku,
            format!("Variant {sku}"),
            Money::from_minor(unit_price),
            quantity,
        )
    }

    fn cod_order(items: Vec<OrderItem>) -> Order {
        Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items,
                shipping_address: address(),
                payment_method: PaymentMethod::CashOnDelivery,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_computes_totals_once() {
        let order = cod_order(vec![item("A", 100_000, 2), item("B", 50_000, 2)]);
        assert_eq!(order.subtotal(), Money::from_minor(300_000));
        assert_eq!(order.discount(), Money::from_minor(15_000));
        assert_eq!(order.total_amount(), Money::from_minor(285_000));
        assert_eq!(order.total_amount(), order.subtotal() - order.discount());
    }

    #[test]
    fn create_seeds_history_with_initial_status() {
        let order = cod_order(vec![item("A", 1_000, 1)]);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.status_history().len(), 1);
        assert_eq!(order.status_history()[0].status, OrderStatus::Pending);
        assert_eq!(order.version(), Version::initial());
        assert!(!order.stock_reserved());
    }

    #[test]
    fn online_prepaid_starts_awaiting_payment() {
        let order = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![item("A", 1_000, 1)],
                shipping_address: address(),
                payment_method: PaymentMethod::OnlinePrepaid,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::AwaitingPayment);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn create_rejects_empty_items() {
        let result = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![],
                shipping_address: address(),
                payment_method: PaymentMethod::CashOnDelivery,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn create_rejects_zero_quantity() {
        let result = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![item("A", 1_000, 0)],
                shipping_address: address(),
                payment_method: PaymentMethod::CashOnDelivery,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), OrderError::InvalidQuantity { quantity: 0 });
    }

    #[test]
    fn create_rejects_blank_address() {
        let mut addr = address();
        addr.email = String::new();
        let result = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![item("A", 1_000, 1)],
                shipping_address: addr,
                payment_method: PaymentMethod::CashOnDelivery,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        );
        assert_eq!(
            result.unwrap_err(),
            OrderError::MissingShippingField { field: "email" }
        );
    }

    #[test]
    fn advance_appends_history() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(
                OrderStatus::Processing,
                Actor::Admin,
                Some("packing".to_string()),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.status_history().len(), 2);
        let entry = order.status_history().last().unwrap();
        assert_eq!(entry.status, OrderStatus::Processing);
        assert_eq!(entry.comment.as_deref(), Some("packing"));
        assert_eq!(entry.updated_by, Actor::Admin);
    }

    #[test]
    fn advance_backwards_is_rejected() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        let err = order
            .record_advance(OrderStatus::Pending, Actor::Admin, None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::NotForward {
                current: OrderStatus::Processing,
                requested: OrderStatus::Pending
            }
        );
        assert_eq!(order.status_history().len(), 2);
    }

    #[test]
    fn shipping_without_courier_fails() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        let err = order
            .record_advance(OrderStatus::Shipped, Actor::Admin, None, Utc::now())
            .unwrap_err();
        assert_eq!(err, OrderError::CourierRequired);
        assert_eq!(order.status(), OrderStatus::Processing);
    }

    #[test]
    fn shipping_with_courier_stamps_shipped_at() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        order
            .assign_courier("Blue Dart", "BD-42", Utc::now())
            .unwrap();
        assert!(order.courier().unwrap().shipped_at.is_none());

        order
            .record_advance(OrderStatus::Shipped, Actor::Admin, None, Utc::now())
            .unwrap();
        assert!(order.courier().unwrap().shipped_at.is_some());
    }

    #[test]
    fn courier_locked_after_shipment() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        order
            .assign_courier("Blue Dart", "BD-42", Utc::now())
            .unwrap();
        order
            .record_advance(OrderStatus::Shipped, Actor::Admin, None, Utc::now())
            .unwrap();
        let err = order
            .assign_courier("FedEx", "FX-1", Utc::now())
            .unwrap_err();
        assert_eq!(err, OrderError::CourierLocked);
    }

    #[test]
    fn courier_can_be_corrected_before_shipment() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .assign_courier("Blue Dart", "BD-42", Utc::now())
            .unwrap();
        order
            .assign_courier("Blue Dart", "BD-43", Utc::now())
            .unwrap();
        assert_eq!(order.courier().unwrap().tracking_id, "BD-43");
    }

    #[test]
    fn cancellation_sets_cancelled_by_once() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_cancellation(Actor::Admin, None, Utc::now())
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancelled_by(), Some(Actor::Admin));

        // Second attempt hits the immutability guard.
        let err = order
            .record_cancellation(Actor::Admin, None, Utc::now())
            .unwrap_err();
        assert_eq!(err, OrderError::Immutable);
        assert_eq!(order.status_history().len(), 2);
    }

    #[test]
    fn customer_cancellation_only_while_pending() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        let err = order
            .record_customer_cancellation(None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::CancelWindowClosed {
                current: OrderStatus::Processing
            }
        );
    }

    #[test]
    fn customer_cannot_cancel_online_paid_order() {
        let mut order = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![item("A", 1_000, 1)],
                shipping_address: address(),
                payment_method: PaymentMethod::OnlinePrepaid,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        )
        .unwrap();
        order
            .record_advance(OrderStatus::Pending, Actor::Admin, None, Utc::now())
            .unwrap();
        let err = order
            .record_customer_cancellation(None, Utc::now())
            .unwrap_err();
        assert_eq!(err, OrderError::SelfCancelOnlinePaid);
    }

    #[test]
    fn leaving_awaiting_payment_marks_paid() {
        let mut order = Order::create(
            NewOrder {
                customer_id: CustomerId::new(),
                items: vec![item("A", 1_000, 1)],
                shipping_address: address(),
                payment_method: PaymentMethod::OnlinePrepaid,
            },
            &DiscountPolicy::default(),
            Utc::now(),
        )
        .unwrap();
        order
            .record_advance(OrderStatus::Pending, Actor::Admin, None, Utc::now())
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn cod_delivery_marks_paid() {
        let mut order = cod_order(vec![item("A", 1_000, 1)]);
        order
            .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
            .unwrap();
        order
            .assign_courier("Blue Dart", "BD-42", Utc::now())
            .unwrap();
        order
            .record_advance(OrderStatus::Shipped, Actor::Admin, None, Utc::now())
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        order
            .record_advance(OrderStatus::Delivered, Actor::Admin, None, Utc::now())
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn serialization_roundtrip() {
        let order = cod_order(vec![item("A", 1_000, 2)]);
        let json = serde_json::to_value(&order).unwrap();
        let deserialized: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order, deserialized);
    }
}
