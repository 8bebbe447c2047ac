//! Refund workflow collaborator.
//!
//! Executing a refund belongs to an external payments workflow; this
//! engine only signals that a paid order was cancelled.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, OrderId};
use thiserror::Error;

/// Failure to hand a refund request to the external workflow.
#[derive(Debug, Error)]
#[error("Refund notification failed: {0}")]
pub struct RefundNotifyError(pub String);

/// A refund request emitted when a paid order is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub order_id: OrderId,
    pub amount: Money,
}

/// Trait for the external refund workflow.
#[async_trait]
pub trait RefundNotifier: Send + Sync {
    /// Signals that the given order was cancelled after payment and
    /// needs a refund of `amount`.
    async fn refund_requested(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<(), RefundNotifyError>;
}

#[derive(Debug, Default)]
struct InMemoryRefundState {
    requests: Vec<RefundRequest>,
    fail_on_notify: bool,
}

/// In-memory refund notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRefundNotifier {
    state: Arc<RwLock<InMemoryRefundState>>,
}

impl InMemoryRefundNotifier {
    /// Creates a new in-memory refund notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail on the next call.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of refund requests received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns true if a refund was requested for the given order.
    pub fn has_request_for(&self, order_id: OrderId) -> bool {
        self.state
            .read()
            .unwrap()
            .requests
            .iter()
            .any(|r| r.order_id == order_id)
    }
}

#[async_trait]
impl RefundNotifier for InMemoryRefundNotifier {
    async fn refund_requested(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<(), RefundNotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_notify {
            return Err(RefundNotifyError("payments workflow unreachable".to_string()));
        }

        state.requests.push(RefundRequest { order_id, amount });
        Ok(())
    }
}
