//! Order status state machine.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The lifecycle status of an order.
///
/// Status transitions:
/// ```text
/// AwaitingPayment ──► Pending ──► Processing ──► Shipped ──► Delivered
///        │               │            │
///        └───────────────┴────────────┴──► Cancelled
/// ```
///
/// Forward movement is strictly along the linear sequence (skipping ahead
/// is allowed, moving back is not). `Cancelled` absorbs every status before
/// `Shipped`; shipped and delivered orders can no longer be cancelled, and
/// once cancelled an order rejects all changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Online-prepaid order awaiting gateway confirmation.
    AwaitingPayment,

    /// Accepted, no stock reserved yet. Initial status for cash-on-delivery.
    Pending,

    /// Being prepared; entering this status reserves stock.
    Processing,

    /// Handed to the courier. Cannot be cancelled any more.
    Shipped,

    /// Delivered to the customer (terminal).
    Delivered,

    /// Cancelled by the customer or an admin (terminal, absorbing).
    Cancelled,
}

impl OrderStatus {
    /// Position in the linear forward sequence, or `None` for `Cancelled`.
    pub fn forward_index(&self) -> Option<usize> {
        match self {
            OrderStatus::AwaitingPayment => Some(0),
            OrderStatus::Pending => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "AwaitingPayment",
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwaitingPayment" => Ok(OrderStatus::AwaitingPayment),
            "Pending" => Ok(OrderStatus::Pending),
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// The effect of a validated status-change request.
///
/// Resolving a `(current, requested)` pair up front keeps the transition
/// table in one reviewable place; callers dispatch on the variant instead
/// of re-deriving guards from the raw statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to `Cancelled`. Reserved stock must be restored first.
    Cancel,

    /// Advance along the linear sequence.
    Advance {
        to: OrderStatus,
        /// Stock must be reserved before this advance commits.
        reserves_stock: bool,
        /// A courier with a tracking ID must already be assigned.
        requires_courier: bool,
        /// Leaving `AwaitingPayment` records the gateway's success signal.
        confirms_payment: bool,
    },
}

/// Resolves a requested status change against the current status.
///
/// Every rule violation is reported before any mutation happens:
/// - `Immutable` when the order is already cancelled
/// - `ShippedOrderCancellation` when cancelling a shipped order
/// - `DeliveredOrderCancellation` when cancelling a delivered order
/// - `NotForward` for backward or no-op requests
pub fn resolve_transition(
    current: OrderStatus,
    requested: OrderStatus,
) -> Result<Transition, OrderError> {
    let Some(current_idx) = current.forward_index() else {
        return Err(OrderError::Immutable);
    };

    let Some(requested_idx) = requested.forward_index() else {
        return match current {
            OrderStatus::Shipped => Err(OrderError::ShippedOrderCancellation),
            OrderStatus::Delivered => Err(OrderError::DeliveredOrderCancellation),
            _ => Ok(Transition::Cancel),
        };
    };

    if requested_idx <= current_idx {
        return Err(OrderError::NotForward { current, requested });
    }

    Ok(Transition::Advance {
        to: requested,
        reserves_stock: requested == OrderStatus::Processing,
        requires_courier: requested == OrderStatus::Shipped,
        confirms_payment: current == OrderStatus::AwaitingPayment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: [OrderStatus; 5] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    #[test]
    fn forward_moves_are_allowed() {
        for (i, &from) in FORWARD.iter().enumerate() {
            for &to in &FORWARD[i + 1..] {
                let transition = resolve_transition(from, to).unwrap();
                assert!(matches!(transition, Transition::Advance { .. }));
            }
        }
    }

    #[test]
    fn backward_and_noop_moves_are_rejected() {
        for (i, &from) in FORWARD.iter().enumerate() {
            for &to in &FORWARD[..=i] {
                assert_eq!(
                    resolve_transition(from, to),
                    Err(OrderError::NotForward {
                        current: from,
                        requested: to
                    }),
                    "{from} -> {to} should be rejected"
                );
            }
        }
    }

    #[test]
    fn cancelled_rejects_everything() {
        for &to in &FORWARD {
            assert_eq!(
                resolve_transition(OrderStatus::Cancelled, to),
                Err(OrderError::Immutable)
            );
        }
        assert_eq!(
            resolve_transition(OrderStatus::Cancelled, OrderStatus::Cancelled),
            Err(OrderError::Immutable)
        );
    }

    #[test]
    fn shipped_cannot_be_cancelled() {
        assert_eq!(
            resolve_transition(OrderStatus::Shipped, OrderStatus::Cancelled),
            Err(OrderError::ShippedOrderCancellation)
        );
    }

    #[test]
    fn delivered_cannot_be_cancelled() {
        assert_eq!(
            resolve_transition(OrderStatus::Delivered, OrderStatus::Cancelled),
            Err(OrderError::DeliveredOrderCancellation)
        );
    }

    #[test]
    fn cancel_is_allowed_from_other_non_terminal_statuses() {
        for from in [
            OrderStatus::AwaitingPayment,
            OrderStatus::Pending,
            OrderStatus::Processing,
        ] {
            assert_eq!(
                resolve_transition(from, OrderStatus::Cancelled),
                Ok(Transition::Cancel)
            );
        }
    }

    #[test]
    fn processing_advance_reserves_stock() {
        let transition =
            resolve_transition(OrderStatus::Pending, OrderStatus::Processing).unwrap();
        assert_eq!(
            transition,
            Transition::Advance {
                to: OrderStatus::Processing,
                reserves_stock: true,
                requires_courier: false,
                confirms_payment: false,
            }
        );
    }

    #[test]
    fn shipped_advance_requires_courier() {
        let transition =
            resolve_transition(OrderStatus::Processing, OrderStatus::Shipped).unwrap();
        assert_eq!(
            transition,
            Transition::Advance {
                to: OrderStatus::Shipped,
                reserves_stock: false,
                requires_courier: true,
                confirms_payment: false,
            }
        );
    }

    #[test]
    fn leaving_awaiting_payment_confirms_payment() {
        let transition =
            resolve_transition(OrderStatus::AwaitingPayment, OrderStatus::Pending).unwrap();
        assert_eq!(
            transition,
            Transition::Advance {
                to: OrderStatus::Pending,
                reserves_stock: false,
                requires_courier: false,
                confirms_payment: true,
            }
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::AwaitingPayment.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn display_and_parse_roundtrip() {
        for status in FORWARD.into_iter().chain([OrderStatus::Cancelled]) {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "Returned".parse::<OrderStatus>().unwrap_err();
        assert_eq!(
            err,
            OrderError::UnknownStatus {
                value: "Returned".to_string()
            }
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let status = OrderStatus::Processing;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"Processing\"");
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
