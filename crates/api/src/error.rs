//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use lifecycle::LifecycleError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (or not visible to the caller).
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller is not allowed to perform this operation.
    Forbidden(String),
    /// The order's current state rejects the operation.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(id) => ApiError::NotFound(format!("Order {id} not found")),
            LifecycleError::Domain(err) => order_error_to_api(err),
            // A transition-time stock failure is a state conflict: the
            // order exists but stock no longer covers it.
            LifecycleError::Inventory(err) => ApiError::Conflict(err.to_string()),
            LifecycleError::Store(StoreError::VersionConflict { .. }) => {
                ApiError::Conflict("Order was modified concurrently, retry".to_string())
            }
            LifecycleError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    /// Maps a checkout failure. Unlike transitions, a stock shortage at
    /// creation time is the client ordering more than is on the shelf.
    pub fn from_checkout(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Inventory(err) => ApiError::BadRequest(err.to_string()),
            other => other.into(),
        }
    }
}

fn order_error_to_api(err: OrderError) -> ApiError {
    match &err {
        OrderError::Immutable
        | OrderError::ShippedOrderCancellation
        | OrderError::DeliveredOrderCancellation
        | OrderError::NotForward { .. }
        | OrderError::CourierRequired
        | OrderError::CourierLocked => ApiError::Conflict(err.to_string()),

        OrderError::CancelWindowClosed { .. } | OrderError::SelfCancelOnlinePaid => {
            ApiError::Forbidden(err.to_string())
        }

        OrderError::UnknownStatus { .. }
        | OrderError::EmptyCourierField { .. }
        | OrderError::NoItems
        | OrderError::InvalidQuantity { .. }
        | OrderError::InvalidUnitPrice { .. }
        | OrderError::MissingShippingField { .. } => ApiError::BadRequest(err.to_string()),
    }
}
