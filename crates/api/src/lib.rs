//! HTTP API server with observability for the order lifecycle engine.
//!
//! Provides REST endpoints for checkout, status transitions, courier
//! assignment, and the admin overview, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use inventory::{InMemoryVariantStore, VariantStore};
use lifecycle::{InMemoryRefundNotifier, OrderEngine, RefundNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderRepository, OrderRepository};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, V, N>(
    state: Arc<AppState<R, V, N>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<R, V, N>))
        .route("/orders", get(routes::orders::list::<R, V, N>))
        .route("/orders/stats/overview", get(routes::orders::stats::<R, V, N>))
        .route("/orders/{id}", get(routes::orders::get::<R, V, N>))
        .route(
            "/orders/{id}/status",
            put(routes::orders::update_status::<R, V, N>),
        )
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<R, V, N>))
        .route(
            "/orders/{id}/courier",
            put(routes::orders::assign_courier::<R, V, N>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory application state for development and tests.
pub type InMemoryAppState =
    AppState<InMemoryOrderRepository, InMemoryVariantStore, InMemoryRefundNotifier>;

/// Creates application state backed by in-memory stores.
pub fn create_default_state() -> Arc<InMemoryAppState> {
    let engine = OrderEngine::new(
        InMemoryOrderRepository::new(),
        InMemoryVariantStore::new(),
        InMemoryRefundNotifier::new(),
    );
    Arc::new(AppState { engine })
}
