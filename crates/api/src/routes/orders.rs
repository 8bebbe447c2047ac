//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::{CustomerId, Money, OrderId, ProductId};
use domain::{
    Actor, Courier, NewOrder, Order, OrderItem, PaymentMethod, PaymentStatus, ShippingAddress,
    StatusHistoryEntry,
};
use inventory::VariantStore;
use lifecycle::{OrderEngine, RefundNotifier};
use order_store::{OrderFilter, OrderRepository, OrderStats};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R, V, N>
where
    R: OrderRepository,
    V: VariantStore,
    N: RefundNotifier,
{
    pub engine: OrderEngine<R, V, N>,
}

/// Header carrying the authenticated customer's ID.
pub const CUSTOMER_HEADER: &str = "x-customer-id";

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddressRequest,
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_minor: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ShippingAddressRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CourierRequest {
    pub carrier_name: String,
    pub tracking_id: String,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub mine: bool,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddress,
    pub subtotal_minor: i64,
    pub discount_minor: i64,
    pub total_minor: i64,
    pub courier: Option<Courier>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_minor: i64,
    pub quantity: u32,
    pub line_total_minor: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let items = order
            .items()
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                sku: item.sku.as_str().to_string(),
                name: item.name.clone(),
                unit_price_minor: item.unit_price.minor(),
                quantity: item.quantity,
                line_total_minor: item.line_total().minor(),
            })
            .collect();

        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            status: order.status().to_string(),
            payment_method: order.payment_method(),
            payment_status: order.payment_status(),
            items,
            shipping_address: order.shipping_address().clone(),
            subtotal_minor: order.subtotal().minor(),
            discount_minor: order.discount().minor(),
            total_minor: order.total_amount().minor(),
            courier: order.courier().cloned(),
            status_history: order.status_history().to_vec(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the authenticated customer.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let customer_id = require_customer(&headers)?;

    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let product_id = uuid::Uuid::parse_str(&item.product_id)
            .map_err(|e| ApiError::BadRequest(format!("Invalid product_id: {e}")))?;
        items.push(OrderItem::new(
            ProductId::from_uuid(product_id),
            item.sku.as_str(),
            item.name.as_str(),
            Money::from_minor(item.unit_price_minor),
            item.quantity,
        ));
    }

    let new = NewOrder {
        customer_id,
        items,
        shipping_address: ShippingAddress {
            name: req.shipping_address.name,
            email: req.shipping_address.email,
            phone: req.shipping_address.phone,
            address: req.shipping_address.address,
        },
        payment_method: req.payment_method,
    };

    let order = state
        .engine
        .create_order(new)
        .await
        .map_err(ApiError::from_checkout)?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderResponse::from(&order)),
    ))
}

/// GET /orders/:id — load one order.
///
/// With an `x-customer-id` header the view is owner-scoped; other
/// customers' orders read as missing. Without it the caller is treated
/// as back office.
#[tracing::instrument(skip(state, headers))]
pub async fn get<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let order_id = parse_order_id(&id)?;

    let order = match customer_header(&headers)? {
        Some(customer_id) => state.engine.get_order_for(order_id, customer_id).await?,
        None => state.engine.get_order(order_id).await?,
    };

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders — list orders, newest first.
///
/// `?mine=true` restricts the listing to the authenticated customer;
/// `?status=` and `?limit=` filter further.
#[tracing::instrument(skip(state, headers, query))]
pub async fn list<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let mut filter = if query.mine {
        OrderFilter::for_customer(require_customer(&headers)?)
    } else {
        OrderFilter::default()
    };

    if let Some(ref status) = query.status {
        let status = status
            .parse()
            .map_err(|e: domain::OrderError| ApiError::BadRequest(e.to_string()))?;
        filter = filter.with_status(status);
    }
    if let Some(limit) = query.limit {
        filter = filter.limit(limit);
    }

    let orders = state.engine.list_orders(filter).await?;
    let responses = orders.iter().map(OrderResponse::from).collect();
    Ok(Json(responses))
}

/// PUT /orders/:id/status — admin-driven status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let order_id = parse_order_id(&id)?;
    let requested = req
        .status
        .parse()
        .map_err(|e: domain::OrderError| ApiError::BadRequest(e.to_string()))?;

    let order = state
        .engine
        .transition(order_id, requested, Actor::Admin, req.comment)
        .await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/:id/cancel — customer self-service cancellation.
#[tracing::instrument(skip(state, headers, req))]
pub async fn cancel<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let order_id = parse_order_id(&id)?;
    let customer_id = require_customer(&headers)?;

    let order = state
        .engine
        .cancel_by_customer(order_id, customer_id, req.comment)
        .await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/:id/courier — attach or correct the shipping carrier.
#[tracing::instrument(skip(state, req))]
pub async fn assign_courier<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
    Path(id): Path<String>,
    Json(req): Json<CourierRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let order_id = parse_order_id(&id)?;

    let order = state
        .engine
        .assign_courier(order_id, &req.carrier_name, &req.tracking_id)
        .await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/stats/overview — admin dashboard counters and revenue.
#[tracing::instrument(skip(state))]
pub async fn stats<R, V, N>(
    State(state): State<Arc<AppState<R, V, N>>>,
) -> Result<Json<OrderStats>, ApiError>
where
    R: OrderRepository + 'static,
    V: VariantStore + 'static,
    N: RefundNotifier + 'static,
{
    let stats = state.engine.stats().await?;
    Ok(Json(stats))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn customer_header(headers: &HeaderMap) -> Result<Option<CustomerId>, ApiError> {
    let Some(value) = headers.get(CUSTOMER_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {CUSTOMER_HEADER} header")))?;
    let uuid = uuid::Uuid::parse_str(text)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {CUSTOMER_HEADER} header: {e}")))?;
    Ok(Some(CustomerId::from_uuid(uuid)))
}

fn require_customer(headers: &HeaderMap) -> Result<CustomerId, ApiError> {
    customer_header(headers)?.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing {CUSTOMER_HEADER} header"))
    })
}
