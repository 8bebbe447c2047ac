//! PostgreSQL integration tests for the order repository.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{CustomerId, Money, ProductId, Version};
use domain::{
    Actor, DiscountPolicy, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod,
    ShippingAddress,
};
use order_store::{OrderFilter, OrderRepository, PgOrderRepository, StoreError};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh repository with its own pool and cleared tables
async fn get_test_repo() -> PgOrderRepository {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    let repo = PgOrderRepository::new(pool.clone());
    repo.run_migrations().await.unwrap();

    sqlx::query("TRUNCATE TABLE orders")
        .execute(&pool)
        .await
        .unwrap();

    repo
}

fn sample_order(customer_id: CustomerId) -> Order {
    Order::create(
        NewOrder {
            customer_id,
            items: vec![OrderItem::new(
                ProductId::new(),
                "STRAP-BLK-20",
                "Leather strap 20mm",
                Money::from_minor(4_500),
                2,
            )],
            shipping_address: ShippingAddress {
                name: "Integration Test".to_string(),
                email: "it@example.com".to_string(),
                phone: "+1-555-0123".to_string(),
                address: "9 Container Road".to_string(),
            },
            payment_method: PaymentMethod::CashOnDelivery,
        },
        &DiscountPolicy::default(),
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn insert_and_get_preserves_the_document() {
    let repo = get_test_repo().await;
    let order = sample_order(CustomerId::new());

    repo.insert(&order).await.unwrap();
    let loaded = repo.get(order.id()).await.unwrap().unwrap();
    assert_eq!(loaded, order);
}

#[tokio::test]
async fn conditional_update_bumps_version_and_rejects_stale_writers() {
    let repo = get_test_repo().await;
    let order = sample_order(CustomerId::new());
    repo.insert(&order).await.unwrap();

    let mut first = repo.get(order.id()).await.unwrap().unwrap();
    let mut second = repo.get(order.id()).await.unwrap().unwrap();

    first
        .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
        .unwrap();
    let version = repo.update(&mut first).await.unwrap();
    assert_eq!(version, Version::new(2));

    second
        .record_cancellation(Actor::Admin, None, Utc::now())
        .unwrap();
    let err = repo.update(&mut second).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));
    // The stale aggregate keeps its original version for a clean retry.
    assert_eq!(second.version(), Version::initial());

    let stored = repo.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Processing);
}

#[tokio::test]
async fn list_filters_by_customer_and_status() {
    let repo = get_test_repo().await;
    let customer = CustomerId::new();

    repo.insert(&sample_order(customer)).await.unwrap();
    repo.insert(&sample_order(customer)).await.unwrap();
    repo.insert(&sample_order(CustomerId::new())).await.unwrap();

    let mine = repo.list(OrderFilter::for_customer(customer)).await.unwrap();
    assert_eq!(mine.len(), 2);

    let pending = repo
        .list(OrderFilter::default().with_status(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 3);

    let limited = repo.list(OrderFilter::default().limit(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn stats_aggregate_counts_and_delivered_revenue() {
    let repo = get_test_repo().await;

    let mut delivered = sample_order(CustomerId::new());
    delivered
        .record_advance(OrderStatus::Processing, Actor::Admin, None, Utc::now())
        .unwrap();
    delivered
        .assign_courier("Carrier", "T-9", Utc::now())
        .unwrap();
    delivered
        .record_advance(OrderStatus::Shipped, Actor::Admin, None, Utc::now())
        .unwrap();
    delivered
        .record_advance(OrderStatus::Delivered, Actor::Admin, None, Utc::now())
        .unwrap();
    repo.insert(&delivered).await.unwrap();
    repo.insert(&sample_order(CustomerId::new())).await.unwrap();

    let stats = repo.stats(3).await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.total_revenue, delivered.total_amount());
    assert_eq!(stats.recent_orders.len(), 2);
}
