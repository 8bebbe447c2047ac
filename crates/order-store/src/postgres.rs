use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, Version};
use domain::{Order, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderFilter, OrderRepository, OrderStats, OrderSummary, Result, StoreError,
};

/// PostgreSQL-backed order repository.
///
/// The whole aggregate is stored as one JSONB document; status, customer,
/// total, and timestamps are extracted into columns for filtering and the
/// dashboard aggregates. Conditional writes use `WHERE id = $1 AND
/// version = $2` so a lost race surfaces as `VersionConflict` instead of
/// silently overwriting.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the checked-in schema migration.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(include_str!(
            "../../../migrations/001_create_orders_and_variants.sql"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }

    fn row_to_summary(row: PgRow) -> Result<OrderSummary> {
        Ok(OrderSummary {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            status: row
                .try_get::<String, _>("status")?
                .parse()
                .map_err(|_| StoreError::Serialization(serde_json::Error::io(
                    std::io::Error::other("unknown status in orders table"),
                )))?,
            total_amount: Money::from_minor(row.try_get("total_amount")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total_amount, version, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.total_amount().minor())
        .bind(order.version().as_i64())
        .bind(document)
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, order: &mut Order) -> Result<Version> {
        let expected = order.version();
        let next = expected.next();
        order.set_version(next);
        let document = serde_json::to_value(&*order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, total_amount = $4, version = $5, document = $6, updated_at = $7
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(expected.as_i64())
        .bind(order.status().as_str())
        .bind(order.total_amount().minor())
        .bind(next.as_i64())
        .bind(document)
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }

        // The guard failed; put the aggregate's version back before
        // reporting why.
        order.set_version(expected);

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id().as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            Some(actual) => Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected,
                actual: Version::new(actual),
            }),
            None => Err(StoreError::OrderNotFound(order.id())),
        }
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT document FROM orders WHERE 1=1");
        let mut param_count = 0;

        if filter.customer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND customer_id = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id.as_uuid());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn stats(&self, recent_limit: usize) -> Result<OrderStats> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = $1",
        )
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&self.pool)
        .await?;

        let recent_rows = sqlx::query(
            r#"
            SELECT id, customer_id, status, total_amount, created_at
            FROM orders
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(recent_limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = OrderStats {
            total_revenue: Money::from_minor(revenue),
            ..OrderStats::default()
        };
        for (status, count) in counts {
            let count = count as u64;
            stats.total_orders += count;
            match status.as_str() {
                "AwaitingPayment" => stats.awaiting_payment = count,
                "Pending" => stats.pending = count,
                "Processing" => stats.processing = count,
                "Shipped" => stats.shipped = count,
                "Delivered" => stats.delivered = count,
                "Cancelled" => stats.cancelled = count,
                other => {
                    tracing::warn!(status = other, "unrecognized status in orders table");
                }
            }
        }

        stats.recent_orders = recent_rows
            .into_iter()
            .map(Self::row_to_summary)
            .collect::<Result<Vec<_>>>()?;

        Ok(stats)
    }
}
