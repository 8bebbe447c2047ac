use async_trait::async_trait;
use common::Sku;
use sqlx::PgPool;

use crate::{InventoryError, Result, Variant, VariantStore};

/// PostgreSQL-backed variant store.
///
/// The conditional decrement is a single guarded `UPDATE`, so the
/// `stock >= quantity` check and the write are atomic at the database
/// even under concurrent transitions.
#[derive(Clone)]
pub struct PgVariantStore {
    pool: PgPool,
}

impl PgVariantStore {
    /// Creates a new PostgreSQL variant store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VariantStore for PgVariantStore {
    async fn get(&self, sku: &Sku) -> Result<Option<Variant>> {
        let row: Option<(String, i32, bool)> =
            sqlx::query_as("SELECT sku, stock, is_available FROM variants WHERE sku = $1")
                .bind(sku.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(sku, stock, is_available)| Variant {
            sku: sku.into(),
            stock: stock.max(0) as u32,
            is_available,
        }))
    }

    async fn try_deduct(&self, sku: &Sku, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET stock = stock - $2,
                is_available = stock - $2 > 0
            WHERE sku = $1 AND stock >= $2
            "#,
        )
        .bind(sku.as_str())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // The guard failed: distinguish a missing variant from a shortage.
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM variants WHERE sku = $1")
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(stock) => Err(InventoryError::InsufficientStock {
                sku: sku.clone(),
                requested: quantity,
                available: stock.max(0) as u32,
            }),
            None => Err(InventoryError::VariantNotFound { sku: sku.clone() }),
        }
    }

    async fn restock(&self, sku: &Sku, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET stock = stock + $2,
                is_available = stock + $2 > 0
            WHERE sku = $1
            "#,
        )
        .bind(sku.as_str())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::VariantNotFound { sku: sku.clone() });
        }
        Ok(())
    }

    async fn upsert(&self, variant: Variant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO variants (sku, stock, is_available)
            VALUES ($1, $2, $3)
            ON CONFLICT (sku)
            DO UPDATE SET stock = EXCLUDED.stock, is_available = EXCLUDED.is_available
            "#,
        )
        .bind(variant.sku.as_str())
        .bind(variant.stock as i32)
        .bind(variant.is_available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
