use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

use super::OrderStore;
use crate::models::order::{OrderPatch, OrderRecord, OrderStatus};
use crate::storage::StoreError;

/// Orders kept as JSONB documents, one row per order.
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn update(
        &self,
        order_id: &str,
        status: OrderStatus,
        patch: OrderPatch,
    ) -> Result<OrderRecord, StoreError> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let mut seed = OrderRecord::new(order_id);
        seed.created_at = Some(now);
        sqlx::query(
            "INSERT INTO orders (order_id, record) VALUES ($1, $2) ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(order_id)
        .bind(Json(&seed))
        .execute(&mut *tx)
        .await?;

        let (Json(mut record),): (Json<OrderRecord>,) =
            sqlx::query_as("SELECT record FROM orders WHERE order_id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;

        record.apply(status, patch, now);

        sqlx::query("UPDATE orders SET record = $2, updated_at = $3 WHERE order_id = $1")
            .bind(order_id)
            .bind(Json(&record))
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: OrderPatch,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let row: Option<(Json<OrderRecord>,)> =
            sqlx::query_as("SELECT record FROM orders WHERE order_id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((Json(mut record),)) = row else {
            return Ok(None);
        };
        if record.status != from {
            return Ok(None);
        }

        record.apply(to, patch, now);
        sqlx::query("UPDATE orders SET record = $2, updated_at = $3 WHERE order_id = $1")
            .bind(order_id)
            .bind(Json(&record))
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>, StoreError> {
        let row: Option<(Json<OrderRecord>,)> =
            sqlx::query_as("SELECT record FROM orders WHERE order_id = $1")
                .bind(order_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(|(Json(record),)| record))
    }
}
