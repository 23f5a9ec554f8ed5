use async_trait::async_trait;
use sqlx::PgPool;

use super::{CounterError, CounterStore};
use crate::models::counter::{CounterState, PurchaseRecord};
use crate::storage::StoreError;

pub struct PgCounterStore {
    db: PgPool,
}

impl PgCounterStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    email: String,
    order_id: String,
    created_at: chrono::DateTime<chrono::Utc>,
    position: i32,
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn snapshot(&self) -> Result<CounterState, StoreError> {
        let (count, sold_out_at): (i32, Option<chrono::DateTime<chrono::Utc>>) =
            sqlx::query_as("SELECT count, sold_out_at FROM purchase_counter WHERE id = 1")
                .fetch_one(&self.db)
                .await?;

        let rows: Vec<PurchaseRow> = sqlx::query_as(
            "SELECT email, order_id, created_at, position FROM purchases ORDER BY position",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(CounterState {
            count: count.max(0) as u32,
            purchases: rows
                .into_iter()
                .map(|r| PurchaseRecord {
                    email: r.email,
                    order_id: r.order_id,
                    timestamp: r.created_at,
                    position: r.position.max(0) as u32,
                })
                .collect(),
            sold_out_at,
        })
    }

    async fn admit(&self, email: &str, order_id: &str, max: u32) -> Result<u32, CounterError> {
        let mut tx = self.db.begin().await.map_err(StoreError::from)?;

        // Row lock serialises concurrent admissions for the rest of the transaction.
        sqlx::query("SELECT count FROM purchase_counter WHERE id = 1 FOR UPDATE")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT position FROM purchases WHERE order_id = $1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;
        if let Some((position,)) = existing {
            return Ok(position.max(0) as u32);
        }

        let max = i32::try_from(max).unwrap_or(i32::MAX);
        let admitted: Option<(i32,)> = sqlx::query_as(
            "UPDATE purchase_counter \
             SET count = count + 1, \
                 sold_out_at = CASE WHEN count + 1 = $1 THEN now() ELSE sold_out_at END \
             WHERE id = 1 AND count < $1 \
             RETURNING count",
        )
        .bind(max)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let Some((position,)) = admitted else {
            return Err(CounterError::SoldOut);
        };

        sqlx::query("INSERT INTO purchases (order_id, email, position) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(email)
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(position as u32)
    }
}
