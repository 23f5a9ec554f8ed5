use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::OrderStore;
use crate::models::order::{OrderPatch, OrderRecord, OrderStatus};
use crate::storage::{JsonFile, StoreError};

/// All orders in one `orders.json` map keyed by order id.
pub struct FileOrderStore {
    file: JsonFile<HashMap<String, OrderRecord>>,
}

impl FileOrderStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path).await?,
        })
    }
}

#[async_trait]
impl OrderStore for FileOrderStore {
    async fn update(
        &self,
        order_id: &str,
        status: OrderStatus,
        patch: OrderPatch,
    ) -> Result<OrderRecord, StoreError> {
        self.file
            .update(|orders| {
                let now = Utc::now();
                let record = orders
                    .entry(order_id.to_string())
                    .or_insert_with(|| OrderRecord::new(order_id));
                if record.created_at.is_none() {
                    record.created_at = Some(now);
                }
                record.apply(status, patch, now);
                Ok(record.clone())
            })
            .await
    }

    async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: OrderPatch,
    ) -> Result<Option<OrderRecord>, StoreError> {
        self.file
            .update(|orders| {
                let Some(record) = orders.get_mut(order_id) else {
                    return Ok(None);
                };
                if record.status != from {
                    return Ok(None);
                }
                record.apply(to, patch, Utc::now());
                Ok(Some(record.clone()))
            })
            .await
    }

    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.file.read().await.get(order_id).cloned())
    }
}
