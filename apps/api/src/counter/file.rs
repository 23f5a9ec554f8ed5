use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{admit_into, CounterError, CounterStore};
use crate::models::counter::CounterState;
use crate::storage::{JsonFile, StoreError};

/// Counter persisted to `purchase-counter.json`.
pub struct FileCounterStore {
    file: JsonFile<CounterState>,
}

impl FileCounterStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path).await?,
        })
    }
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn snapshot(&self) -> Result<CounterState, StoreError> {
        Ok(self.file.read().await.clone())
    }

    async fn admit(&self, email: &str, order_id: &str, max: u32) -> Result<u32, CounterError> {
        self.file
            .update(|state| admit_into(state, email, order_id, max, Utc::now()))
            .await
    }
}
