use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::OrderStore;
use crate::models::order::{OrderPatch, OrderRecord, OrderStatus};
use crate::storage::StoreError;

const WRITE_ATTEMPTS: u32 = 3;
const WRITE_BACKOFF_MS: u64 = 100;

/// Front door to the order store for the pipeline and the HTTP surface.
///
/// Writes are retried with backoff and then logged and dropped, so a flaky
/// store never aborts an order. Reads never fail: an unknown id or a read
/// error yields the `not_found` sentinel.
#[derive(Clone)]
pub struct OrderTracker {
    store: Arc<dyn OrderStore>,
}

impl OrderTracker {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Merges `patch` into the order. Returns the merged record, or `None`
    /// when every attempt failed.
    pub async fn update(
        &self,
        order_id: &str,
        status: OrderStatus,
        patch: OrderPatch,
    ) -> Option<OrderRecord> {
        for attempt in 0..WRITE_ATTEMPTS {
            if attempt > 0 {
                // 100ms, 200ms
                let delay = Duration::from_millis(WRITE_BACKOFF_MS * (1 << (attempt - 1)));
                tokio::time::sleep(delay).await;
            }

            match self.store.update(order_id, status, patch.clone()).await {
                Ok(record) => {
                    debug!("Order {order_id} -> {}", record.status.as_str());
                    return Some(record);
                }
                Err(e) => warn!(
                    "Order {order_id} status write ({}) attempt {} failed: {e}",
                    status.as_str(),
                    attempt + 1
                ),
            }
        }

        error!(
            "Giving up on order {order_id} status write ({}) after {WRITE_ATTEMPTS} attempts",
            status.as_str()
        );
        None
    }

    /// Conditional write for claims. Not retried: the caller has to know
    /// whether it won, so store errors are returned.
    pub async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: OrderPatch,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let outcome = self.store.transition(order_id, from, to, patch).await?;
        match &outcome {
            Some(record) => debug!("Order {order_id} -> {}", record.status.as_str()),
            None => debug!("Order {order_id} is no longer {}", from.as_str()),
        }
        Ok(outcome)
    }

    pub async fn get(&self, order_id: &str) -> OrderRecord {
        match self.store.get(order_id).await {
            Ok(Some(record)) => record,
            Ok(None) => OrderRecord::not_found(order_id),
            Err(e) => {
                error!("Failed to read order {order_id}: {e}");
                OrderRecord::not_found(order_id)
            }
        }
    }
}
