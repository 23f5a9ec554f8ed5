//! Fixed-capacity admission counter. The only gate between a paid order and the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::counter::CounterState;
use crate::storage::StoreError;

pub mod file;
pub mod postgres;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Sold out")]
    SoldOut,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable backing for [`CounterState`].
///
/// `admit` must be linearizable: the check against `max`, the increment, the
/// purchase append and the `sold_out_at` stamp happen as one step.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn snapshot(&self) -> Result<CounterState, StoreError>;

    /// Returns the 1-based position. Re-admitting an order id that already
    /// holds a slot returns its existing position without consuming another.
    async fn admit(&self, email: &str, order_id: &str, max: u32) -> Result<u32, CounterError>;
}

#[derive(Clone)]
pub struct Counter {
    store: Arc<dyn CounterStore>,
    max: u32,
}

impl Counter {
    pub fn new(store: Arc<dyn CounterStore>, max: u32) -> Self {
        Self { store, max }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub async fn remaining_slots(&self) -> Result<u32, StoreError> {
        let state = self.store.snapshot().await?;
        Ok(self.max.saturating_sub(state.count))
    }

    pub async fn is_sold_out(&self) -> Result<bool, StoreError> {
        Ok(self.store.snapshot().await?.count >= self.max)
    }

    pub async fn admit(&self, email: &str, order_id: &str) -> Result<u32, CounterError> {
        let position = self.store.admit(email, order_id, self.max).await?;
        info!("Admitted order {order_id} at position {position}/{}", self.max);
        Ok(position)
    }
}

/// Applies one admission to `state`. Shared by the file store and its tests.
pub(crate) fn admit_into(
    state: &mut CounterState,
    email: &str,
    order_id: &str,
    max: u32,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u32, CounterError> {
    if let Some(existing) = state.purchases.iter().find(|p| p.order_id == order_id) {
        return Ok(existing.position);
    }
    if state.count >= max {
        return Err(CounterError::SoldOut);
    }

    state.count += 1;
    state.purchases.push(crate::models::counter::PurchaseRecord {
        email: email.to_string(),
        order_id: order_id.to_string(),
        timestamp: now,
        position: state.count,
    });
    if state.count == max {
        state.sold_out_at = Some(now);
    }
    Ok(state.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_admit_into_stamps_sold_out_once() {
        let mut state = CounterState::default();
        assert_eq!(admit_into(&mut state, "a@b.com", "o1", 2, Utc::now()).unwrap(), 1);
        assert!(state.sold_out_at.is_none());
        assert_eq!(admit_into(&mut state, "c@d.com", "o2", 2, Utc::now()).unwrap(), 2);
        let stamped = state.sold_out_at;
        assert!(stamped.is_some());

        assert!(matches!(
            admit_into(&mut state, "e@f.com", "o3", 2, Utc::now()),
            Err(CounterError::SoldOut)
        ));
        assert_eq!(state.count, 2);
        assert_eq!(state.sold_out_at, stamped);
    }

    #[test]
    fn test_readmitting_same_order_keeps_position() {
        let mut state = CounterState::default();
        admit_into(&mut state, "a@b.com", "o1", 5, Utc::now()).unwrap();
        admit_into(&mut state, "c@d.com", "o2", 5, Utc::now()).unwrap();
        assert_eq!(admit_into(&mut state, "a@b.com", "o1", 5, Utc::now()).unwrap(), 1);
        assert_eq!(state.count, 2);
        assert_eq!(state.purchases.len(), 2);
    }
}
