//! Order records: storage backends plus the retrying tracker the pipeline writes through.

use async_trait::async_trait;

use crate::models::order::{OrderPatch, OrderRecord, OrderStatus};
use crate::storage::StoreError;

pub mod admission;
pub mod file;
pub mod handlers;
pub mod postgres;
pub mod tracker;

pub use tracker::OrderTracker;

/// Keyed store of [`OrderRecord`]s.
///
/// `update` must merge into the current record under the store's own
/// exclusion so two writers for one order never clobber each other.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn update(
        &self,
        order_id: &str,
        status: OrderStatus,
        patch: OrderPatch,
    ) -> Result<OrderRecord, StoreError>;

    /// Merges `patch` and moves to `to` only if the order is currently at
    /// `from`, checked and written as one step. `None` when the order is
    /// missing or has already moved on.
    async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: OrderPatch,
    ) -> Result<Option<OrderRecord>, StoreError>;

    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>, StoreError>;
}
