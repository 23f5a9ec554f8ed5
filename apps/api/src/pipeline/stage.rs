use std::future::Future;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::extraction::ParseError;
use crate::models::order::{OrderPatch, OrderStatus, Step};
use crate::orders::OrderTracker;
use crate::publish::PublishError;

/// Failures that end an order. Everything else is absorbed inside a stage
/// and surfaces only as a warning on the record.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Résumé could not be parsed: {0}")]
    Extraction(#[from] ParseError),

    #[error("{0}")]
    Publish(#[from] PublishError),
}

/// What a stage produced, plus the details to merge once it finished.
pub struct StageOutput<T> {
    pub value: T,
    pub patch: OrderPatch,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, patch: OrderPatch) -> Self {
        Self { value, patch }
    }
}

/// Marks the order as entering `status`, runs the stage, then merges its patch.
pub async fn run_stage<T, F>(
    tracker: &OrderTracker,
    order_id: &str,
    status: OrderStatus,
    step: Step,
    stage: F,
) -> Result<T, StageError>
where
    F: Future<Output = Result<StageOutput<T>, StageError>>,
{
    tracker
        .update(order_id, status, OrderPatch::default().step(step, Utc::now()))
        .await;
    info!("Order {order_id}: {}", status.as_str());

    let StageOutput { value, patch } = stage.await?;
    tracker.update(order_id, status, patch).await;
    Ok(value)
}
