use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "folio-api"
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingResponse {
    pub remaining: u32,
    pub sold_out: bool,
    pub total: u32,
}

/// GET /api/status/remaining
pub async fn remaining_handler(
    State(state): State<AppState>,
) -> Result<Json<RemainingResponse>, AppError> {
    let remaining = state.counter.remaining_slots().await?;
    Ok(Json(RemainingResponse {
        remaining,
        sold_out: remaining == 0,
        total: state.counter.max(),
    }))
}
