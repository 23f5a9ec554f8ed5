use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::admission::{Admitted, CallbackOutcome, NewOrder, PaymentCallback};
use crate::errors::AppError;
use crate::models::order::{EmailKind, EmailPreview, OrderRecord, OrderStatus};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub email: String,
    pub filename: String,
    #[serde(default)]
    pub photo_filename: Option<String>,
}

impl From<OrderRequest> for NewOrder {
    fn from(req: OrderRequest) -> Self {
        NewOrder {
            email: req.email.trim().to_string(),
            filename: req.filename,
            photo_filename: req.photo_filename.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
    pub status: OrderStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmittedResponse {
    pub success: bool,
    pub order_id: String,
    pub position: u32,
    pub eta_minutes: u32,
    pub remaining: u32,
}

/// Form fields posted by the payment gateway.
#[derive(Deserialize)]
pub struct CallbackForm {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub refno: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailsResponse {
    pub order_id: String,
    pub emails: BTreeMap<EmailKind, EmailPreview>,
}

async fn admitted_response(state: &AppState, admitted: Admitted) -> Result<AdmittedResponse, AppError> {
    Ok(AdmittedResponse {
        success: true,
        order_id: admitted.order_id,
        position: admitted.position,
        eta_minutes: admitted.eta_minutes,
        remaining: state.counter.remaining_slots().await?,
    })
}

/// POST /api/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let order_id = state.admission.checkout(req.into()).await?;
    Ok(Json(CheckoutResponse {
        order_id,
        status: OrderStatus::PendingPayment,
    }))
}

/// POST /api/payments/callback
///
/// Gateways retry until they see a 2xx, so every outcome for a known order
/// is acknowledged with `OK`.
pub async fn handle_payment_callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Result<&'static str, AppError> {
    let callback = PaymentCallback {
        order_id: form.order_id,
        status: form.status,
        reference: form.refno.filter(|r| !r.is_empty()),
        reason: form.reason.filter(|r| !r.is_empty()),
        amount: form.amount.filter(|a| !a.is_empty()),
    };
    let order_id = callback.order_id.clone();
    let outcome = state.admission.payment_callback(callback).await?;
    if let CallbackOutcome::Admitted(admitted) = &outcome {
        info!("Payment confirmed for order {order_id} (#{})", admitted.position);
    }
    Ok("OK")
}

/// POST /api/orders/simulate
pub async fn handle_simulate(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<AdmittedResponse>, AppError> {
    let admitted = state.admission.simulate(req.into()).await?;
    Ok(Json(admitted_response(&state, admitted).await?))
}

/// GET /api/orders/:id
///
/// Unknown ids answer with the `not_found` sentinel rather than a 404 so
/// pollers can treat every response the same way.
pub async fn handle_get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Json<OrderRecord> {
    Json(state.tracker.get(&order_id).await)
}

/// GET /api/orders/:id/emails
pub async fn handle_get_emails(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<EmailsResponse>, AppError> {
    let record = state.tracker.get(&order_id).await;
    if record.status == OrderStatus::NotFound {
        return Err(AppError::NotFound(format!("Order {order_id} not found")));
    }
    Ok(Json(EmailsResponse {
        order_id,
        emails: record.emails,
    }))
}
