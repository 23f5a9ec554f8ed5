pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::downloads::handlers as downloads;
use crate::orders::handlers as orders;
use crate::state::AppState;

/// Multipart framing on top of the 10MB file allowance.
const UPLOAD_BODY_LIMIT: usize = upload::MAX_UPLOAD_BYTES + 512 * 1024;

pub fn build_router(state: AppState) -> Router {
    let generated = ServeDir::new(&state.config.generated_dir);
    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/status/remaining", get(health::remaining_handler))
        .route(
            "/api/upload",
            post(upload::upload_handler).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Orders
        .route("/api/checkout", post(orders::handle_checkout))
        .route("/api/payments/callback", post(orders::handle_payment_callback))
        .route("/api/orders/simulate", post(orders::handle_simulate))
        .route("/api/orders/:id", get(orders::handle_get_order))
        .route("/api/orders/:id/emails", get(orders::handle_get_emails))
        // Deliverables
        .route("/download/:token", get(downloads::handle_download))
        .nest_service("/generated", generated)
        .nest_service("/uploads", uploads)
        .with_state(state)
}
