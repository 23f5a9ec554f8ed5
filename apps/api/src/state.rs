use crate::config::Config;
use crate::counter::Counter;
use crate::downloads::Downloads;
use crate::orders::admission::Admission;
use crate::orders::OrderTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub counter: Counter,
    pub tracker: OrderTracker,
    /// Checkout, payment callbacks and simulated orders all admit through here.
    pub admission: Admission,
    pub downloads: Downloads,
}
