use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One admitted purchase. `position` is the 1-based admission rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub email: String,
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    pub count: u32,
    pub purchases: Vec<PurchaseRecord>,
    pub sold_out_at: Option<DateTime<Utc>>,
}
