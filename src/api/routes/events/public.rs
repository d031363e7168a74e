//! Public types for the events API
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub calendar_id: String,
    pub year: i32,
    /// 1-12
    pub month: i32,
}

/// Events exactly as the provider returned them
#[derive(Serialize, Deserialize)]
pub struct EventsResponse {
    pub items: Vec<Value>,
}
