use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use crate::models::generate_id;

/// Links a watcher (an opaque chat or user id) to a product it wants alerts for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub watcher_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(watcher_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            watcher_id: watcher_id.into(),
            product_id: product_id.into(),
            created_at: Utc::now(),
        }
    }
}
