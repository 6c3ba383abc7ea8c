//! Redemption key model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A one-time-use code, keyed in the `keys` document by its full value
/// (`<PLAN>-XXXX-XXXX-XXXX`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionKey {
    pub plan: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

impl RedemptionKey {
    pub fn new(plan: String, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            created_at: now,
            used_by: None,
            used_at: None,
        }
    }

    /// A key with `used_by` set is permanently consumed
    pub fn is_used(&self) -> bool {
        self.used_by.is_some()
    }
}
