//! Withdrawal request and audit log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a withdrawal request.
///
/// `Pending` is the only non-terminal state; a request transitions out of it
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Denied,
    Canceled,
}

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

/// A user-initiated payout request, keyed in the `withdraw_requests`
/// document by a monotonic decimal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub user_id: String,
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
}

/// Action recorded in the append-only withdrawal audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalAction {
    Approved,
    Denied,
}

/// Snapshot written alongside every admin approve/deny. Never mutated after
/// append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalLogEntry {
    pub request_id: String,
    pub user_id: String,
    pub amount: i64,
    pub action: WithdrawalAction,
    pub created_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!WithdrawalStatus::Pending.is_terminal());
        assert!(WithdrawalStatus::Approved.is_terminal());
        assert!(WithdrawalStatus::Denied.is_terminal());
        assert!(WithdrawalStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WithdrawalStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&WithdrawalStatus::Canceled).unwrap(),
            "\"canceled\""
        );
    }
}
