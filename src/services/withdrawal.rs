//! Withdrawal management service
//!
//! Creates, lists, cancels and adjudicates withdrawal requests while
//! maintaining the balance invariants: creation debits exactly the amount,
//! deny/cancel credit it back exactly once, approve leaves the balance
//! untouched. Status transitions and audit appends are authoritative; user
//! notification happens at the handler layer and is best-effort.

use chrono::Utc;
use tracing::{info, warn};

use crate::models::withdrawal::{
    WithdrawalAction, WithdrawalLogEntry, WithdrawalRequest, WithdrawalStatus,
};
use crate::storage::repositories::{UsersRepo, WithdrawalsRepo};

#[derive(Debug, Clone)]
pub enum WithdrawOutcome {
    Created { id: String, amount: i64 },
    InvalidAmount,
    InsufficientBalance { balance: i64 },
}

#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Canceled { amount: i64 },
    /// Unknown id, foreign owner or already-terminal request
    Rejected,
}

#[derive(Debug, Clone)]
pub enum AdjudicateOutcome {
    Done { user_id: i64, amount: i64 },
    /// Unknown id or already-terminal request
    Rejected,
}

#[derive(Debug, Clone)]
pub struct WithdrawalService {
    users: UsersRepo,
    withdrawals: WithdrawalsRepo,
}

impl WithdrawalService {
    pub fn new(users: UsersRepo, withdrawals: WithdrawalsRepo) -> Self {
        Self { users, withdrawals }
    }

    /// Create a pending request, debiting the balance up front.
    ///
    /// The debit is the atomic sufficiency check: it rejects without
    /// mutating when the balance is short.
    pub async fn request(&self, user_id: i64, amount: i64) -> WithdrawOutcome {
        if amount <= 0 {
            return WithdrawOutcome::InvalidAmount;
        }
        if !self.users.debit(user_id, amount).await {
            let balance = self.users.get_balance(user_id).await;
            return WithdrawOutcome::InsufficientBalance { balance };
        }

        let (id, _) = self.withdrawals.create(user_id, amount).await;
        info!(user_id = user_id, request_id = %id, amount = amount, "Withdrawal request created");
        WithdrawOutcome::Created { id, amount }
    }

    /// User-initiated cancel: owner-only, pending-only, credits back
    pub async fn cancel(&self, request_id: &str, user_id: i64) -> CancelOutcome {
        match self.withdrawals.get(request_id).await {
            Some(request) if request.user_id == user_id.to_string() => {}
            _ => return CancelOutcome::Rejected,
        }
        let Some(request) = self
            .withdrawals
            .set_status(request_id, WithdrawalStatus::Canceled)
            .await
        else {
            return CancelOutcome::Rejected;
        };

        self.users.credit(user_id, request.amount).await;
        info!(user_id = user_id, request_id = request_id, "Withdrawal request canceled");
        CancelOutcome::Canceled {
            amount: request.amount,
        }
    }

    /// Admin approve: funds stay debited, audit entry appended
    pub async fn approve(&self, request_id: &str) -> AdjudicateOutcome {
        let Some(user_id) = self.owner_of(request_id).await else {
            return AdjudicateOutcome::Rejected;
        };
        let Some(request) = self
            .withdrawals
            .set_status(request_id, WithdrawalStatus::Approved)
            .await
        else {
            return AdjudicateOutcome::Rejected;
        };
        self.append_audit(request_id, &request, WithdrawalAction::Approved)
            .await;
        info!(request_id = request_id, amount = request.amount, "Withdrawal approved");
        AdjudicateOutcome::Done {
            user_id,
            amount: request.amount,
        }
    }

    /// Admin deny: credits the amount back, audit entry appended
    pub async fn deny(&self, request_id: &str) -> AdjudicateOutcome {
        let Some(user_id) = self.owner_of(request_id).await else {
            return AdjudicateOutcome::Rejected;
        };
        let Some(request) = self
            .withdrawals
            .set_status(request_id, WithdrawalStatus::Denied)
            .await
        else {
            return AdjudicateOutcome::Rejected;
        };

        self.users.credit(user_id, request.amount).await;
        self.append_audit(request_id, &request, WithdrawalAction::Denied)
            .await;
        info!(request_id = request_id, amount = request.amount, "Withdrawal denied");
        AdjudicateOutcome::Done {
            user_id,
            amount: request.amount,
        }
    }

    /// Owner of a stored request. A non-numeric stored id means a corrupt
    /// document; the request is left untouched rather than credited to a
    /// ghost account.
    async fn owner_of(&self, request_id: &str) -> Option<i64> {
        let request = self.withdrawals.get(request_id).await?;
        match request.user_id.parse() {
            Ok(user_id) => Some(user_id),
            Err(_) => {
                warn!(
                    request_id = request_id,
                    owner = %request.user_id,
                    "Stored owner id is not numeric, refusing to adjudicate"
                );
                None
            }
        }
    }

    pub async fn list_pending(&self, user_id: Option<i64>) -> Vec<(String, WithdrawalRequest)> {
        self.withdrawals.list_pending(user_id).await
    }

    /// Full adjudication audit trail, oldest first
    pub async fn audit_log(&self) -> Vec<WithdrawalLogEntry> {
        self.withdrawals.log().await
    }

    async fn append_audit(
        &self,
        request_id: &str,
        request: &WithdrawalRequest,
        action: WithdrawalAction,
    ) {
        self.withdrawals
            .append_log(WithdrawalLogEntry {
                request_id: request_id.to_string(),
                user_id: request.user_id.clone(),
                amount: request.amount,
                action,
                created_at: request.created_at,
                processed_at: Utc::now(),
            })
            .await;
    }
}
