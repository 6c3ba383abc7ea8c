//! Withdrawal lifecycle: creation debits, deny/cancel credit back exactly
//! once, approve keeps the funds debited, terminal states are final.

mod common;

use assert_matches::assert_matches;

use common::{TestContext, USER_ID};
use SignalPilot::models::withdrawal::WithdrawalAction;
use SignalPilot::services::{AdjudicateOutcome, CancelOutcome, WithdrawOutcome};
use SignalPilot::storage::KvStore;

#[tokio::test]
async fn test_request_debits_and_rejects_when_short() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.ensure(USER_ID, "en").await;
    services.users.credit(USER_ID, 80).await;

    let outcome = services.withdrawal.request(USER_ID, 50).await;
    assert_matches!(outcome, WithdrawOutcome::Created { amount: 50, .. });
    assert_eq!(services.users.get_balance(USER_ID).await, 30);

    // Second request for the same amount no longer fits
    let outcome = services.withdrawal.request(USER_ID, 50).await;
    assert_matches!(outcome, WithdrawOutcome::InsufficientBalance { balance: 30 });
    assert_eq!(services.users.get_balance(USER_ID).await, 30);
}

#[tokio::test]
async fn test_invalid_amounts_rejected() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 100).await;

    assert_matches!(
        services.withdrawal.request(USER_ID, 0).await,
        WithdrawOutcome::InvalidAmount
    );
    assert_matches!(
        services.withdrawal.request(USER_ID, -5).await,
        WithdrawOutcome::InvalidAmount
    );
    assert_eq!(services.users.get_balance(USER_ID).await, 100);
}

#[tokio::test]
async fn test_deny_credits_back_exactly_once() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 80).await;

    let WithdrawOutcome::Created { id, .. } = services.withdrawal.request(USER_ID, 50).await
    else {
        panic!("request should succeed");
    };
    assert_eq!(services.users.get_balance(USER_ID).await, 30);

    let outcome = services.withdrawal.deny(&id).await;
    assert_matches!(outcome, AdjudicateOutcome::Done { user_id: USER_ID, amount: 50 });
    assert_eq!(services.users.get_balance(USER_ID).await, 80);

    // Terminal: a second deny must not credit again
    assert_matches!(services.withdrawal.deny(&id).await, AdjudicateOutcome::Rejected);
    assert_matches!(services.withdrawal.approve(&id).await, AdjudicateOutcome::Rejected);
    assert_eq!(services.users.get_balance(USER_ID).await, 80);
}

#[tokio::test]
async fn test_approve_keeps_funds_debited() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 80).await;

    let WithdrawOutcome::Created { id, .. } = services.withdrawal.request(USER_ID, 50).await
    else {
        panic!("request should succeed");
    };

    assert_matches!(
        services.withdrawal.approve(&id).await,
        AdjudicateOutcome::Done { amount: 50, .. }
    );
    assert_eq!(services.users.get_balance(USER_ID).await, 30);
    assert_matches!(services.withdrawal.cancel(&id, USER_ID).await, CancelOutcome::Rejected);
    assert_eq!(services.users.get_balance(USER_ID).await, 30);
}

#[tokio::test]
async fn test_cancel_is_owner_only() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 60).await;

    let WithdrawOutcome::Created { id, .. } = services.withdrawal.request(USER_ID, 60).await
    else {
        panic!("request should succeed");
    };

    // A different user cannot cancel it
    assert_matches!(services.withdrawal.cancel(&id, 999).await, CancelOutcome::Rejected);
    assert_eq!(services.users.get_balance(USER_ID).await, 0);

    assert_matches!(
        services.withdrawal.cancel(&id, USER_ID).await,
        CancelOutcome::Canceled { amount: 60 }
    );
    assert_eq!(services.users.get_balance(USER_ID).await, 60);

    // And only once
    assert_matches!(services.withdrawal.cancel(&id, USER_ID).await, CancelOutcome::Rejected);
    assert_eq!(services.users.get_balance(USER_ID).await, 60);
}

#[tokio::test]
async fn test_adjudication_rejects_corrupt_owner_record() {
    let ctx = TestContext::new();
    let services = &ctx.services;

    // Hand-edited document with a non-numeric owner id
    KvStore::file(ctx.data_dir())
        .set(
            "withdraw_requests",
            &serde_json::json!({
                "next_id": 2,
                "requests": {
                    "1": {
                        "user_id": "not-a-number",
                        "amount": 25,
                        "status": "pending",
                        "created_at": "2026-01-05T10:00:00Z"
                    }
                }
            }),
        )
        .await
        .unwrap();

    assert_matches!(services.withdrawal.deny("1").await, AdjudicateOutcome::Rejected);
    assert_matches!(services.withdrawal.approve("1").await, AdjudicateOutcome::Rejected);
    // No ghost account credited, no audit entry, request left pending
    assert_eq!(services.users.get_balance(0).await, 0);
    assert!(services.withdrawal.audit_log().await.is_empty());
    assert_eq!(services.withdrawal.list_pending(None).await.len(), 1);
}

#[tokio::test]
async fn test_audit_trail_records_adjudications_only() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 100).await;

    let WithdrawOutcome::Created { id: approved_id, .. } =
        services.withdrawal.request(USER_ID, 40).await
    else {
        panic!("request should succeed");
    };
    let WithdrawOutcome::Created { id: denied_id, .. } =
        services.withdrawal.request(USER_ID, 30).await
    else {
        panic!("request should succeed");
    };
    let WithdrawOutcome::Created { id: canceled_id, .. } =
        services.withdrawal.request(USER_ID, 20).await
    else {
        panic!("request should succeed");
    };

    services.withdrawal.approve(&approved_id).await;
    services.withdrawal.deny(&denied_id).await;
    // User cancels leave no adjudication entry
    services.withdrawal.cancel(&canceled_id, USER_ID).await;
    // Rejected re-adjudication must not append a duplicate
    services.withdrawal.deny(&approved_id).await;

    let log = services.withdrawal.audit_log().await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].request_id, approved_id);
    assert_matches!(log[0].action, WithdrawalAction::Approved);
    assert_eq!(log[0].amount, 40);
    assert_eq!(log[1].request_id, denied_id);
    assert_matches!(log[1].action, WithdrawalAction::Denied);
}

#[tokio::test]
async fn test_pending_listing_and_filter() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.credit(USER_ID, 100).await;
    services.users.credit(200, 100).await;

    services.withdrawal.request(USER_ID, 10).await;
    services.withdrawal.request(200, 20).await;
    services.withdrawal.request(USER_ID, 30).await;

    let all = services.withdrawal.list_pending(None).await;
    assert_eq!(all.len(), 3);
    // Insertion order by numeric id
    assert_eq!(all[0].0, "1");
    assert_eq!(all[2].0, "3");

    let mine = services.withdrawal.list_pending(Some(USER_ID)).await;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|(_, r)| r.user_id == USER_ID.to_string()));
}
