//! Key redemption and admin grant lifecycle.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};

use common::{TestContext, USER_ID};
use SignalPilot::services::{ActivationOutcome, GrantOutcome, SubscriptionService};

#[tokio::test]
async fn test_monthly_key_activation() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.ensure(USER_ID, "en").await;

    let keys = services
        .subscription
        .generate_keys("monthly", 1)
        .await
        .expect("monthly is configured");
    let key = &keys[0];

    let before = Utc::now();
    let outcome = services.subscription.activate(USER_ID, key).await;
    let ActivationOutcome::Activated(subscription) = outcome else {
        panic!("fresh key should activate");
    };
    assert_eq!(subscription.plan, "monthly");
    let expire_at = subscription.expire_at.expect("monthly expires");
    assert!(expire_at > before + Duration::days(29));
    assert!(expire_at < before + Duration::days(31));

    let user = services.users.get(USER_ID).await.unwrap();
    assert!(SubscriptionService::is_active(&user, before + Duration::days(29)));
    assert!(!SubscriptionService::is_active(&user, before + Duration::days(31)));
}

#[tokio::test]
async fn test_key_redeems_at_most_once() {
    let ctx = TestContext::new();
    let services = &ctx.services;

    let key = services
        .subscription
        .generate_keys("weekly", 1)
        .await
        .unwrap()
        .remove(0);

    assert_matches!(
        services.subscription.activate(USER_ID, &key).await,
        ActivationOutcome::Activated(_)
    );
    // Same key fails for everyone afterwards, including the redeemer
    assert_matches!(
        services.subscription.activate(200, &key).await,
        ActivationOutcome::InvalidKey
    );
    assert_matches!(
        services.subscription.activate(USER_ID, &key).await,
        ActivationOutcome::InvalidKey
    );
}

#[tokio::test]
async fn test_unknown_key_rejected() {
    let ctx = TestContext::new();
    assert_matches!(
        ctx.services
            .subscription
            .activate(USER_ID, "MONTHLY-AAAA-BBBB-CCCC")
            .await,
        ActivationOutcome::InvalidKey
    );
}

#[tokio::test]
async fn test_lifetime_key_never_expires() {
    let ctx = TestContext::new();
    let services = &ctx.services;

    let key = services
        .subscription
        .generate_keys("lifetime", 1)
        .await
        .unwrap()
        .remove(0);
    let ActivationOutcome::Activated(subscription) =
        services.subscription.activate(USER_ID, &key).await
    else {
        panic!("fresh key should activate");
    };
    assert!(subscription.expire_at.is_none());

    let user = services.users.get(USER_ID).await.unwrap();
    assert!(SubscriptionService::is_active(&user, Utc::now() + Duration::days(10_000)));
}

#[tokio::test]
async fn test_grant_plan_and_extension() {
    let ctx = TestContext::new();
    let services = &ctx.services;
    services.users.ensure(USER_ID, "en").await;

    let GrantOutcome::Granted(first) = services.subscription.grant(USER_ID, "monthly").await
    else {
        panic!("monthly is configured");
    };
    let first_expiry = first.expire_at.unwrap();

    // +10 extends the live expiry, not now
    let GrantOutcome::Granted(extended) = services.subscription.grant(USER_ID, "+10").await
    else {
        panic!("extension should succeed");
    };
    let extended_expiry = extended.expire_at.unwrap();
    let gained = extended_expiry - first_expiry;
    assert!(gained >= Duration::days(10) - Duration::seconds(5));
    assert!(gained <= Duration::days(10) + Duration::seconds(5));
    assert_eq!(extended.plan, "monthly");
    assert_eq!(extended.key, "admin");
}

#[tokio::test]
async fn test_grant_rejects_bad_modes() {
    let ctx = TestContext::new();
    let services = &ctx.services;

    assert_matches!(
        services.subscription.grant(USER_ID, "yearly").await,
        GrantOutcome::UnknownPlan(_)
    );
    assert_matches!(
        services.subscription.grant(USER_ID, "+abc").await,
        GrantOutcome::InvalidMode(_)
    );
    assert_matches!(
        services.subscription.grant(USER_ID, "+0").await,
        GrantOutcome::InvalidMode(_)
    );
}

#[tokio::test]
async fn test_revoke() {
    let ctx = TestContext::new();
    let services = &ctx.services;

    assert!(!services.subscription.revoke(USER_ID).await);
    services.subscription.grant(USER_ID, "weekly").await;
    assert!(services.subscription.revoke(USER_ID).await);

    let user = services.users.get(USER_ID).await.unwrap();
    assert!(user.subscription.is_none());
}
