//! Subscription management service
//!
//! Computes active/expired state from the stored subscription record,
//! activates redemption keys and handles admin grants/extensions. Plan
//! durations come from the configured plan table; a duration of zero days
//! means the plan never expires.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::config::SubscriptionConfig;
use crate::models::key::RedemptionKey;
use crate::models::user::{Subscription, User};
use crate::storage::repositories::{KeysRepo, UsersRepo};
use crate::utils::helpers::format_duration;

/// Sentinel recorded as the key of admin-granted subscriptions
const ADMIN_KEY: &str = "admin";

/// Time left on a subscription
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remaining {
    Expired,
    Unlimited,
    Time(Duration),
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remaining::Expired => write!(f, "0s"),
            Remaining::Unlimited => write!(f, "∞"),
            Remaining::Time(duration) => write!(f, "{}", format_duration(*duration)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ActivationOutcome {
    Activated(Subscription),
    /// Unknown or already-used key; the two are indistinguishable on purpose
    InvalidKey,
    /// The key's plan is no longer in the configured table; the key is left
    /// unconsumed
    UnknownPlan(String),
}

#[derive(Debug, Clone)]
pub enum GrantOutcome {
    Granted(Subscription),
    UnknownPlan(String),
    InvalidMode(String),
}

#[derive(Debug, Clone)]
pub struct SubscriptionService {
    users: UsersRepo,
    keys: KeysRepo,
    config: SubscriptionConfig,
}

impl SubscriptionService {
    pub fn new(users: UsersRepo, keys: KeysRepo, config: SubscriptionConfig) -> Self {
        Self {
            users,
            keys,
            config,
        }
    }

    /// Whether the user holds an active subscription at `now`.
    ///
    /// Pure in (`expire_at`, `now`): no stored state is touched.
    pub fn is_active(user: &User, now: DateTime<Utc>) -> bool {
        user.subscription
            .as_ref()
            .map_or(false, |sub| sub.is_active(now))
    }

    pub fn remaining(user: &User, now: DateTime<Utc>) -> Remaining {
        match &user.subscription {
            None => Remaining::Expired,
            Some(sub) => match sub.expire_at {
                None => Remaining::Unlimited,
                Some(expire_at) if expire_at > now => Remaining::Time(expire_at - now),
                Some(_) => Remaining::Expired,
            },
        }
    }

    fn expiry_for(&self, days: u32, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if days == 0 {
            None
        } else {
            Some(from + Duration::days(days as i64))
        }
    }

    /// Redeem a key for a user.
    ///
    /// Consumes the key and writes the subscription; the two writes hit
    /// separate documents and are not transactionally linked.
    pub async fn activate(&self, user_id: i64, key_value: &str) -> ActivationOutcome {
        let key_value = key_value.trim().to_uppercase();
        let Some(key) = self.keys.get(&key_value).await else {
            return ActivationOutcome::InvalidKey;
        };
        if key.is_used() {
            return ActivationOutcome::InvalidKey;
        }
        let Some(&days) = self.config.plans.get(&key.plan) else {
            return ActivationOutcome::UnknownPlan(key.plan);
        };

        // The redeem call is the authoritative at-most-once guard
        let Some(key) = self.keys.redeem(&key_value, user_id).await else {
            return ActivationOutcome::InvalidKey;
        };

        let subscription = Subscription {
            plan: key.plan,
            expire_at: self.expiry_for(days, Utc::now()),
            key: key_value,
        };
        self.users
            .set_subscription(user_id, subscription.clone())
            .await;
        info!(user_id = user_id, plan = %subscription.plan, "Subscription activated");
        ActivationOutcome::Activated(subscription)
    }

    /// Admin grant or extension.
    ///
    /// `mode` is either a plan name (absolute duration from now) or `+N`
    /// (adds N days to a live expiry, else counts from now).
    pub async fn grant(&self, user_id: i64, mode: &str) -> GrantOutcome {
        let mode = mode.trim();
        let now = Utc::now();

        let subscription = if let Some(days) = mode.strip_prefix('+') {
            let Ok(days) = days.parse::<u32>() else {
                return GrantOutcome::InvalidMode(mode.to_string());
            };
            if days == 0 {
                return GrantOutcome::InvalidMode(mode.to_string());
            }
            let current = self.users.get(user_id).await.and_then(|u| u.subscription);
            let base = match current.as_ref().and_then(|s| s.expire_at) {
                Some(expire_at) if expire_at > now => expire_at,
                _ => now,
            };
            Subscription {
                plan: current.map(|s| s.plan).unwrap_or_else(|| "custom".to_string()),
                expire_at: Some(base + Duration::days(days as i64)),
                key: ADMIN_KEY.to_string(),
            }
        } else {
            let plan = mode.to_lowercase();
            let Some(&days) = self.config.plans.get(&plan) else {
                return GrantOutcome::UnknownPlan(plan);
            };
            Subscription {
                plan,
                expire_at: self.expiry_for(days, now),
                key: ADMIN_KEY.to_string(),
            }
        };

        self.users
            .set_subscription(user_id, subscription.clone())
            .await;
        info!(user_id = user_id, plan = %subscription.plan, "Subscription granted");
        GrantOutcome::Granted(subscription)
    }

    /// Delete the user's subscription; `false` when there was none
    pub async fn revoke(&self, user_id: i64) -> bool {
        let removed = self.users.clear_subscription(user_id).await;
        if removed {
            info!(user_id = user_id, "Subscription revoked");
        }
        removed
    }

    /// Remove an unwanted key; `false` when it does not exist
    pub async fn delete_key(&self, value: &str) -> bool {
        self.keys.delete(value).await
    }

    /// Inventory of keys nobody has redeemed yet, oldest first
    pub async fn unused_keys(&self) -> Vec<(String, RedemptionKey)> {
        self.keys.list_unused().await
    }

    /// Issue fresh keys; `None` for a plan missing from the table
    pub async fn generate_keys(&self, plan: &str, count: usize) -> Option<Vec<String>> {
        let plan = plan.trim().to_lowercase();
        if !self.config.plans.contains_key(&plan) {
            return None;
        }
        Some(self.keys.generate(&plan, count).await)
    }

    pub fn plan_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.config.plans.keys().cloned().collect();
        names.sort();
        names
    }
}
