//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// Access entitlement embedded in a user record.
///
/// `expire_at = None` means the subscription never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: String,
    pub expire_at: Option<DateTime<Utc>>,
    /// Redemption key that granted this subscription, or `"admin"` for
    /// admin-granted entitlements.
    pub key: String,
}

impl Subscription {
    /// Whether the subscription is active at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expire_at {
            None => true,
            Some(expire_at) => expire_at > now,
        }
    }
}

/// A registered user, keyed in the `users` document by the Telegram chat id
/// rendered as a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub balance: i64,
    #[serde(default)]
    pub role: UserRole,
    pub lang: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl User {
    /// Create a fresh record with a zero balance
    pub fn new(role: UserRole, lang: String, now: DateTime<Utc>) -> Self {
        Self {
            balance: 0,
            role,
            lang,
            created_at: now,
            subscription: None,
            label: None,
            country: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_subscription_activity() {
        let now = Utc::now();
        let sub = Subscription {
            plan: "monthly".to_string(),
            expire_at: Some(now + Duration::days(30)),
            key: "MONTHLY-AAAA-BBBB-CCCC".to_string(),
        };
        assert!(sub.is_active(now));
        assert!(sub.is_active(now + Duration::days(29)));
        assert!(!sub.is_active(now + Duration::days(30)));
        assert!(!sub.is_active(now + Duration::days(31)));

        let lifetime = Subscription {
            plan: "lifetime".to_string(),
            expire_at: None,
            key: "admin".to_string(),
        };
        assert!(lifetime.is_active(now + Duration::days(10_000)));
    }

    #[test]
    fn test_legacy_record_deserializes_with_defaults() {
        // Records written before labels/subscriptions existed carry only the
        // original four fields.
        let raw = r#"{"balance": 80, "lang": "ar", "created_at": "2024-01-01T00:00:00Z"}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.balance, 80);
        assert_eq!(user.role, UserRole::User);
        assert!(user.subscription.is_none());
        assert!(user.label.is_none());
    }
}
