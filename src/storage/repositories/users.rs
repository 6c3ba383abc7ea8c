//! Users repository
//!
//! Read/modify/write access to the `users` document plus the balance ledger
//! operations embedded in it. All mutations run under the document lock so
//! concurrent updates for different users cannot lose writes.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use crate::models::user::{Subscription, User, UserRole};
use crate::storage::DocumentStore;

const USERS_DOC: &str = "users";

type UsersDoc = HashMap<String, User>;

#[derive(Debug, Clone)]
pub struct UsersRepo {
    store: DocumentStore,
    admin_ids: Vec<i64>,
    default_lang: String,
}

impl UsersRepo {
    pub fn new(store: DocumentStore, admin_ids: Vec<i64>, default_lang: String) -> Self {
        Self {
            store,
            admin_ids,
            default_lang,
        }
    }

    fn default_user(&self, user_id: i64, lang: &str) -> User {
        let role = if self.admin_ids.contains(&user_id) {
            UserRole::Admin
        } else {
            UserRole::User
        };
        User::new(role, lang.to_string(), Utc::now())
    }

    /// Create-if-absent and return the record. Registration is implicit on
    /// first contact; the role comes from the configured admin allow-list.
    pub async fn ensure(&self, user_id: i64, lang: &str) -> User {
        let default = self.default_user(user_id, lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert_with(|| {
                    info!(user_id = user_id, "Registered new user");
                    default
                });
                user.clone()
            })
            .await
    }

    pub async fn get(&self, user_id: i64) -> Option<User> {
        let doc: UsersDoc = self.store.load(USERS_DOC).await;
        doc.get(&user_id.to_string()).cloned()
    }

    pub async fn get_balance(&self, user_id: i64) -> i64 {
        self.get(user_id).await.map(|u| u.balance).unwrap_or(0)
    }

    /// Unconditional credit. Creates the record if absent so admin credits
    /// can precede the user's first contact.
    pub async fn credit(&self, user_id: i64, amount: i64) -> i64 {
        let default = self.default_user(user_id, &self.default_lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert(default);
                user.balance += amount;
                user.balance
            })
            .await
    }

    /// Debit that rejects rather than clamps: returns `false` and leaves the
    /// balance untouched when it would go negative.
    pub async fn debit(&self, user_id: i64, amount: i64) -> bool {
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                match doc.get_mut(&user_id.to_string()) {
                    Some(user) if user.balance >= amount => {
                        user.balance -= amount;
                        true
                    }
                    _ => false,
                }
            })
            .await
    }

    /// Admin overwrite; `amount` must already be validated non-negative.
    pub async fn set_balance(&self, user_id: i64, amount: i64) -> i64 {
        let default = self.default_user(user_id, &self.default_lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert(default);
                user.balance = amount;
                user.balance
            })
            .await
    }

    /// Admin subtraction that floors at zero instead of failing
    pub async fn take_balance(&self, user_id: i64, amount: i64) -> i64 {
        let default = self.default_user(user_id, &self.default_lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert(default);
                user.balance = (user.balance - amount).max(0);
                user.balance
            })
            .await
    }

    pub async fn set_lang(&self, user_id: i64, lang: &str) {
        let default = self.default_user(user_id, lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert(default);
                user.lang = lang.to_string();
            })
            .await
    }

    pub async fn set_role(&self, user_id: i64, role: UserRole) -> bool {
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                match doc.get_mut(&user_id.to_string()) {
                    Some(user) => {
                        user.role = role;
                        true
                    }
                    None => false,
                }
            })
            .await
    }

    pub async fn set_label(&self, user_id: i64, label: Option<String>) -> bool {
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                match doc.get_mut(&user_id.to_string()) {
                    Some(user) => {
                        user.label = label;
                        true
                    }
                    None => false,
                }
            })
            .await
    }

    pub async fn set_country(&self, user_id: i64, country: Option<String>) -> bool {
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                match doc.get_mut(&user_id.to_string()) {
                    Some(user) => {
                        user.country = country;
                        true
                    }
                    None => false,
                }
            })
            .await
    }

    /// Write or replace the embedded subscription
    pub async fn set_subscription(&self, user_id: i64, subscription: Subscription) {
        let default = self.default_user(user_id, &self.default_lang);
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                let user = doc.entry(user_id.to_string()).or_insert(default);
                user.subscription = Some(subscription);
            })
            .await
    }

    /// Delete the embedded subscription; `false` when there was none
    pub async fn clear_subscription(&self, user_id: i64) -> bool {
        self.store
            .update(USERS_DOC, |doc: &mut UsersDoc| {
                match doc.get_mut(&user_id.to_string()) {
                    Some(user) => user.subscription.take().is_some(),
                    None => false,
                }
            })
            .await
    }

    /// All known chat ids, for broadcasts
    pub async fn all_ids(&self) -> Vec<i64> {
        let doc: UsersDoc = self.store.load(USERS_DOC).await;
        let mut ids: Vec<i64> = doc.keys().filter_map(|id| id.parse().ok()).collect();
        ids.sort_unstable();
        ids
    }

    pub async fn count(&self) -> usize {
        let doc: UsersDoc = self.store.load(USERS_DOC).await;
        doc.len()
    }

    /// Raw document export for the admin `/export` command
    pub async fn export(&self) -> Vec<u8> {
        let doc: UsersDoc = self.store.load(USERS_DOC).await;
        serde_json::to_vec_pretty(&doc).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;

    fn repo(dir: &tempfile::TempDir) -> UsersRepo {
        let store = DocumentStore::new(KvStore::file(dir.path()));
        UsersRepo::new(store, vec![42], "ar".to_string())
    }

    #[tokio::test]
    async fn test_ensure_assigns_role_from_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);

        let admin = repo.ensure(42, "en").await;
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.balance, 0);

        let user = repo.ensure(100, "en").await;
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.lang, "en");
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);

        repo.ensure(100, "en").await;
        repo.credit(100, 50).await;
        let again = repo.ensure(100, "tr").await;
        // Existing record untouched
        assert_eq!(again.balance, 50);
        assert_eq!(again.lang, "en");
    }

    #[tokio::test]
    async fn test_debit_rejects_overdraft() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        repo.ensure(100, "en").await;
        repo.credit(100, 30).await;

        assert!(!repo.debit(100, 31).await);
        assert_eq!(repo.get_balance(100).await, 30);
        assert!(repo.debit(100, 30).await);
        assert_eq!(repo.get_balance(100).await, 0);
    }

    #[tokio::test]
    async fn test_take_balance_floors_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        repo.set_balance(100, 0).await;
        assert_eq!(repo.take_balance(100, 999).await, 0);
        assert_eq!(repo.get_balance(100).await, 0);
    }
}
