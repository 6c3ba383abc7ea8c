//! Redemption keys repository
//!
//! Keys live in the `keys` document keyed by their full value
//! (`<PLAN>-XXXX-XXXX-XXXX`). Redemption marks a key consumed exactly once;
//! a consumed key can never be activated again.

use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use tracing::info;

use crate::models::key::RedemptionKey;
use crate::storage::DocumentStore;

const KEYS_DOC: &str = "keys";
const GROUP_LEN: usize = 4;
const GROUPS: usize = 3;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

type KeysDoc = HashMap<String, RedemptionKey>;

#[derive(Debug, Clone)]
pub struct KeysRepo {
    store: DocumentStore,
}

impl KeysRepo {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Generate `count` fresh keys for `plan`.
    ///
    /// Draws random uppercase-alphanumeric groups and retries on the
    /// (negligible) chance of a collision with an existing value.
    pub async fn generate(&self, plan: &str, count: usize) -> Vec<String> {
        let plan = plan.to_lowercase();
        let prefix = plan.to_uppercase();
        let now = Utc::now();
        let plan_for_doc = plan.clone();
        let generated = self
            .store
            .update(KEYS_DOC, move |doc: &mut KeysDoc| {
                let mut rng = rand::thread_rng();
                let mut generated = Vec::with_capacity(count);
                for _ in 0..count {
                    let value = loop {
                        let candidate = random_key(&mut rng, &prefix);
                        if !doc.contains_key(&candidate) {
                            break candidate;
                        }
                    };
                    doc.insert(value.clone(), RedemptionKey::new(plan_for_doc.clone(), now));
                    generated.push(value);
                }
                generated
            })
            .await;
        info!(plan = plan, count = generated.len(), "Generated redemption keys");
        generated
    }

    /// Consume a key for `user_id`.
    ///
    /// Returns the key record on success; `None` signals "invalid or
    /// already used" without distinguishing the two.
    pub async fn redeem(&self, value: &str, user_id: i64) -> Option<RedemptionKey> {
        let value = value.trim().to_uppercase();
        self.store
            .update(KEYS_DOC, move |doc: &mut KeysDoc| {
                let key = doc.get_mut(&value)?;
                if key.is_used() {
                    return None;
                }
                key.used_by = Some(user_id.to_string());
                key.used_at = Some(Utc::now());
                Some(key.clone())
            })
            .await
    }

    pub async fn get(&self, value: &str) -> Option<RedemptionKey> {
        let doc: KeysDoc = self.store.load(KEYS_DOC).await;
        doc.get(&value.trim().to_uppercase()).cloned()
    }

    pub async fn delete(&self, value: &str) -> bool {
        let value = value.trim().to_uppercase();
        self.store
            .update(KEYS_DOC, move |doc: &mut KeysDoc| doc.remove(&value).is_some())
            .await
    }

    /// Unused keys, oldest first, for the admin key inventory
    pub async fn list_unused(&self) -> Vec<(String, RedemptionKey)> {
        let doc: KeysDoc = self.store.load(KEYS_DOC).await;
        let mut keys: Vec<(String, RedemptionKey)> =
            doc.into_iter().filter(|(_, k)| !k.is_used()).collect();
        keys.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.0.cmp(&b.0)));
        keys
    }
}

fn random_key(rng: &mut impl Rng, prefix: &str) -> String {
    let mut value = String::with_capacity(prefix.len() + GROUPS * (GROUP_LEN + 1));
    value.push_str(prefix);
    for _ in 0..GROUPS {
        value.push('-');
        for _ in 0..GROUP_LEN {
            let idx = rng.gen_range(0..CHARSET.len());
            value.push(CHARSET[idx] as char);
        }
    }
    value
}
