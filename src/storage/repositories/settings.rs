//! Runtime settings repository
//!
//! Free-form string-keyed configuration (e.g. `website_url`) that admins can
//! edit at runtime, plus the daily trade text blob.

use std::collections::HashMap;

use crate::storage::DocumentStore;

const SETTINGS_DOC: &str = "settings";
const DAILY_DOC: &str = "daily_trade";

type SettingsDoc = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct SettingsRepo {
    store: DocumentStore,
}

impl SettingsRepo {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn get_value(&self, key: &str) -> Option<String> {
        let doc: SettingsDoc = self.store.load(SETTINGS_DOC).await;
        doc.get(key).cloned()
    }

    pub async fn set_value(&self, key: &str, value: &str) {
        let key = key.to_lowercase();
        let value = value.to_string();
        self.store
            .update(SETTINGS_DOC, move |doc: &mut SettingsDoc| {
                doc.insert(key, value);
            })
            .await
    }

    pub async fn all(&self) -> SettingsDoc {
        self.store.load(SETTINGS_DOC).await
    }

    /// Current daily trade tip; empty when none has been set
    pub async fn daily_text(&self) -> String {
        self.store.load(DAILY_DOC).await
    }

    pub async fn set_daily_text(&self, text: &str) {
        self.store.save(DAILY_DOC, &text.trim().to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;

    #[tokio::test]
    async fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepo::new(DocumentStore::new(KvStore::file(dir.path())));

        assert_eq!(repo.get_value("website_url").await, None);
        repo.set_value("WEBSITE_URL", "https://example.com").await;
        assert_eq!(
            repo.get_value("website_url").await.as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn test_daily_text() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepo::new(DocumentStore::new(KvStore::file(dir.path())));

        assert_eq!(repo.daily_text().await, "");
        repo.set_daily_text("  BUY EURUSD @ 1.0850\nTP 1.0900  ").await;
        assert_eq!(repo.daily_text().await, "BUY EURUSD @ 1.0850\nTP 1.0900");
    }
}
