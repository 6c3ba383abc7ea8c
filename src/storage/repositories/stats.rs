//! Per-user trade statistics repository

use std::collections::HashMap;

use chrono::Utc;

use crate::models::stats::{TradeKind, UserStats};
use crate::storage::DocumentStore;

const STATS_DOC: &str = "stats";

type StatsDoc = HashMap<String, UserStats>;

#[derive(Debug, Clone)]
pub struct StatsRepo {
    store: DocumentStore,
}

impl StatsRepo {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Record a win/loss for a user, updating running totals and the capped
    /// history
    pub async fn record(&self, user_id: i64, kind: TradeKind, amount: i64, note: Option<String>) {
        let now = Utc::now();
        self.store
            .update(STATS_DOC, move |doc: &mut StatsDoc| {
                doc.entry(user_id.to_string())
                    .or_default()
                    .record(kind, amount, note, now);
            })
            .await
    }

    pub async fn get(&self, user_id: i64) -> UserStats {
        let doc: StatsDoc = self.store.load(STATS_DOC).await;
        doc.get(&user_id.to_string()).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;

    #[tokio::test]
    async fn test_record_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let repo = StatsRepo::new(DocumentStore::new(KvStore::file(dir.path())));

        repo.record(100, TradeKind::Win, 40, Some("EURUSD".to_string()))
            .await;
        repo.record(100, TradeKind::Loss, 15, None).await;

        let stats = repo.get(100).await;
        assert_eq!(stats.total_win, 40);
        assert_eq!(stats.total_loss, 15);
        assert_eq!(stats.history.len(), 2);
        assert_eq!(stats.history[0].kind, TradeKind::Loss);

        // Unknown user gets empty stats
        let empty = repo.get(999).await;
        assert_eq!(empty.total_win, 0);
        assert!(empty.history.is_empty());
    }
}
