//! Withdrawal requests repository
//!
//! Requests live in the `withdraw_requests` document together with a
//! monotonic id counter. The counter is stored, not derived from the live
//! collection's size, so ids stay unique even if entries are ever removed.
//! Admin adjudications also append to the `withdraw_log` audit document.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::withdrawal::{WithdrawalLogEntry, WithdrawalRequest, WithdrawalStatus};
use crate::storage::DocumentStore;

const REQUESTS_DOC: &str = "withdraw_requests";
const LOG_DOC: &str = "withdraw_log";

#[derive(Debug, Default, Serialize, Deserialize)]
struct WithdrawalsDoc {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    requests: HashMap<String, WithdrawalRequest>,
}

impl WithdrawalsDoc {
    /// Documents written before the counter existed are seeded from the
    /// highest id present.
    fn allocate_id(&mut self) -> u64 {
        if self.next_id == 0 {
            let max = self
                .requests
                .keys()
                .filter_map(|id| id.parse::<u64>().ok())
                .max()
                .unwrap_or(0);
            self.next_id = max + 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalsRepo {
    store: DocumentStore,
}

impl WithdrawalsRepo {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Insert a new pending request and return its id and record
    pub async fn create(&self, user_id: i64, amount: i64) -> (String, WithdrawalRequest) {
        self.store
            .update(REQUESTS_DOC, move |doc: &mut WithdrawalsDoc| {
                let id = doc.allocate_id().to_string();
                let request = WithdrawalRequest {
                    user_id: user_id.to_string(),
                    amount,
                    status: WithdrawalStatus::Pending,
                    created_at: Utc::now(),
                };
                doc.requests.insert(id.clone(), request.clone());
                (id, request)
            })
            .await
    }

    pub async fn get(&self, request_id: &str) -> Option<WithdrawalRequest> {
        let doc: WithdrawalsDoc = self.store.load(REQUESTS_DOC).await;
        doc.requests.get(request_id).cloned()
    }

    /// Pending requests in insertion (id) order, optionally narrowed to one
    /// user
    pub async fn list_pending(&self, user_id: Option<i64>) -> Vec<(String, WithdrawalRequest)> {
        let doc: WithdrawalsDoc = self.store.load(REQUESTS_DOC).await;
        let filter = user_id.map(|id| id.to_string());
        let mut pending: Vec<(String, WithdrawalRequest)> = doc
            .requests
            .into_iter()
            .filter(|(_, r)| r.status == WithdrawalStatus::Pending)
            .filter(|(_, r)| filter.as_ref().map_or(true, |id| &r.user_id == id))
            .collect();
        pending.sort_by_key(|(id, _)| id.parse::<u64>().unwrap_or(u64::MAX));
        pending
    }

    /// Apply a terminal status, guarded to only ever transition out of
    /// `Pending`. Returns the updated record, or `None` when the request is
    /// unknown or already terminal.
    pub async fn set_status(
        &self,
        request_id: &str,
        status: WithdrawalStatus,
    ) -> Option<WithdrawalRequest> {
        let request_id = request_id.to_string();
        self.store
            .update(REQUESTS_DOC, move |doc: &mut WithdrawalsDoc| {
                let request = doc.requests.get_mut(&request_id)?;
                if request.status != WithdrawalStatus::Pending {
                    return None;
                }
                request.status = status;
                Some(request.clone())
            })
            .await
    }

    /// Append an adjudication snapshot to the audit log
    pub async fn append_log(&self, entry: WithdrawalLogEntry) {
        self.store
            .update(LOG_DOC, move |log: &mut Vec<WithdrawalLogEntry>| {
                log.push(entry);
            })
            .await
    }

    pub async fn log(&self) -> Vec<WithdrawalLogEntry> {
        self.store.load(LOG_DOC).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;

    fn repo(dir: &tempfile::TempDir) -> WithdrawalsRepo {
        WithdrawalsRepo::new(DocumentStore::new(KvStore::file(dir.path())))
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        let (a, _) = repo.create(100, 10).await;
        let (b, _) = repo.create(100, 20).await;
        let (c, _) = repo.create(200, 30).await;
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("1", "2", "3"));
    }

    #[tokio::test]
    async fn test_counter_seeds_from_legacy_documents() {
        let dir = tempfile::tempdir().unwrap();
        // Written before the counter existed: no next_id, and id 2 is gone,
        // so deriving the next id from the collection size would collide
        // with the surviving 3
        let legacy = serde_json::json!({
            "requests": {
                "1": {
                    "user_id": "100",
                    "amount": 10,
                    "status": "approved",
                    "created_at": "2026-01-05T10:00:00Z"
                },
                "3": {
                    "user_id": "200",
                    "amount": 25,
                    "status": "pending",
                    "created_at": "2026-01-06T10:00:00Z"
                }
            }
        });
        KvStore::file(dir.path())
            .set("withdraw_requests", &legacy)
            .await
            .unwrap();

        let repo = repo(&dir);
        let (id, _) = repo.create(100, 40).await;
        assert_eq!(id, "4");
        let (id, _) = repo.create(100, 50).await;
        assert_eq!(id, "5");
        // Legacy entries survive untouched
        assert_eq!(repo.get("3").await.unwrap().amount, 25);
    }

    #[tokio::test]
    async fn test_set_status_only_from_pending() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        let (id, _) = repo.create(100, 10).await;

        assert!(repo
            .set_status(&id, WithdrawalStatus::Denied)
            .await
            .is_some());
        // Terminal; no further transition applies
        assert!(repo
            .set_status(&id, WithdrawalStatus::Approved)
            .await
            .is_none());
        assert_eq!(
            repo.get(&id).await.unwrap().status,
            WithdrawalStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_list_pending_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        for amount in [10, 20, 30] {
            repo.create(100, amount).await;
        }
        repo.create(200, 99).await;
        repo.set_status("2", WithdrawalStatus::Canceled).await;

        let mine = repo.list_pending(Some(100)).await;
        let amounts: Vec<i64> = mine.iter().map(|(_, r)| r.amount).collect();
        assert_eq!(amounts, vec![10, 30]);

        let all = repo.list_pending(None).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all.last().unwrap().0, "4");
    }
}
