//! Durable key-value storage
//!
//! One JSON document per string key, with two interchangeable backends
//! selected at startup: a single-table relational store (Postgres) or flat
//! JSON files. "Not found" is never an error; callers supply their own
//! defaults.

use std::path::PathBuf;

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::fs;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::utils::errors::Result;

/// Key-value backend, selected by configuration
#[derive(Debug, Clone)]
pub enum KvStore {
    Postgres(PgPool),
    File { dir: PathBuf },
}

impl KvStore {
    /// Connect the configured backend.
    ///
    /// A present `database_url` selects Postgres and creates the `kv_store`
    /// table if missing; otherwise the data directory is created and flat
    /// files are used.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS kv_store (
                        key        TEXT PRIMARY KEY,
                        value      TEXT NOT NULL,
                        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                    )
                    "#,
                )
                .execute(&pool)
                .await?;
                info!("Relational storage backend enabled");
                Ok(KvStore::Postgres(pool))
            }
            None => {
                let dir = PathBuf::from(&config.data_dir);
                fs::create_dir_all(&dir).await?;
                info!(dir = %dir.display(), "File storage backend enabled");
                Ok(KvStore::File { dir })
            }
        }
    }

    /// Open a file-backed store over an existing directory
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        KvStore::File { dir: dir.into() }
    }

    /// Fetch the value stored under `key`.
    ///
    /// Missing keys and unparseable stored values both yield `Ok(None)`;
    /// only a genuinely unreachable backend is an error.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self {
            KvStore::Postgres(pool) => {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT value FROM kv_store WHERE key = $1")
                        .bind(key)
                        .fetch_optional(pool)
                        .await?;
                Ok(row.and_then(|(raw,)| parse_stored(key, &raw)))
            }
            KvStore::File { dir } => {
                let path = dir.join(format!("{}.json", key));
                match fs::read_to_string(&path).await {
                    Ok(raw) => Ok(parse_stored(key, &raw)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The file backend writes a sibling temp file and renames it over the
    /// target so a crash never leaves a truncated document behind.
    pub async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        match self {
            KvStore::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO kv_store (key, value, updated_at)
                    VALUES ($1, $2, now())
                    ON CONFLICT (key)
                    DO UPDATE SET value = EXCLUDED.value, updated_at = now()
                    "#,
                )
                .bind(key)
                .bind(payload)
                .execute(pool)
                .await?;
                Ok(())
            }
            KvStore::File { dir } => {
                let path = dir.join(format!("{}.json", key));
                let tmp = dir.join(format!("{}.json.tmp", key));
                fs::write(&tmp, payload.as_bytes()).await?;
                fs::rename(&tmp, &path).await?;
                Ok(())
            }
        }
    }
}

fn parse_stored(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = key, error = %e, "Stored value failed to parse, treating as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::file(dir.path());

        let doc = json!({
            "100": {"balance": 80, "lang": "ar", "tags": ["a", "b"], "label": null},
            "200": {"balance": 0}
        });
        store.set("users", &doc).await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::file(dir.path());
        assert_eq!(store.get("users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), b"{truncated").unwrap();
        let store = KvStore::file(dir.path());
        assert_eq!(store.get("users").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::file(dir.path());
        store.set("settings", &json!({"a": "1"})).await.unwrap();
        store.set("settings", &json!({"b": "2"})).await.unwrap();
        assert_eq!(store.get("settings").await.unwrap(), Some(json!({"b": "2"})));
        // No temp file left behind
        assert!(!dir.path().join("settings.json.tmp").exists());
    }
}
