//! Shared test fixtures
//!
//! Builds the full service stack over a temp-dir file store so tests run
//! without Postgres or a live Telegram connection.

use std::path::Path;

use teloxide::Bot;
use tempfile::TempDir;

use SignalPilot::config::Settings;
use SignalPilot::services::ServiceFactory;
use SignalPilot::storage::{DocumentStore, KvStore};

pub const ADMIN_ID: i64 = 42;
pub const USER_ID: i64 = 100;

pub struct TestContext {
    pub services: ServiceFactory,
    // Held so the storage directory outlives the test body
    dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = DocumentStore::new(KvStore::file(dir.path()));

        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings.bot.admin_ids = vec![ADMIN_ID];

        let bot = Bot::new(&settings.bot.token);
        let services = ServiceFactory::new(bot, settings, store);
        Self { services, dir }
    }

    /// Backing store directory, for tests that seed documents directly
    #[allow(dead_code)]
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }
}
