//! SignalPilot Telegram Bot
//!
//! A Telegram bot for a trading-signal service: implicit user registration,
//! balances with admin-adjudicated withdrawals, redemption-key
//! subscriptions, a daily trade tip and multi-language support, persisted
//! as JSON documents over Postgres or flat files.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SignalPilotError};

// Re-export main components for easy access
pub use i18n::I18n;
pub use services::ServiceFactory;
pub use state::StateStorage;
pub use storage::{DocumentStore, KvStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
