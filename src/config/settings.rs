//! Application settings management
//!
//! This module defines the configuration structure and provides methods for
//! loading settings from an optional TOML file and environment variables.
//!
//! The well-known deployment variables `BOT_TOKEN`, `ADMIN_ID`,
//! `DATABASE_URL`, `WEBHOOK_URL` and `PORT` are recognized directly in
//! addition to the `SIGNALPILOT_`-prefixed form, so the bot can run on a
//! plain hosting environment without a config file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub subscription: SubscriptionConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    /// Public base URL for webhook mode; absence selects long polling.
    pub webhook_url: Option<String>,
    /// Listen port for the webhook server.
    pub port: u16,
    /// Telegram user ids that get the admin role on first contact.
    pub admin_ids: Vec<i64>,
}

/// Storage backend configuration
///
/// A present `database_url` selects the relational backend; otherwise
/// documents are stored as JSON files under `data_dir`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: Option<String>,
    pub data_dir: String,
}

/// Subscription plan table: plan name to duration in days.
///
/// A duration of `0` means the plan never expires.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub plans: HashMap<String, u32>,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub translations_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            webhook_url: None,
            port: 8080,
            admin_ids: vec![],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        let mut plans = HashMap::new();
        plans.insert("weekly".to_string(), 7);
        plans.insert("monthly".to_string(), 30);
        plans.insert("quarterly".to_string(), 90);
        plans.insert("lifetime".to_string(), 0);
        Self { plans }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "ar".to_string(),
            supported_languages: vec![
                "ar".to_string(),
                "en".to_string(),
                "tr".to_string(),
                "es".to_string(),
                "fr".to_string(),
            ],
            translations_dir: "translations".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "./logs".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("SIGNALPILOT").separator("__"))
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        settings.apply_plain_env();
        Ok(settings)
    }

    /// Overlay the bare deployment variables used by most bot hosts.
    fn apply_plain_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if !token.trim().is_empty() {
                self.bot.token = token.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.bot.webhook_url = Some(url.trim().trim_end_matches('/').to_string());
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.trim().parse() {
                self.bot.port = port;
            }
        }
        if let Ok(ids) = std::env::var("ADMIN_ID") {
            let parsed: Vec<i64> = ids
                .split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect();
            if !parsed.is_empty() {
                self.bot.admin_ids = parsed;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.storage.database_url = Some(url.trim().to_string());
            }
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SignalPilotError> {
        super::validation::validate_settings(self)
    }

    /// Check whether a user id is on the configured admin allow-list
    pub fn is_configured_admin(&self, user_id: i64) -> bool {
        self.bot.admin_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bot.port, 8080);
        assert_eq!(settings.i18n.default_language, "ar");
        assert_eq!(settings.subscription.plans.get("monthly"), Some(&30));
        assert_eq!(settings.subscription.plans.get("lifetime"), Some(&0));
        assert!(settings.storage.database_url.is_none());
    }

    #[test]
    fn test_configured_admin() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![100, 200];
        assert!(settings.is_configured_admin(100));
        assert!(!settings.is_configured_admin(300));
    }
}
