//! Configuration management module

pub mod settings;
pub mod validation;

pub use settings::{
    BotConfig, I18nConfig, LoggingConfig, Settings, StorageConfig, SubscriptionConfig,
};
pub use validation::validate_settings;
