//! Configuration validation
//!
//! Startup-time checks for the loaded settings. The process refuses to start
//! on a missing bot token or an inconsistent language/plan table.

use url::Url;

use super::Settings;
use crate::utils::errors::SignalPilotError;

/// Validate the complete settings tree
pub fn validate_settings(settings: &Settings) -> Result<(), SignalPilotError> {
    validate_bot(settings)?;
    validate_i18n(settings)?;
    validate_subscription(settings)?;
    Ok(())
}

fn validate_bot(settings: &Settings) -> Result<(), SignalPilotError> {
    if settings.bot.token.trim().is_empty() {
        return Err(SignalPilotError::Config(
            "bot token is not set (BOT_TOKEN or SIGNALPILOT_BOT__TOKEN)".to_string(),
        ));
    }

    if let Some(url) = &settings.bot.webhook_url {
        let parsed = Url::parse(url)
            .map_err(|e| SignalPilotError::Config(format!("invalid webhook_url: {}", e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(SignalPilotError::Config(format!(
                "webhook_url must be http(s), got {}",
                parsed.scheme()
            )));
        }
    }

    if settings.bot.admin_ids.is_empty() {
        tracing::warn!("No admin ids configured; admin commands will be unavailable");
    }

    Ok(())
}

fn validate_i18n(settings: &Settings) -> Result<(), SignalPilotError> {
    if !settings
        .i18n
        .supported_languages
        .contains(&settings.i18n.default_language)
    {
        return Err(SignalPilotError::Config(format!(
            "default language '{}' is not in supported_languages",
            settings.i18n.default_language
        )));
    }
    Ok(())
}

fn validate_subscription(settings: &Settings) -> Result<(), SignalPilotError> {
    for plan in settings.subscription.plans.keys() {
        if plan.is_empty() || !plan.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SignalPilotError::Config(format!(
                "subscription plan name '{}' must be non-empty alphanumeric",
                plan
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123456:TEST".to_string();
        settings.bot.admin_ids = vec![1262317603];
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_webhook_url_rejected() {
        let mut settings = valid_settings();
        settings.bot.webhook_url = Some("not a url".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_unknown_default_language_rejected() {
        let mut settings = valid_settings();
        settings.i18n.default_language = "de".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_plan_name_rejected() {
        let mut settings = valid_settings();
        settings.subscription.plans.insert("bad plan".to_string(), 5);
        assert!(validate_settings(&settings).is_err());
    }
}
