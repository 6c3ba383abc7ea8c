//! Translation loader and lookup
//!
//! Loads one JSON file per supported language at startup and resolves
//! dotted keys with `{param}` substitution. Missing keys fall back to the
//! default language, then to the key itself so a gap never panics a
//! handler.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{Result, SignalPilotError};

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct I18n {
    translations: HashMap<String, Map<String, Value>>,
    default_language: String,
    supported_languages: Vec<String>,
    translations_dir: String,
}

impl I18n {
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: config.translations_dir.clone(),
        }
    }

    /// Load all translation files.
    ///
    /// A missing or broken file for the default language is fatal; for any
    /// other language it is logged and skipped.
    pub async fn load_translations(&mut self) -> Result<()> {
        let dir = Path::new(&self.translations_dir).to_path_buf();
        for lang in self.supported_languages.clone() {
            let path = dir.join(format!("{}.json", lang));
            match self.load_language_file(&path, &lang).await {
                Ok(count) => info!(lang = %lang, keys = count, "Loaded translations"),
                Err(e) if lang == self.default_language => {
                    return Err(SignalPilotError::Config(format!(
                        "default language '{}' translations unavailable: {}",
                        lang, e
                    )));
                }
                Err(e) => warn!(lang = %lang, error = %e, "Skipping translations"),
            }
        }
        Ok(())
    }

    async fn load_language_file(&mut self, path: &Path, lang: &str) -> Result<usize> {
        let content = fs::read_to_string(path).await?;
        match serde_json::from_str(&content)? {
            Value::Object(map) => {
                let count = map.len();
                self.translations.insert(lang.to_string(), map);
                Ok(count)
            }
            _ => Err(SignalPilotError::Config(format!(
                "translation file for '{}' is not a JSON object",
                lang
            ))),
        }
    }

    /// Get a translated message with optional `{param}` substitution
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let lang = self.effective_language(lang);
        let template = self
            .lookup(key, &lang)
            .or_else(|| {
                if lang != self.default_language {
                    self.lookup(key, &self.default_language)
                } else {
                    None
                }
            })
            .unwrap_or_else(|| {
                warn!(key = key, "Translation key not found in any language");
                key.to_string()
            });
        format_message(&template, params)
    }

    /// Resolve a dotted key (`withdraw.created`) to a string leaf
    fn lookup(&self, key: &str, lang: &str) -> Option<String> {
        let translations = self.translations.get(lang)?;
        let mut parts = key.split('.');
        let mut current = translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        current.as_str().map(str::to_string)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    fn effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Map a Telegram language code (e.g. `en-US`) onto a supported
    /// language, falling back to the default
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        if let Some(lang) = telegram_lang {
            let code = lang.split('-').next().unwrap_or(lang);
            if self.is_language_supported(code) {
                return code.to_string();
            }
        }
        self.default_language.clone()
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

fn format_message(template: &str, params: Option<&TranslationParams>) -> String {
    match params {
        Some(params) => {
            let mut result = template.to_string();
            for (key, value) in params {
                result = result.replace(&format!("{{{}}}", key), value);
            }
            result
        }
        None => template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_i18n() -> I18n {
        let config = I18nConfig {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string(), "ar".to_string()],
            translations_dir: "translations".to_string(),
        };
        let mut i18n = I18n::new(&config);
        let en = json!({
            "welcome": "Balance: {balance}$",
            "withdraw": { "created": "Request #{req_id} created" }
        });
        let ar = json!({
            "welcome": "رصيدك: {balance}$"
        });
        i18n.translations
            .insert("en".to_string(), en.as_object().unwrap().clone());
        i18n.translations
            .insert("ar".to_string(), ar.as_object().unwrap().clone());
        i18n
    }

    #[test]
    fn test_nested_lookup_and_params() {
        let i18n = test_i18n();
        let mut params = TranslationParams::new();
        params.insert("req_id".to_string(), "7".to_string());
        assert_eq!(
            i18n.t("withdraw.created", "en", Some(&params)),
            "Request #7 created"
        );
    }

    #[test]
    fn test_fallback_to_default_language() {
        let i18n = test_i18n();
        // "withdraw.created" only exists in the default language
        assert_eq!(
            i18n.t("withdraw.created", "ar", None),
            "Request #{req_id} created"
        );
        // Completely unknown key falls back to the key itself
        assert_eq!(i18n.t("nope.missing", "ar", None), "nope.missing");
    }

    #[test]
    fn test_language_detection() {
        let i18n = test_i18n();
        assert_eq!(i18n.detect_user_language(Some("en-US")), "en");
        assert_eq!(i18n.detect_user_language(Some("ar")), "ar");
        assert_eq!(i18n.detect_user_language(Some("de")), "en");
        assert_eq!(i18n.detect_user_language(None), "en");
    }
}
