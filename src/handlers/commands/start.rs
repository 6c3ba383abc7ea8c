//! /start, /help, /id and the main menu

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::info;

use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::{I18n, TranslationParams};
use crate::services::ServiceFactory;

/// Runtime settings key for the optional website button
const WEBSITE_URL_KEY: &str = "website_url";

pub async fn handle_start(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;
    info!(user_id = user_id, "Start command");
    send_main_menu(&bot, msg.chat.id, user_id, user.balance, &user.lang, &services, &i18n).await
}

/// Welcome text plus the inline main menu
pub async fn send_main_menu(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    balance: i64,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let mut params = TranslationParams::new();
    params.insert("uid".to_string(), user_id.to_string());
    params.insert("balance".to_string(), balance.to_string());
    let text = i18n.t("menu.welcome", lang, Some(&params));

    let mut rows = vec![
        vec![
            InlineKeyboardButton::callback(i18n.t("menu.daily", lang, None), "menu:daily"),
            InlineKeyboardButton::callback(i18n.t("menu.withdraw", lang, None), "menu:withdraw"),
        ],
        vec![
            InlineKeyboardButton::callback(i18n.t("menu.status", lang, None), "menu:wstatus"),
            InlineKeyboardButton::callback(i18n.t("menu.stats", lang, None), "menu:stats"),
        ],
        vec![
            InlineKeyboardButton::callback(i18n.t("menu.sub", lang, None), "menu:sub"),
            InlineKeyboardButton::callback(i18n.t("menu.lang", lang, None), "menu:lang"),
        ],
    ];
    if let Some(url) = services.runtime_settings.get_value(WEBSITE_URL_KEY).await {
        if let Ok(url) = url.parse::<url::Url>() {
            rows.push(vec![InlineKeyboardButton::url(
                i18n.t("menu.website", lang, None),
                url,
            )]);
        }
    }

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

pub async fn handle_help(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (_, user) = resolve_user(&services, &i18n, tg_user).await;
    bot.send_message(msg.chat.id, i18n.t("help.text", &user.lang, None))
        .await?;
    Ok(())
}

pub async fn handle_id(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;
    let mut params = TranslationParams::new();
    params.insert("uid".to_string(), user_id.to_string());
    bot.send_message(msg.chat.id, i18n.t("id.reply", &user.lang, Some(&params)))
        .await?;
    Ok(())
}

pub async fn handle_lang(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (_, user) = resolve_user(&services, &i18n, tg_user).await;
    send_language_menu(&bot, msg.chat.id, &user.lang, &i18n).await
}

/// One button per supported language
pub async fn send_language_menu(
    bot: &Bot,
    chat_id: ChatId,
    lang: &str,
    i18n: &I18n,
) -> HandlerResult {
    let rows: Vec<Vec<InlineKeyboardButton>> = i18n
        .supported_languages()
        .iter()
        .map(|code| {
            vec![InlineKeyboardButton::callback(
                language_name(code),
                format!("lang:{}", code),
            )]
        })
        .collect();

    bot.send_message(chat_id, i18n.t("lang.choose", lang, None))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

fn language_name(code: &str) -> String {
    match code {
        "ar" => "العربية 🇸🇦",
        "en" => "English 🇬🇧",
        "tr" => "Türkçe 🇹🇷",
        "es" => "Español 🇪🇸",
        "fr" => "Français 🇫🇷",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names_cover_supported_set() {
        for code in ["ar", "en", "tr", "es", "fr"] {
            assert_ne!(language_name(code), code);
        }
        assert_eq!(language_name("de"), "de");
    }
}
