//! Callback query handlers
//!
//! Payloads are colon-separated: `menu:<page>`, `lang:<code>`,
//! `withdraw:<amount|custom>`, `wcancel:<id>` and `admin:<verb>:<id>`.
//! Every query is answered first so the client spinner always stops, then
//! routed; unknown payloads are logged and dropped.

use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::handlers::commands::{admin, start, subscription, wallet};
use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::{I18n, TranslationParams};
use crate::services::{CancelOutcome, ServiceFactory};
use crate::state::StateStorage;
use crate::utils::helpers::parse_amount;
use crate::utils::logging::log_user_action;

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    // Best-effort: a stale or expired query id must not abort the routing
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, &query.from).await;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));
    debug!(user_id = user_id, data = data, "Callback query");

    let mut parts = data.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("menu"), Some(page), None) => {
            route_menu(&bot, chat_id, user_id, user.balance, &user.lang, page, &services, &state, &i18n)
                .await
        }
        (Some("lang"), Some(code), None) => {
            set_language(&bot, chat_id, user_id, code, &services, &i18n).await
        }
        (Some("withdraw"), Some("custom"), None) => {
            wallet::prompt_custom_withdraw(&bot, chat_id, user_id, &user.lang, &state, &i18n).await
        }
        (Some("withdraw"), Some(amount), None) => {
            let Some(amount) = parse_amount(amount) else {
                return Ok(());
            };
            wallet::create_withdraw_request(&bot, chat_id, user_id, amount, &user.lang, &services, &i18n)
                .await
        }
        (Some("wcancel"), Some(request_id), None) => {
            cancel_withdrawal(&bot, chat_id, user_id, request_id, &user.lang, &services, &i18n).await
        }
        (Some("admin"), Some(verb @ ("wapprove" | "wdeny")), Some(request_id)) => {
            // Buttons outlive admin sessions, so the gate is re-checked here
            if !services.is_admin(user_id, &user) {
                return Ok(());
            }
            admin::adjudicate_withdrawal(
                &bot,
                chat_id,
                user_id,
                request_id,
                verb == "wapprove",
                &services,
                &i18n,
            )
            .await
        }
        _ => {
            warn!(user_id = user_id, data = data, "Unknown callback payload");
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn route_menu(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    balance: i64,
    lang: &str,
    page: &str,
    services: &ServiceFactory,
    state: &StateStorage,
    i18n: &I18n,
) -> HandlerResult {
    match page {
        "main" => {
            // Navigating away abandons any half-finished prompt
            state.clear(user_id).await;
            start::send_main_menu(bot, chat_id, user_id, balance, lang, services, i18n).await
        }
        "daily" => wallet::send_daily(bot, chat_id, lang, services, i18n).await,
        "withdraw" => wallet::send_withdraw_menu(bot, chat_id, lang, i18n).await,
        "wstatus" => {
            wallet::send_withdraw_status(bot, chat_id, user_id, lang, services, i18n).await
        }
        "stats" => wallet::send_stats(bot, chat_id, user_id, lang, services, i18n).await,
        "sub" => subscription::send_sub_status(bot, chat_id, user_id, lang, services, i18n).await,
        "lang" => start::send_language_menu(bot, chat_id, lang, i18n).await,
        other => {
            warn!(user_id = user_id, page = other, "Unknown menu page");
            Ok(())
        }
    }
}

async fn set_language(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    code: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    if !i18n.is_language_supported(code) {
        warn!(user_id = user_id, code = code, "Unsupported language requested");
        return Ok(());
    }
    services.users.set_lang(user_id, code).await;
    log_user_action(user_id, "set_lang", Some(code));
    bot.send_message(chat_id, i18n.t("lang.saved", code, None))
        .await?;

    let balance = services.users.get_balance(user_id).await;
    start::send_main_menu(bot, chat_id, user_id, balance, code, services, i18n).await
}

async fn cancel_withdrawal(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    request_id: &str,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    match services.withdrawal.cancel(request_id, user_id).await {
        CancelOutcome::Canceled { amount } => {
            let mut params = TranslationParams::new();
            params.insert("req_id".to_string(), request_id.to_string());
            params.insert("amount".to_string(), amount.to_string());
            bot.send_message(chat_id, i18n.t("withdraw.canceled", lang, Some(&params)))
                .await?;
        }
        CancelOutcome::Rejected => {
            bot.send_message(chat_id, i18n.t("withdraw.cancel_rejected", lang, None))
                .await?;
        }
    }
    Ok(())
}
