//! Balance, daily trade and withdrawal commands

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::{I18n, TranslationParams};
use crate::models::stats::TradeKind;
use crate::services::{ServiceFactory, WithdrawOutcome};
use crate::state::{ConversationState, StateStorage};
use crate::utils::helpers::parse_amount;

/// Preset amounts offered in the withdraw menu
const WITHDRAW_PRESETS: [i64; 5] = [10, 20, 30, 50, 100];

pub async fn handle_balance(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (_, user) = resolve_user(&services, &i18n, tg_user).await;
    let mut params = TranslationParams::new();
    params.insert("balance".to_string(), user.balance.to_string());
    bot.send_message(msg.chat.id, i18n.t("balance.reply", &user.lang, Some(&params)))
        .await?;
    Ok(())
}

pub async fn handle_daily(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (_, user) = resolve_user(&services, &i18n, tg_user).await;
    send_daily(&bot, msg.chat.id, &user.lang, &services, &i18n).await
}

/// Current daily trade text, or the localized "nothing yet" line
pub async fn send_daily(
    bot: &Bot,
    chat_id: ChatId,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let daily = services.runtime_settings.daily_text().await;
    let text = if daily.is_empty() {
        i18n.t("daily.none", lang, None)
    } else {
        daily
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

/// `/withdraw` opens the preset menu, `/withdraw <amount>` creates directly
pub async fn handle_withdraw(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;

    let args = args.trim();
    if args.is_empty() {
        return send_withdraw_menu(&bot, msg.chat.id, &user.lang, &i18n).await;
    }
    let Some(amount) = parse_amount(args) else {
        bot.send_message(msg.chat.id, i18n.t("withdraw.invalid", &user.lang, None))
            .await?;
        return Ok(());
    };
    create_withdraw_request(&bot, msg.chat.id, user_id, amount, &user.lang, &services, &i18n).await
}

pub async fn send_withdraw_menu(
    bot: &Bot,
    chat_id: ChatId,
    lang: &str,
    i18n: &I18n,
) -> HandlerResult {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = WITHDRAW_PRESETS
        .iter()
        .map(|amount| {
            vec![InlineKeyboardButton::callback(
                format!("{}$", amount),
                format!("withdraw:{}", amount),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        i18n.t("withdraw.custom", lang, None),
        "withdraw:custom",
    )]);
    rows.push(vec![InlineKeyboardButton::callback("🔙", "menu:main")]);

    bot.send_message(chat_id, i18n.t("withdraw.choose_amount", lang, None))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Create a pending request and notify the configured admins about it
pub async fn create_withdraw_request(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    amount: i64,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    match services.withdrawal.request(user_id, amount).await {
        WithdrawOutcome::Created { id, amount } => {
            let mut params = TranslationParams::new();
            params.insert("req_id".to_string(), id.clone());
            params.insert("amount".to_string(), amount.to_string());
            bot.send_message(chat_id, i18n.t("withdraw.created", lang, Some(&params)))
                .await?;
            notify_admins_of_request(services, &id, user_id, amount).await;
        }
        WithdrawOutcome::InvalidAmount => {
            bot.send_message(chat_id, i18n.t("withdraw.invalid", lang, None))
                .await?;
        }
        WithdrawOutcome::InsufficientBalance { balance } => {
            let mut params = TranslationParams::new();
            params.insert("bal".to_string(), balance.to_string());
            bot.send_message(chat_id, i18n.t("withdraw.insufficient", lang, Some(&params)))
                .await?;
        }
    }
    Ok(())
}

/// Best-effort heads-up to every configured admin; adjudication itself goes
/// through /pending
async fn notify_admins_of_request(services: &ServiceFactory, id: &str, user_id: i64, amount: i64) {
    let text = format!(
        "🆕 Withdrawal #{} from {} for {}$. Review with /pending.",
        id, user_id, amount
    );
    for &admin_id in &services.settings.bot.admin_ids {
        services.notifications.notify(admin_id, &text).await;
    }
}

/// Pending requests of this user, each with a cancel button
pub async fn send_withdraw_status(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let pending = services.withdrawal.list_pending(Some(user_id)).await;

    let mut rows: Vec<Vec<InlineKeyboardButton>> = pending
        .iter()
        .map(|(id, request)| {
            vec![InlineKeyboardButton::callback(
                format!("❌ #{} — {}$", id, request.amount),
                format!("wcancel:{}", id),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("🔙", "menu:main")]);

    let text = if pending.is_empty() {
        i18n.t("withdraw.none_pending", lang, None)
    } else {
        i18n.t("withdraw.pending_header", lang, None)
    };
    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Win/loss totals plus the most recent history entries
pub async fn send_stats(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let stats = services.stats.get(user_id).await;

    let mut params = TranslationParams::new();
    params.insert("win".to_string(), stats.total_win.to_string());
    params.insert("loss".to_string(), stats.total_loss.to_string());
    let mut lines = vec![i18n.t("stats.summary", lang, Some(&params))];

    for entry in stats.history.iter().take(5) {
        let marker = match entry.kind {
            TradeKind::Win => "📈",
            TradeKind::Loss => "📉",
        };
        let note = entry.note.as_deref().unwrap_or("");
        lines.push(format!(
            "{} {}$ {} ({})",
            marker,
            entry.amount,
            note,
            entry.at.format("%Y-%m-%d")
        ));
    }

    bot.send_message(chat_id, lines.join("\n")).await?;
    Ok(())
}

/// Ask for a free-form amount, armed through the conversation slot
pub async fn prompt_custom_withdraw(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &str,
    state: &StateStorage,
    i18n: &I18n,
) -> HandlerResult {
    state.set(user_id, ConversationState::AwaitingCustomWithdraw).await;
    bot.send_message(chat_id, i18n.t("withdraw.custom_prompt", lang, None))
        .await?;
    Ok(())
}
