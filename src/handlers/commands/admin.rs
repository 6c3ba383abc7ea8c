//! Admin command handlers
//!
//! All replies here are plain English rather than localized: the admin
//! surface is operator tooling, not end-user UI. Non-admins get a short
//! permission-denied reply on explicit commands; admin-only callbacks are
//! dropped silently.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::info;

use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::I18n;
use crate::models::stats::TradeKind;
use crate::models::user::UserRole;
use crate::services::{AdjudicateOutcome, GrantOutcome, ServiceFactory};
use crate::state::{ConversationState, StateStorage};
use crate::utils::helpers::{parse_amount, parse_filter_arg, parse_user_id, split_arg};
use crate::utils::logging::log_admin_action;

/// Upper bound on keys per /genkeys call
const MAX_KEYS_PER_BATCH: usize = 50;

/// Resolve the caller; replies and yields `None` unless they are an admin
async fn admin_gate(
    bot: &Bot,
    services: &ServiceFactory,
    i18n: &I18n,
    msg: &Message,
) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(None);
    };
    let (user_id, user) = resolve_user(services, i18n, tg_user).await;
    if services.is_admin(user_id, &user) {
        Ok(Some(user_id))
    } else {
        bot.send_message(msg.chat.id, "⛔ Admins only.").await?;
        Ok(None)
    }
}

pub async fn handle_setdaily(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let text = args.trim();
    if text.is_empty() {
        state.set(admin_id, ConversationState::AwaitingDailyText).await;
        bot.send_message(msg.chat.id, "Send the new daily trade text.")
            .await?;
        return Ok(());
    }
    services.runtime_settings.set_daily_text(text).await;
    log_admin_action(admin_id, "setdaily", None);
    bot.send_message(msg.chat.id, "✅ Daily trade updated.").await?;
    Ok(())
}

/// Parse `<user_id> <amount>` or reply with the given usage line
async fn parse_id_amount(
    bot: &Bot,
    msg: &Message,
    args: &str,
    usage: &str,
) -> Result<Option<(i64, i64)>, Box<dyn std::error::Error + Send + Sync>> {
    let (id_arg, amount_arg) = split_arg(args);
    match (parse_user_id(id_arg), parse_amount(amount_arg)) {
        (Some(target), Some(amount)) => Ok(Some((target, amount))),
        _ => {
            bot.send_message(msg.chat.id, usage).await?;
            Ok(None)
        }
    }
}

pub async fn handle_addbalance(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let Some((target, amount)) =
        parse_id_amount(&bot, &msg, &args, "Usage: /addbalance <user_id> <amount>").await?
    else {
        return Ok(());
    };
    let balance = services.users.credit(target, amount).await;
    log_admin_action(admin_id, "addbalance", Some(target));
    bot.send_message(msg.chat.id, format!("✅ New balance for {}: {}$", target, balance))
        .await?;
    Ok(())
}

pub async fn handle_takebalance(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let Some((target, amount)) =
        parse_id_amount(&bot, &msg, &args, "Usage: /takebalance <user_id> <amount>").await?
    else {
        return Ok(());
    };
    let balance = services.users.take_balance(target, amount).await;
    log_admin_action(admin_id, "takebalance", Some(target));
    bot.send_message(msg.chat.id, format!("✅ New balance for {}: {}$", target, balance))
        .await?;
    Ok(())
}

pub async fn handle_setbalance(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    // Zero is a valid overwrite, so parse_amount is too strict here
    let (id_arg, amount_arg) = split_arg(&args);
    let parsed = (
        parse_user_id(id_arg),
        amount_arg.parse::<i64>().ok().filter(|a| *a >= 0),
    );
    let (Some(target), Some(amount)) = parsed else {
        bot.send_message(msg.chat.id, "Usage: /setbalance <user_id> <amount>")
            .await?;
        return Ok(());
    };
    let balance = services.users.set_balance(target, amount).await;
    log_admin_action(admin_id, "setbalance", Some(target));
    bot.send_message(msg.chat.id, format!("✅ New balance for {}: {}$", target, balance))
        .await?;
    Ok(())
}

pub async fn handle_genkeys(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let (plan, count_arg) = split_arg(&args);
    if plan.is_empty() {
        let plans = services.subscription.plan_names().join(", ");
        bot.send_message(
            msg.chat.id,
            format!("Usage: /genkeys <plan> [count]\nPlans: {}", plans),
        )
        .await?;
        return Ok(());
    }
    let count = if count_arg.is_empty() {
        1
    } else {
        match count_arg.parse::<usize>() {
            Ok(n) if (1..=MAX_KEYS_PER_BATCH).contains(&n) => n,
            _ => {
                bot.send_message(
                    msg.chat.id,
                    format!("Count must be between 1 and {}.", MAX_KEYS_PER_BATCH),
                )
                .await?;
                return Ok(());
            }
        }
    };

    match services.subscription.generate_keys(plan, count).await {
        Some(keys) => {
            log_admin_action(admin_id, "genkeys", None);
            bot.send_message(
                msg.chat.id,
                format!("🔑 Generated {} key(s):\n{}", keys.len(), keys.join("\n")),
            )
            .await?;
        }
        None => {
            let plans = services.subscription.plan_names().join(", ");
            bot.send_message(msg.chat.id, format!("Unknown plan. Plans: {}", plans))
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_delkey(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let value = args.trim();
    if value.is_empty() {
        // Bare /delkey doubles as the unused-key inventory
        let unused = services.subscription.unused_keys().await;
        let body = if unused.is_empty() {
            "No unused keys.".to_string()
        } else {
            unused
                .iter()
                .map(|(value, key)| format!("{} ({})", value, key.plan))
                .collect::<Vec<_>>()
                .join("\n")
        };
        bot.send_message(
            msg.chat.id,
            format!("Usage: /delkey <key>\n🔑 Unused keys:\n{}", body),
        )
        .await?;
        return Ok(());
    }
    let reply = if services.subscription.delete_key(value).await {
        log_admin_action(admin_id, "delkey", None);
        "✅ Key deleted."
    } else {
        "Key not found."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_grantsub(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let (id_arg, mode) = split_arg(&args);
    let (Some(target), mode) = (parse_user_id(id_arg), mode) else {
        bot.send_message(msg.chat.id, "Usage: /grantsub <user_id> <plan | +days>")
            .await?;
        return Ok(());
    };
    if mode.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /grantsub <user_id> <plan | +days>")
            .await?;
        return Ok(());
    }

    match services.subscription.grant(target, mode).await {
        GrantOutcome::Granted(subscription) => {
            log_admin_action(admin_id, "grantsub", Some(target));
            let until = subscription
                .expire_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "forever".to_string());
            bot.send_message(
                msg.chat.id,
                format!("✅ Subscription '{}' for {} until {}.", subscription.plan, target, until),
            )
            .await?;
        }
        GrantOutcome::UnknownPlan(plan) => {
            let plans = services.subscription.plan_names().join(", ");
            bot.send_message(
                msg.chat.id,
                format!("Unknown plan '{}'. Plans: {} (or +days).", plan, plans),
            )
            .await?;
        }
        GrantOutcome::InvalidMode(mode) => {
            bot.send_message(msg.chat.id, format!("Invalid mode '{}'.", mode))
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_revokesub(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let Some(target) = parse_user_id(args.trim()) else {
        bot.send_message(msg.chat.id, "Usage: /revokesub <user_id>").await?;
        return Ok(());
    };
    let reply = if services.subscription.revoke(target).await {
        log_admin_action(admin_id, "revokesub", Some(target));
        format!("✅ Subscription revoked for {}.", target)
    } else {
        format!("No subscription on {}.", target)
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_setlabel(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let (id_arg, label) = split_arg(&args);
    let Some(target) = parse_user_id(id_arg) else {
        bot.send_message(msg.chat.id, "Usage: /setlabel <user_id> [label]")
            .await?;
        return Ok(());
    };
    if label.is_empty() {
        state
            .set(admin_id, ConversationState::AwaitingLabel { target })
            .await;
        bot.send_message(msg.chat.id, format!("Send the new label for {}.", target))
            .await?;
        return Ok(());
    }
    let reply = if services.users.set_label(target, Some(label.to_string())).await {
        log_admin_action(admin_id, "setlabel", Some(target));
        format!("✅ Label set for {}.", target)
    } else {
        format!("Unknown user {}.", target)
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_setcountry(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let (id_arg, country) = split_arg(&args);
    let Some(target) = parse_user_id(id_arg) else {
        bot.send_message(msg.chat.id, "Usage: /setcountry <user_id> [country]")
            .await?;
        return Ok(());
    };
    if country.is_empty() {
        state
            .set(admin_id, ConversationState::AwaitingCountry { target })
            .await;
        bot.send_message(msg.chat.id, format!("Send the new country for {}.", target))
            .await?;
        return Ok(());
    }
    let reply = if services.users.set_country(target, Some(country.to_string())).await {
        log_admin_action(admin_id, "setcountry", Some(target));
        format!("✅ Country set for {}.", target)
    } else {
        format!("Unknown user {}.", target)
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn record_trade(
    bot: Bot,
    msg: Message,
    args: String,
    kind: TradeKind,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let usage = match kind {
        TradeKind::Win => "Usage: /win <user_id> <amount> [note]",
        TradeKind::Loss => "Usage: /loss <user_id> <amount> [note]",
    };
    let (id_arg, rest) = split_arg(&args);
    let (amount_arg, note) = split_arg(rest);
    let (Some(target), Some(amount)) = (parse_user_id(id_arg), parse_amount(amount_arg)) else {
        bot.send_message(msg.chat.id, usage).await?;
        return Ok(());
    };
    let note = (!note.is_empty()).then(|| note.to_string());
    services.stats.record(target, kind, amount, note).await;
    log_admin_action(admin_id, "record_trade", Some(target));

    let marker = match kind {
        TradeKind::Win => "📈 Win",
        TradeKind::Loss => "📉 Loss",
    };
    bot.send_message(msg.chat.id, format!("✅ {} of {}$ recorded for {}.", marker, amount, target))
        .await?;
    Ok(())
}

pub async fn handle_win(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    record_trade(bot, msg, args, TradeKind::Win, services, i18n).await
}

pub async fn handle_loss(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    record_trade(bot, msg, args, TradeKind::Loss, services, i18n).await
}

/// List pending requests (optionally one user's) with approve/deny buttons
pub async fn handle_pending(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    if admin_gate(&bot, &services, &i18n, &msg).await?.is_none() {
        return Ok(());
    }
    let Some(filter) = parse_filter_arg(&args) else {
        bot.send_message(msg.chat.id, "Usage: /pending [user_id]").await?;
        return Ok(());
    };
    let pending = services.withdrawal.list_pending(filter).await;
    if pending.is_empty() {
        bot.send_message(msg.chat.id, "No pending withdrawal requests.")
            .await?;
        return Ok(());
    }

    let mut lines = vec![format!("💼 {} pending request(s):", pending.len())];
    let mut rows = Vec::new();
    for (id, request) in &pending {
        lines.push(format!(
            "#{} — user {} — {}$ — {}",
            id,
            request.user_id,
            request.amount,
            request.created_at.format("%Y-%m-%d %H:%M")
        ));
        rows.push(vec![
            InlineKeyboardButton::callback(format!("✅ #{}", id), format!("admin:wapprove:{}", id)),
            InlineKeyboardButton::callback(format!("❌ #{}", id), format!("admin:wdeny:{}", id)),
        ]);
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

pub async fn handle_broadcast(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let text = args.trim();
    if text.is_empty() {
        state.set(admin_id, ConversationState::AwaitingBroadcast).await;
        bot.send_message(msg.chat.id, "Send the broadcast message.").await?;
        return Ok(());
    }
    run_broadcast(&bot, msg.chat.id, admin_id, text, &services).await
}

pub async fn run_broadcast(
    bot: &Bot,
    chat_id: ChatId,
    admin_id: i64,
    text: &str,
    services: &ServiceFactory,
) -> HandlerResult {
    let ids = services.users.all_ids().await;
    let (sent, failed) = services.notifications.broadcast(&ids, text).await;
    log_admin_action(admin_id, "broadcast", None);
    bot.send_message(chat_id, format!("📣 Broadcast sent to {} user(s), {} failed.", sent, failed))
        .await?;
    Ok(())
}

/// Runtime settings: `/setconfig` lists, `/setconfig <key> <value>` writes
pub async fn handle_setconfig(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let (key, value) = split_arg(&args);
    if key.is_empty() {
        let all = services.runtime_settings.all().await;
        let mut lines: Vec<String> = all.iter().map(|(k, v)| format!("{} = {}", k, v)).collect();
        lines.sort();
        let body = if lines.is_empty() {
            "No runtime settings.".to_string()
        } else {
            lines.join("\n")
        };
        bot.send_message(msg.chat.id, format!("⚙️ Runtime settings:\n{}", body))
            .await?;
        return Ok(());
    }
    if value.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /setconfig <key> <value>").await?;
        return Ok(());
    }
    services.runtime_settings.set_value(key, value).await;
    log_admin_action(admin_id, "setconfig", None);
    bot.send_message(msg.chat.id, format!("✅ {} updated.", key.to_lowercase()))
        .await?;
    Ok(())
}

async fn change_role(
    bot: Bot,
    msg: Message,
    args: String,
    role: UserRole,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let usage = match role {
        UserRole::Admin => "Usage: /promote <user_id>",
        UserRole::User => "Usage: /demote <user_id>",
    };
    let Some(target) = parse_user_id(args.trim()) else {
        bot.send_message(msg.chat.id, usage).await?;
        return Ok(());
    };
    let role_name = match role {
        UserRole::Admin => "admin",
        UserRole::User => "user",
    };
    let reply = if services.users.set_role(target, role).await {
        info!(admin_id = admin_id, target = target, role = role_name, "Role changed");
        format!("✅ Role of {} is now {}.", target, role_name)
    } else {
        format!("Unknown user {}.", target)
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_promote(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    change_role(bot, msg, args, UserRole::Admin, services, i18n).await
}

pub async fn handle_demote(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    change_role(bot, msg, args, UserRole::User, services, i18n).await
}

pub async fn handle_users(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    if admin_gate(&bot, &services, &i18n, &msg).await?.is_none() {
        return Ok(());
    }
    let count = services.users.count().await;
    bot.send_message(msg.chat.id, format!("👥 {} registered user(s).", count))
        .await?;
    Ok(())
}

pub async fn handle_export(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(admin_id) = admin_gate(&bot, &services, &i18n, &msg).await? else {
        return Ok(());
    };
    let bytes = services.users.export().await;
    log_admin_action(admin_id, "export", None);
    services
        .notifications
        .send_document(msg.chat.id.0, "users.json", bytes)
        .await;
    Ok(())
}

/// Adjudicate from a /pending button press; the user is notified best-effort
pub async fn adjudicate_withdrawal(
    bot: &Bot,
    chat_id: ChatId,
    admin_id: i64,
    request_id: &str,
    approve: bool,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let outcome = if approve {
        services.withdrawal.approve(request_id).await
    } else {
        services.withdrawal.deny(request_id).await
    };

    match outcome {
        AdjudicateOutcome::Done { user_id, amount } => {
            let action = if approve { "wapprove" } else { "wdeny" };
            log_admin_action(admin_id, action, Some(user_id));

            let user_lang = services
                .users
                .get(user_id)
                .await
                .map(|u| u.lang)
                .unwrap_or_else(|| i18n.default_language().to_string());
            let key = if approve { "withdraw.approved" } else { "withdraw.denied" };
            let mut params = crate::i18n::TranslationParams::new();
            params.insert("req_id".to_string(), request_id.to_string());
            params.insert("amount".to_string(), amount.to_string());
            services
                .notifications
                .notify(user_id, &i18n.t(key, &user_lang, Some(&params)))
                .await;

            let verb = if approve { "approved" } else { "denied" };
            bot.send_message(chat_id, format!("✅ Request #{} {}.", request_id, verb))
                .await?;
        }
        AdjudicateOutcome::Rejected => {
            bot.send_message(chat_id, format!("Request #{} is not pending.", request_id))
                .await?;
        }
    }
    Ok(())
}
