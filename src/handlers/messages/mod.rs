//! Plain-text message handler
//!
//! A plain message only means something when the sender has an armed
//! conversation slot; the slot is consumed exactly once, before acting on
//! it. Messages with no armed slot get a short hint pointing at /start.

use teloxide::prelude::*;

use crate::handlers::commands::{admin, subscription, wallet};
use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::I18n;
use crate::services::ServiceFactory;
use crate::state::{ConversationState, StateStorage};
use crate::utils::helpers::parse_amount;
use crate::utils::logging::log_admin_action;

pub async fn handle_message(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    // Group chatter and non-text payloads are none of our business
    if !msg.chat.id.is_user() {
        return Ok(());
    }
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;

    let Some(slot) = state.take(user_id).await else {
        // Unparsed slash input falls through here; stay quiet on it
        if !text.starts_with('/') {
            bot.send_message(msg.chat.id, i18n.t("help.hint", &user.lang, None))
                .await?;
        }
        return Ok(());
    };

    match slot {
        ConversationState::AwaitingKey => {
            subscription::activate_key(&bot, msg.chat.id, user_id, text, &user.lang, &services, &i18n)
                .await
        }
        ConversationState::AwaitingCustomWithdraw => {
            let Some(amount) = parse_amount(text) else {
                bot.send_message(msg.chat.id, i18n.t("withdraw.invalid", &user.lang, None))
                    .await?;
                return Ok(());
            };
            wallet::create_withdraw_request(
                &bot,
                msg.chat.id,
                user_id,
                amount,
                &user.lang,
                &services,
                &i18n,
            )
            .await
        }
        ConversationState::AwaitingLabel { target } => {
            if !services.is_admin(user_id, &user) {
                return Ok(());
            }
            let reply = if services.users.set_label(target, Some(text.to_string())).await {
                log_admin_action(user_id, "setlabel", Some(target));
                format!("✅ Label set for {}.", target)
            } else {
                format!("Unknown user {}.", target)
            };
            bot.send_message(msg.chat.id, reply).await?;
            Ok(())
        }
        ConversationState::AwaitingCountry { target } => {
            if !services.is_admin(user_id, &user) {
                return Ok(());
            }
            let reply = if services.users.set_country(target, Some(text.to_string())).await {
                log_admin_action(user_id, "setcountry", Some(target));
                format!("✅ Country set for {}.", target)
            } else {
                format!("Unknown user {}.", target)
            };
            bot.send_message(msg.chat.id, reply).await?;
            Ok(())
        }
        ConversationState::AwaitingBroadcast => {
            if !services.is_admin(user_id, &user) {
                return Ok(());
            }
            admin::run_broadcast(&bot, msg.chat.id, user_id, text, &services).await
        }
        ConversationState::AwaitingDailyText => {
            if !services.is_admin(user_id, &user) {
                return Ok(());
            }
            services.runtime_settings.set_daily_text(text).await;
            log_admin_action(user_id, "setdaily", None);
            bot.send_message(msg.chat.id, "✅ Daily trade updated.").await?;
            Ok(())
        }
    }
}
