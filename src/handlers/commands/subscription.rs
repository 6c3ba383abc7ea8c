//! Redemption-key activation and subscription status

use chrono::Utc;
use teloxide::prelude::*;
use tracing::warn;

use crate::handlers::{resolve_user, HandlerResult};
use crate::i18n::{I18n, TranslationParams};
use crate::services::{ActivationOutcome, Remaining, ServiceFactory, SubscriptionService};
use crate::state::{ConversationState, StateStorage};

/// `/key <value>` redeems directly, `/key` arms the prompt slot
pub async fn handle_key(
    bot: Bot,
    msg: Message,
    args: String,
    services: ServiceFactory,
    state: StateStorage,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;

    let args = args.trim();
    if args.is_empty() {
        state.set(user_id, ConversationState::AwaitingKey).await;
        bot.send_message(msg.chat.id, i18n.t("key.prompt", &user.lang, None))
            .await?;
        return Ok(());
    }
    activate_key(&bot, msg.chat.id, user_id, args, &user.lang, &services, &i18n).await
}

pub async fn activate_key(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    value: &str,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    match services.subscription.activate(user_id, value).await {
        ActivationOutcome::Activated(subscription) => {
            let now = Utc::now();
            let remaining = match subscription.expire_at {
                None => Remaining::Unlimited,
                Some(expire_at) if expire_at > now => Remaining::Time(expire_at - now),
                Some(_) => Remaining::Expired,
            };
            let mut params = TranslationParams::new();
            params.insert("plan".to_string(), subscription.plan.clone());
            params.insert("remaining".to_string(), remaining.to_string());
            bot.send_message(chat_id, i18n.t("key.activated", lang, Some(&params)))
                .await?;
        }
        ActivationOutcome::InvalidKey => {
            bot.send_message(chat_id, i18n.t("key.invalid", lang, None))
                .await?;
        }
        ActivationOutcome::UnknownPlan(plan) => {
            // Key points at a plan no longer in the table; it stays unconsumed
            warn!(user_id = user_id, plan = %plan, "Key references unconfigured plan");
            bot.send_message(chat_id, i18n.t("key.invalid", lang, None))
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_sub(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    i18n: I18n,
) -> HandlerResult {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let (user_id, user) = resolve_user(&services, &i18n, tg_user).await;
    send_sub_status(&bot, msg.chat.id, user_id, &user.lang, &services, &i18n).await
}

pub async fn send_sub_status(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &str,
    services: &ServiceFactory,
    i18n: &I18n,
) -> HandlerResult {
    let now = Utc::now();
    let user = services.users.get(user_id).await;

    let text = match user {
        Some(ref user) if SubscriptionService::is_active(user, now) => {
            let plan = user
                .subscription
                .as_ref()
                .map(|s| s.plan.clone())
                .unwrap_or_default();
            let mut params = TranslationParams::new();
            params.insert("plan".to_string(), plan);
            params.insert(
                "remaining".to_string(),
                SubscriptionService::remaining(user, now).to_string(),
            );
            i18n.t("sub.active", lang, Some(&params))
        }
        _ => i18n.t("sub.none", lang, None),
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}
