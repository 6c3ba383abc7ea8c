//! Service layer for SignalPilot
//!
//! The `ServiceFactory` wires the repositories and managers together once at
//! startup and is injected into the handlers through the dispatcher, so no
//! handler reaches for global state.

pub mod notification;
pub mod subscription;
pub mod withdrawal;

use teloxide::Bot;

use crate::config::Settings;
use crate::models::user::User;
use crate::storage::repositories::{KeysRepo, SettingsRepo, StatsRepo, UsersRepo, WithdrawalsRepo};
use crate::storage::DocumentStore;

pub use notification::NotificationService;
pub use subscription::{ActivationOutcome, GrantOutcome, Remaining, SubscriptionService};
pub use withdrawal::{AdjudicateOutcome, CancelOutcome, WithdrawOutcome, WithdrawalService};

/// Factory holding all repositories and services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub settings: Settings,
    pub users: UsersRepo,
    pub stats: StatsRepo,
    pub runtime_settings: SettingsRepo,
    pub subscription: SubscriptionService,
    pub withdrawal: WithdrawalService,
    pub notifications: NotificationService,
}

impl ServiceFactory {
    pub fn new(bot: Bot, settings: Settings, store: DocumentStore) -> Self {
        let users = UsersRepo::new(
            store.clone(),
            settings.bot.admin_ids.clone(),
            settings.i18n.default_language.clone(),
        );
        let keys = KeysRepo::new(store.clone());
        let withdrawals = WithdrawalsRepo::new(store.clone());
        let stats = StatsRepo::new(store.clone());
        let runtime_settings = SettingsRepo::new(store);

        let subscription =
            SubscriptionService::new(users.clone(), keys, settings.subscription.clone());
        let withdrawal = WithdrawalService::new(users.clone(), withdrawals);
        let notifications = NotificationService::new(bot);

        Self {
            settings,
            users,
            stats,
            runtime_settings,
            subscription,
            withdrawal,
            notifications,
        }
    }

    /// Admin check: stored role or the configured allow-list
    pub fn is_admin(&self, user_id: i64, user: &User) -> bool {
        user.is_admin() || self.settings.is_configured_admin(user_id)
    }
}
