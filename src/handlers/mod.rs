//! Update handlers: command, callback and plain-message routing
//!
//! Handlers are thin: they resolve the user, validate input, invoke exactly
//! one manager operation and render a localized reply. Business rules live
//! in the services.

pub mod callbacks;
pub mod commands;
pub mod messages;

use crate::i18n::I18n;
use crate::models::user::User;
use crate::services::ServiceFactory;

/// Handler result: errors bubble to the dispatcher's error handler, which
/// logs them; the update itself is always acknowledged
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Resolve (create-if-absent) the user behind an inbound update
pub(crate) async fn resolve_user(
    services: &ServiceFactory,
    i18n: &I18n,
    tg_user: &teloxide::types::User,
) -> (i64, User) {
    let user_id = tg_user.id.0 as i64;
    let lang = i18n.detect_user_language(tg_user.language_code.as_deref());
    let user = services.users.ensure(user_id, &lang).await;
    (user_id, user)
}
