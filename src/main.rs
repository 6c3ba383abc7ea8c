//! SignalPilot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use teloxide::{prelude::*, types::Update};
use tracing::{error, info, warn};

use SignalPilot::{
    config::{validate_settings, Settings},
    handlers::{
        callbacks::handle_callback_query,
        commands::{admin, start, subscription, wallet},
        messages::handle_message,
    },
    i18n::I18n,
    services::ServiceFactory,
    state::StateStorage,
    storage::{DocumentStore, KvStore},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    validate_settings(&settings)?;

    // Initialize logging; the guard flushes the file appender on shutdown
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", SignalPilot::info());

    // Connect storage: Postgres when a database URL is configured, flat
    // JSON files otherwise
    info!("Connecting storage backend...");
    let kv = KvStore::connect(&settings.storage).await?;
    let store = DocumentStore::new(kv);

    // Initialize i18n system
    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations().await?;

    // Initialize state management
    let state_storage = StateStorage::new();

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), settings.clone(), store);

    // Wrap dependencies in Arc for dependency injection
    let services_arc = Arc::new(services);
    let state_storage_arc = Arc::new(state_storage);
    let i18n_arc = Arc::new(i18n);

    let handler = create_handler();
    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![services_arc, state_storage_arc, i18n_arc])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("SignalPilot bot is ready!");

    // Webhook mode when a public base URL is configured, polling otherwise.
    // The webhook path is the bot token, which keeps the endpoint secret.
    if let Some(base) = &settings.bot.webhook_url {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.bot.port));
        let url = format!("{}/{}", base.trim_end_matches('/'), settings.bot.token).parse()?;
        info!(port = settings.bot.port, "Starting bot in webhook mode...");
        let listener = webhooks::axum(bot.clone(), webhooks::Options::new(addr, url)).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        info!("Starting bot in polling mode...");
        dispatcher.dispatch().await;
    }

    info!("SignalPilot bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<BotCommands>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "SignalPilot Bot Commands")]
enum BotCommands {
    #[command(description = "Main menu")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Show your ID")]
    Id,
    #[command(description = "Your balance")]
    Balance,
    #[command(description = "Daily trade")]
    Daily,
    #[command(description = "Request a withdrawal")]
    Withdraw(String),
    #[command(description = "Redeem a subscription key")]
    Key(String),
    #[command(description = "Subscription status")]
    Sub,
    #[command(description = "Change language")]
    Lang,
    #[command(description = "Set the daily trade text (admin only)")]
    Setdaily(String),
    #[command(description = "Add balance (admin only)")]
    Addbalance(String),
    #[command(description = "Take balance (admin only)")]
    Takebalance(String),
    #[command(description = "Set balance (admin only)")]
    Setbalance(String),
    #[command(description = "Generate redemption keys (admin only)")]
    Genkeys(String),
    #[command(description = "Delete a redemption key (admin only)")]
    Delkey(String),
    #[command(description = "Grant or extend a subscription (admin only)")]
    Grantsub(String),
    #[command(description = "Revoke a subscription (admin only)")]
    Revokesub(String),
    #[command(description = "Set a user label (admin only)")]
    Setlabel(String),
    #[command(description = "Set a user country (admin only)")]
    Setcountry(String),
    #[command(description = "Record a win (admin only)")]
    Win(String),
    #[command(description = "Record a loss (admin only)")]
    Loss(String),
    #[command(description = "List pending withdrawals (admin only)")]
    Pending(String),
    #[command(description = "Broadcast a message (admin only)")]
    Broadcast(String),
    #[command(description = "Runtime settings (admin only)")]
    Setconfig(String),
    #[command(description = "Promote a user to admin (admin only)")]
    Promote(String),
    #[command(description = "Demote an admin (admin only)")]
    Demote(String),
    #[command(description = "Count registered users (admin only)")]
    Users,
    #[command(description = "Export the users document (admin only)")]
    Export,
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: BotCommands,
    services: Arc<ServiceFactory>,
    state_storage: Arc<StateStorage>,
    i18n: Arc<I18n>,
) -> HandlerResult {
    let services = (*services).clone();
    let state = (*state_storage).clone();
    let i18n = (*i18n).clone();

    let result = match cmd {
        BotCommands::Start => start::handle_start(bot, msg, services, i18n).await,
        BotCommands::Help => start::handle_help(bot, msg, services, i18n).await,
        BotCommands::Id => start::handle_id(bot, msg, services, i18n).await,
        BotCommands::Balance => wallet::handle_balance(bot, msg, services, i18n).await,
        BotCommands::Daily => wallet::handle_daily(bot, msg, services, i18n).await,
        BotCommands::Withdraw(args) => {
            wallet::handle_withdraw(bot, msg, args, services, i18n).await
        }
        BotCommands::Key(args) => {
            subscription::handle_key(bot, msg, args, services, state, i18n).await
        }
        BotCommands::Sub => subscription::handle_sub(bot, msg, services, i18n).await,
        BotCommands::Lang => start::handle_lang(bot, msg, services, i18n).await,
        BotCommands::Setdaily(args) => {
            admin::handle_setdaily(bot, msg, args, services, state, i18n).await
        }
        BotCommands::Addbalance(args) => {
            admin::handle_addbalance(bot, msg, args, services, i18n).await
        }
        BotCommands::Takebalance(args) => {
            admin::handle_takebalance(bot, msg, args, services, i18n).await
        }
        BotCommands::Setbalance(args) => {
            admin::handle_setbalance(bot, msg, args, services, i18n).await
        }
        BotCommands::Genkeys(args) => admin::handle_genkeys(bot, msg, args, services, i18n).await,
        BotCommands::Delkey(args) => admin::handle_delkey(bot, msg, args, services, i18n).await,
        BotCommands::Grantsub(args) => {
            admin::handle_grantsub(bot, msg, args, services, i18n).await
        }
        BotCommands::Revokesub(args) => {
            admin::handle_revokesub(bot, msg, args, services, i18n).await
        }
        BotCommands::Setlabel(args) => {
            admin::handle_setlabel(bot, msg, args, services, state, i18n).await
        }
        BotCommands::Setcountry(args) => {
            admin::handle_setcountry(bot, msg, args, services, state, i18n).await
        }
        BotCommands::Win(args) => admin::handle_win(bot, msg, args, services, i18n).await,
        BotCommands::Loss(args) => admin::handle_loss(bot, msg, args, services, i18n).await,
        BotCommands::Pending(args) => admin::handle_pending(bot, msg, args, services, i18n).await,
        BotCommands::Broadcast(args) => {
            admin::handle_broadcast(bot, msg, args, services, state, i18n).await
        }
        BotCommands::Setconfig(args) => {
            admin::handle_setconfig(bot, msg, args, services, i18n).await
        }
        BotCommands::Promote(args) => admin::handle_promote(bot, msg, args, services, i18n).await,
        BotCommands::Demote(args) => admin::handle_demote(bot, msg, args, services, i18n).await,
        BotCommands::Users => admin::handle_users(bot, msg, services, i18n).await,
        BotCommands::Export => admin::handle_export(bot, msg, services, i18n).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e);
    }
    Ok(())
}

/// Handle regular messages
async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: Arc<ServiceFactory>,
    state_storage: Arc<StateStorage>,
    i18n: Arc<I18n>,
) -> HandlerResult {
    let services = (*services).clone();
    let state = (*state_storage).clone();
    let i18n = (*i18n).clone();

    if let Err(e) = handle_message(bot, msg, services, state, i18n).await {
        error!(error = %e, "Error handling message");
        return Err(e);
    }
    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    services: Arc<ServiceFactory>,
    state_storage: Arc<StateStorage>,
    i18n: Arc<I18n>,
) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    let services = (*services).clone();
    let state = (*state_storage).clone();
    let i18n = (*i18n).clone();

    if let Err(e) = handle_callback_query(bot, query, services, state, i18n).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e);
    }
    Ok(())
}
