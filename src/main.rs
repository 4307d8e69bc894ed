//! SupportBuddy Telegram Bot
//!
//! Main application entry point

use std::time::Duration;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Update;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use tracing::{error, info, warn};

use SupportBuddy::{
    config::Settings,
    handlers::{handle_callback_query, handle_help, handle_message, handle_start},
    state::AppContext,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the dispatcher
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", SupportBuddy::info());

    let bot = Bot::new(&settings.bot.token);

    info!("Building application context...");
    let ctx = AppContext::build(settings).await?;

    spawn_auto_close(bot.clone(), ctx.clone());

    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("SupportBuddy bot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("SupportBuddy bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<BotCommand>().endpoint(handle_commands))
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "SupportBuddy Bot Commands")]
enum BotCommand {
    #[command(description = "Open the support menu")]
    Start,
    #[command(description = "Show help information")]
    Help,
}

async fn handle_commands(bot: Bot, msg: Message, cmd: BotCommand, ctx: AppContext) -> HandlerResult {
    let origin = msg.chat.id;
    let result = match cmd {
        BotCommand::Start => handle_start(bot.clone(), msg, ctx.clone()).await,
        BotCommand::Help => handle_help(bot.clone(), msg, ctx.clone()).await,
    };
    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        notify_unhandled(&bot, &ctx, origin).await;
        return Err(e.into());
    }
    Ok(())
}

async fn handle_messages(bot: Bot, msg: Message, ctx: AppContext) -> HandlerResult {
    let origin = msg.chat.id;
    if let Err(e) = handle_message(bot.clone(), msg, ctx.clone()).await {
        error!(error = %e, "Error handling message");
        notify_unhandled(&bot, &ctx, origin).await;
        return Err(e.into());
    }
    Ok(())
}

async fn handle_callbacks(bot: Bot, query: CallbackQuery, ctx: AppContext) -> HandlerResult {
    let origin = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(query.from.id.0 as i64));
    if let Err(e) = handle_callback_query(bot.clone(), query, ctx.clone()).await {
        error!(error = %e, "Error handling callback query");
        notify_unhandled(&bot, &ctx, origin).await;
        return Err(e.into());
    }
    Ok(())
}

/// Best-effort generic notifications after an error escapes a handler
///
/// The originating chat gets a "something went wrong" line, the admin gets a
/// check-the-logs notice. Send failures here are swallowed; the error is
/// already logged.
async fn notify_unhandled(bot: &Bot, ctx: &AppContext, origin: ChatId) {
    if origin.0 != ctx.admin_id() {
        let lang = ctx.user_lang(origin.0).await;
        let _ = bot.send_message(origin, ctx.i18n.t("error.generic", &lang, None)).await;
    }
    let admin_lang = ctx.user_lang(ctx.admin_id()).await;
    let _ = bot
        .send_message(ChatId(ctx.admin_id()), ctx.i18n.t("error.admin_notice", &admin_lang, None))
        .await;
}

/// Hourly sweep closing tickets idle past the configured horizon
fn spawn_auto_close(bot: Bot, ctx: AppContext) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        interval.tick().await; // first tick fires immediately, skip it
        loop {
            interval.tick().await;
            let horizon = ctx.settings.tickets.auto_close_after_hours;
            for ticket_id in ctx.tickets.close_stale(horizon).await {
                if let Some(ticket) = ctx.tickets.get(&ticket_id).await {
                    let lang = ctx.user_lang(ticket.user_id).await;
                    if let Err(e) = bot
                        .send_message(
                            ChatId(ticket.user_id),
                            ctx.i18n.t("ticket.auto_closed_user", &lang, None),
                        )
                        .await
                    {
                        warn!(ticket_id = %ticket_id, error = %e, "Failed to notify auto-close");
                    }
                }
            }
        }
    });
}
