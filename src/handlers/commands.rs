//! Command handlers
//!
//! `/start` routes to the admin panel or the user menu; `/help` explains the
//! flow in the requester's language.

use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{debug, info};

use crate::state::AppContext;
use crate::utils::errors::{Result, SupportBuddyError};
use crate::views::keyboards;
use crate::views::show_admin_screen;

/// Handle /start
pub async fn handle_start(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| SupportBuddyError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    info!(user_id = user_id, "Processing /start");

    if ctx.is_admin(user_id) {
        return show_admin_home(&bot, &ctx).await;
    }

    {
        let bans = ctx.bans.lock().await;
        if bans.is_banned(user_id) {
            let lang = ctx.user_lang(user_id).await;
            let reason = bans.reason(user_id).unwrap_or_default().to_string();
            drop(bans);
            let mut params = std::collections::HashMap::new();
            params.insert("reason".to_string(), reason);
            bot.send_message(msg.chat.id, ctx.i18n.t("welcome.banned", &lang, Some(&params)))
                .await?;
            return Ok(());
        }
    }

    // First contact: remember the language Telegram reports
    if ctx.tickets.user_locale(user_id).await.is_none() {
        let detected = ctx.i18n.detect_user_language(user.language_code.as_deref());
        debug!(user_id = user_id, lang = %detected, "Detected user language");
        ctx.tickets.set_user_locale(user_id, detected).await;
    }

    let lang = ctx.user_lang(user_id).await;
    bot.send_message(msg.chat.id, ctx.i18n.t("welcome.user", &lang, None))
        .reply_markup(keyboards::user_menu(&ctx.i18n, &lang))
        .await?;
    Ok(())
}

/// Handle /help
pub async fn handle_help(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    let lang = ctx.user_lang(user_id).await;
    let key = if ctx.is_admin(user_id) { "help.admin" } else { "help.user" };
    bot.send_message(msg.chat.id, ctx.i18n.t(key, &lang, None)).await?;
    Ok(())
}

/// Show or refresh the admin main menu on the root screen
pub async fn show_admin_home(bot: &Bot, ctx: &AppContext) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    show_admin_screen(
        bot,
        &ctx.screens,
        admin_id,
        &ctx.i18n.t("admin.home", &lang, None),
        Some(keyboards::admin_menu(&ctx.i18n, &lang)),
    )
    .await
}
