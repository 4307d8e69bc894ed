//! Root screen and ticket card delivery
//!
//! The admin UI lives in a handful of long-lived messages that are edited in
//! place instead of spamming the chat. This module implements the
//! edit-else-send policy around the screen tracker.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use teloxide::{ApiError, Bot, RequestError};
use tracing::{debug, warn};

use crate::i18n::I18n;
use crate::models::Ticket;
use crate::state::ScreenTracker;
use crate::utils::errors::Result;
use crate::views::card::render_ticket_card;
use crate::views::keyboards::card_actions;

/// Delete a tracked message; purely cosmetic, failures are ignored
pub async fn delete_tracked(bot: &Bot, chat_id: i64, message_id: Option<MessageId>) {
    if let Some(message_id) = message_id {
        if let Err(e) = bot.delete_message(ChatId(chat_id), message_id).await {
            debug!(chat_id = chat_id, error = %e, "Failed to delete stale screen message");
        }
    }
}

async fn send_screen(
    bot: &Bot,
    chat_id: i64,
    text: &str,
    keyboard: Option<&InlineKeyboardMarkup>,
) -> Result<MessageId> {
    let request = bot.send_message(ChatId(chat_id), text);
    let message = match keyboard {
        Some(keyboard) => request.reply_markup(keyboard.clone()).await?,
        None => request.await?,
    };
    Ok(message.id)
}

async fn edit_screen(
    bot: &Bot,
    chat_id: i64,
    message_id: MessageId,
    text: &str,
    keyboard: Option<&InlineKeyboardMarkup>,
) -> std::result::Result<(), RequestError> {
    let request = bot.edit_message_text(ChatId(chat_id), message_id, text);
    match keyboard {
        Some(keyboard) => request.reply_markup(keyboard.clone()).await?,
        None => request.await?,
    };
    Ok(())
}

/// Show or update the admin root screen
///
/// The tracked root message is edited in place; "message is not modified" is
/// treated as success. Any other edit failure falls back to sending a new
/// message and retracking it.
pub async fn show_admin_screen(
    bot: &Bot,
    screens: &ScreenTracker,
    admin_id: i64,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    if let Some(root_id) = screens.root(admin_id).await {
        match edit_screen(bot, admin_id, root_id, text, keyboard.as_ref()).await {
            Ok(()) => return Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
            Err(e) => {
                warn!(admin_id = admin_id, error = %e, "Failed to edit root screen, recreating");
            }
        }
    }

    let message_id = send_screen(bot, admin_id, text, keyboard.as_ref()).await?;
    screens.set_root(admin_id, message_id).await;
    Ok(())
}

/// Send or update the admin's card for one ticket
///
/// Prefers editing the tracked card message; when the edit fails (e.g. the
/// message was deleted externally) a fresh card is sent and tracked instead.
pub async fn show_ticket_card(
    bot: &Bot,
    screens: &ScreenTracker,
    i18n: &I18n,
    lang: &str,
    admin_id: i64,
    ticket: &Ticket,
    banner_key: Option<&str>,
    history_limit: usize,
) -> Result<()> {
    let card = render_ticket_card(ticket, history_limit, i18n, lang);
    let text = match banner_key {
        Some(key) => format!("{}\n\n{}", i18n.t(key, lang, None), card),
        None => card,
    };
    let keyboard = card_actions(ticket, i18n, lang);

    if let Some(card_id) = screens.card(&ticket.id).await {
        match edit_screen(bot, admin_id, card_id, &text, Some(&keyboard)).await {
            Ok(()) | Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
            Err(e) => {
                warn!(ticket_id = %ticket.id, error = %e, "Failed to edit ticket card, recreating");
            }
        }
    }

    let message_id = send_screen(bot, admin_id, &text, Some(&keyboard)).await?;
    screens.set_card(&ticket.id, message_id).await;
    Ok(())
}
