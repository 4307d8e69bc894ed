//! Message handlers
//!
//! Free-text input routed through the session state: user question and
//! feedback drafts, admin replies, ban management and inbox search. Stateless
//! text from a user with an active ticket goes into that ticket under the
//! turn-taking rule.

use std::collections::HashMap;

use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{debug, warn};

use crate::models::FeedbackKind;
use crate::services::CooldownVerdict;
use crate::state::{AppContext, SessionState};
use crate::utils::errors::{Result, SupportBuddyError};
use crate::utils::helpers::display_identity;
use crate::utils::logging::{log_admin_action, log_ticket_event};
use crate::utils::validators::parse_user_id;
use crate::views::keyboards;
use crate::views::{delete_tracked, search_by_id, show_ticket_card};

fn message_text(msg: &Message) -> Option<&str> {
    msg.text().or_else(|| msg.caption())
}

/// Bracketed marker recorded in the thread for an attachment
fn media_label(msg: &Message) -> Option<&'static str> {
    if msg.photo().is_some() {
        Some("[photo]")
    } else if msg.document().is_some() {
        Some("[document]")
    } else if msg.video().is_some() {
        Some("[video]")
    } else if msg.voice().is_some() {
        Some("[voice]")
    } else if msg.audio().is_some() {
        Some("[audio]")
    } else if msg.sticker().is_some() {
        Some("[sticker]")
    } else if msg.video_note().is_some() {
        Some("[video note]")
    } else {
        None
    }
}

fn has_media(msg: &Message) -> bool {
    media_label(msg).is_some()
}

/// Handle an incoming non-command message in a private chat
pub async fn handle_message(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    if !msg.chat.id.is_user() {
        debug!(chat_id = ?msg.chat.id, "Ignoring non-private message");
        return Ok(());
    }

    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| SupportBuddyError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    if ctx.is_admin(user_id) {
        return handle_admin_message(bot, msg, ctx).await;
    }

    if ctx.bans.lock().await.is_banned(user_id) {
        debug!(user_id = user_id, "Dropping message from banned user");
        return Ok(());
    }

    handle_user_message(bot, msg, ctx).await
}

async fn handle_admin_message(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;

    let state = match ctx.sessions.take(admin_id).await {
        Some(state) => state,
        None => {
            bot.send_message(msg.chat.id, ctx.i18n.t("admin.use_menu", &lang, None))
                .await?;
            return Ok(());
        }
    };

    match state {
        SessionState::AwaitingReply { ticket_id } => {
            let text = match message_text(&msg) {
                Some(text) => text.to_string(),
                None => {
                    // Replies stay text-only so the ticket history is complete
                    ctx.sessions.set(admin_id, SessionState::AwaitingReply { ticket_id }).await;
                    bot.send_message(msg.chat.id, ctx.i18n.t("admin.reply_text_only", &lang, None))
                        .await?;
                    return Ok(());
                }
            };

            let ticket = ctx
                .tickets
                .add_support_message(&ticket_id, admin_id, Some(text.clone()))
                .await?;

            let user_lang = ctx.user_lang(ticket.user_id).await;
            bot.send_message(
                ChatId(ticket.user_id),
                format!("{}\n{}", ctx.i18n.t("ticket.reply_prefix", &user_lang, None), text),
            )
            .await?;

            delete_tracked(&bot, admin_id, ctx.screens.take_instruction(admin_id).await).await;
            show_ticket_card(
                &bot,
                &ctx.screens,
                &ctx.i18n,
                &lang,
                admin_id,
                &ticket,
                Some("card.reply_sent"),
                ctx.settings.tickets.history_limit,
            )
            .await?;
        }
        SessionState::AwaitingBanUserId => match message_text(&msg).and_then(parse_user_id) {
            Some(user_id) => {
                ctx.sessions.set(admin_id, SessionState::AwaitingBanReason { user_id }).await;
                bot.send_message(msg.chat.id, ctx.i18n.t("admin.ban_reason_prompt", &lang, None))
                    .await?;
            }
            None => {
                ctx.sessions.set(admin_id, SessionState::AwaitingBanUserId).await;
                bot.send_message(msg.chat.id, ctx.i18n.t("admin.invalid_user_id", &lang, None))
                    .await?;
            }
        },
        SessionState::AwaitingBanReason { user_id } => {
            // "-" keeps the configured default reason
            let reason = message_text(&msg)
                .map(str::trim)
                .filter(|t| !t.is_empty() && *t != "-")
                .map(str::to_string);
            {
                let mut bans = ctx.bans.lock().await;
                bans.ban(user_id, reason);
            }
            log_admin_action(admin_id, "ban", Some(&user_id.to_string()));
            let mut params = HashMap::new();
            params.insert("user_id".to_string(), user_id.to_string());
            bot.send_message(msg.chat.id, ctx.i18n.t("admin.ban_done", &lang, Some(&params)))
                .await?;
        }
        SessionState::AwaitingUnbanUserId => match message_text(&msg).and_then(parse_user_id) {
            Some(user_id) => {
                let removed = ctx.bans.lock().await.unban(user_id);
                log_admin_action(admin_id, "unban", Some(&user_id.to_string()));
                let key = if removed { "admin.unban_done" } else { "admin.unban_missing" };
                let mut params = HashMap::new();
                params.insert("user_id".to_string(), user_id.to_string());
                bot.send_message(msg.chat.id, ctx.i18n.t(key, &lang, Some(&params))).await?;
            }
            None => {
                ctx.sessions.set(admin_id, SessionState::AwaitingUnbanUserId).await;
                bot.send_message(msg.chat.id, ctx.i18n.t("admin.invalid_user_id", &lang, None))
                    .await?;
            }
        },
        SessionState::AwaitingSearchInput => {
            let query = message_text(&msg).unwrap_or_default();
            let tickets = ctx.tickets.snapshot().await;

            delete_tracked(&bot, admin_id, ctx.screens.take_search(admin_id).await).await;
            let sent = match search_by_id(&tickets, query) {
                Some(ticket) => {
                    let mut params = HashMap::new();
                    params.insert("id".to_string(), ticket.id.clone());
                    params.insert(
                        "user".to_string(),
                        display_identity(ticket.username.as_deref(), ticket.user_id),
                    );
                    bot.send_message(
                        msg.chat.id,
                        ctx.i18n.t("search.found", &lang, Some(&params)),
                    )
                    .reply_markup(keyboards::search_result_keyboard(&ticket.id, &ctx.i18n, &lang))
                    .await?
                }
                None => {
                    bot.send_message(msg.chat.id, ctx.i18n.t("search.not_found", &lang, None))
                        .reply_markup(teloxide::types::InlineKeyboardMarkup::new(vec![
                            keyboards::search_retry_row(&ctx.i18n, &lang),
                        ]))
                        .await?
                }
            };
            ctx.screens.set_search(admin_id, sent.id).await;
        }
        other => {
            warn!(state = ?other, "Unexpected admin session state");
        }
    }

    Ok(())
}

async fn handle_user_message(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = msg.from.as_ref().expect("checked by caller");
    let user_id = user.id.0 as i64;
    let username = user.username.clone();
    let lang = ctx.user_lang(user_id).await;

    match ctx.sessions.take(user_id).await {
        Some(SessionState::AwaitingQuestion) => {
            let text = match message_text(&msg) {
                Some(text) if !has_media(&msg) => text.trim().to_string(),
                _ => {
                    ctx.sessions.set(user_id, SessionState::AwaitingQuestion).await;
                    bot.send_message(msg.chat.id, ctx.i18n.t("question.text_only", &lang, None))
                        .await?;
                    return Ok(());
                }
            };

            if text.chars().count() < ctx.settings.tickets.min_question_length {
                ctx.sessions.set(user_id, SessionState::AwaitingQuestion).await;
                let mut params = HashMap::new();
                params.insert(
                    "min".to_string(),
                    ctx.settings.tickets.min_question_length.to_string(),
                );
                bot.send_message(msg.chat.id, ctx.i18n.t("question.too_short", &lang, Some(&params)))
                    .await?;
                return Ok(());
            }

            match ctx.tickets.create_ticket(user_id, username, text).await {
                Ok(ticket) => {
                    log_ticket_event(&ticket.id, user_id, "created");
                    let mut params = HashMap::new();
                    params.insert("id".to_string(), ticket.id.clone());
                    bot.send_message(
                        msg.chat.id,
                        ctx.i18n.t("question.created", &lang, Some(&params)),
                    )
                    .await?;

                    let admin_lang = ctx.user_lang(ctx.admin_id()).await;

                    // Advisory heuristic: flag link-spam display names to the admin
                    let display_name = user.full_name();
                    if ctx.bans.lock().await.name_contains_link(&display_name) {
                        let mut params = HashMap::new();
                        params.insert(
                            "user".to_string(),
                            display_identity(user.username.as_deref(), user_id),
                        );
                        bot.send_message(
                            ChatId(ctx.admin_id()),
                            ctx.i18n.t("admin.name_link_warning", &admin_lang, Some(&params)),
                        )
                        .await?;
                    }
                    show_ticket_card(
                        &bot,
                        &ctx.screens,
                        &ctx.i18n,
                        &admin_lang,
                        ctx.admin_id(),
                        &ticket,
                        Some("card.new_ticket"),
                        ctx.settings.tickets.history_limit,
                    )
                    .await?;
                }
                Err(SupportBuddyError::ActiveTicketExists { id }) => {
                    let mut params = HashMap::new();
                    params.insert("id".to_string(), id);
                    bot.send_message(
                        msg.chat.id,
                        ctx.i18n.t("question.active_exists", &lang, Some(&params)),
                    )
                    .await?;
                }
                Err(e) => return Err(e),
            }
        }
        Some(SessionState::AwaitingSuggestion { cooldown_exempt }) => {
            submit_feedback(&bot, &msg, &ctx, FeedbackKind::Suggestion, cooldown_exempt, &lang)
                .await?;
        }
        Some(SessionState::AwaitingReview { cooldown_exempt }) => {
            submit_feedback(&bot, &msg, &ctx, FeedbackKind::Review, cooldown_exempt, &lang).await?;
        }
        Some(other) => {
            warn!(user_id = user_id, state = ?other, "Unexpected user session state");
        }
        None => {
            handle_stateless_user_message(&bot, &msg, &ctx, user_id, &lang).await?;
        }
    }

    Ok(())
}

/// Stateless text or media from a user: belongs to the active ticket if one
/// exists and it is the user's turn, otherwise points back to the menu
async fn handle_stateless_user_message(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    user_id: i64,
    lang: &str,
) -> Result<()> {
    let active = match ctx.tickets.active_ticket_for(user_id).await {
        Some(ticket) => ticket,
        None => {
            bot.send_message(msg.chat.id, ctx.i18n.t("menu.hint", lang, None))
                .reply_markup(keyboards::user_menu(&ctx.i18n, lang))
                .await?;
            return Ok(());
        }
    };

    if has_media(msg) && !ctx.settings.tickets.allow_user_media {
        bot.send_message(msg.chat.id, ctx.i18n.t("ticket.media_not_allowed", lang, None))
            .await?;
        return Ok(());
    }

    // Media is stored as a marker; the original message is forwarded so the
    // admin still sees the attachment
    let text = message_text(msg)
        .map(str::to_string)
        .or_else(|| media_label(msg).map(str::to_string));
    match ctx.tickets.add_user_message(&active.id, text).await {
        Ok(ticket) => {
            if has_media(msg) {
                bot.forward_message(ChatId(ctx.admin_id()), msg.chat.id, msg.id).await?;
            }
            bot.send_message(msg.chat.id, ctx.i18n.t("ticket.message_added", lang, None))
                .await?;

            let admin_lang = ctx.user_lang(ctx.admin_id()).await;
            show_ticket_card(
                bot,
                &ctx.screens,
                &ctx.i18n,
                &admin_lang,
                ctx.admin_id(),
                &ticket,
                Some("card.user_replied"),
                ctx.settings.tickets.history_limit,
            )
            .await?;
        }
        Err(SupportBuddyError::WaitForReply { .. }) => {
            bot.send_message(msg.chat.id, ctx.i18n.t("ticket.wait_for_reply", lang, None))
                .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

async fn submit_feedback(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    kind: FeedbackKind,
    cooldown_exempt: bool,
    lang: &str,
) -> Result<()> {
    let user = msg.from.as_ref().expect("checked by caller");
    let user_id = user.id.0 as i64;

    let text = match message_text(msg) {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => {
            bot.send_message(msg.chat.id, ctx.i18n.t("feedback.text_required", lang, None))
                .await?;
            return Ok(());
        }
    };

    // Re-check at submission time; the prompt may be hours old
    if !cooldown_exempt {
        if let CooldownVerdict::Blocked { remaining_hours } =
            ctx.feedback.check_cooldown(user_id, kind).await
        {
            bot.send_message(
                msg.chat.id,
                ctx.i18n.tp("feedback.cooldown", lang, remaining_hours, None),
            )
            .await?;
            return Ok(());
        }
    }

    let feedback = ctx.feedback.create_feedback(user_id, kind, text.clone()).await;
    ctx.feedback.record_submission(user_id, kind, cooldown_exempt).await;

    bot.send_message(msg.chat.id, ctx.i18n.t("feedback.received", lang, None))
        .await?;

    let admin_lang = ctx.user_lang(ctx.admin_id()).await;
    let header_key = match kind {
        FeedbackKind::Suggestion => "feedback.card_suggestion",
        FeedbackKind::Review => "feedback.card_review",
    };
    let mut params = HashMap::new();
    params.insert("user".to_string(), display_identity(user.username.as_deref(), user_id));
    let card = bot
        .send_message(
            ChatId(ctx.admin_id()),
            format!("{}\n\n{}", ctx.i18n.t(header_key, &admin_lang, Some(&params)), text),
        )
        .reply_markup(keyboards::thank_keyboard(&feedback.id, &ctx.i18n, &admin_lang))
        .await?;
    ctx.feedback.set_message_id(&feedback.id, card.id.0).await;

    Ok(())
}
