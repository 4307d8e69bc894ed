//! Callback query handlers
//!
//! One dispatcher for every inline button. Callback data is `action` or
//! `action:payload` with `:`-separated parts; admin-only actions are guarded
//! on the requester's ID, not on the button's presence.

use std::collections::HashMap;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, MessageId};
use tracing::{info, warn};

use crate::models::{FeedbackKind, Rating, TicketStatus};
use crate::services::CooldownVerdict;
use crate::state::{AppContext, SessionState};
use crate::utils::errors::Result;
use crate::utils::logging::{log_admin_action, log_ticket_event};
use crate::utils::validators::is_ticket_id;
use crate::views::inbox::InboxFilter;
use crate::views::keyboards;
use crate::views::{build_inbox, delete_tracked, show_admin_screen, show_ticket_card};

use super::commands::show_admin_home;

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: AppContext) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let origin: Option<(ChatId, MessageId)> =
        query.message.as_ref().map(|m| (m.chat().id, m.id()));

    // Answer first to drop the client's loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let data = match query.data {
        Some(data) => data,
        None => return Ok(()),
    };
    info!(user_id = user_id, callback_data = %data, "Processing callback");

    let parts: Vec<&str> = data.split(':').collect();
    let action = parts[0];
    let payload = parts.get(1).copied();

    match action {
        "noop" => {}

        // User menu actions
        "user_question" | "user_suggestion" | "user_review" | "user_language"
        | "after_rate_suggestion" | "after_rate_review" | "cancel_feedback_prompt"
        | "user_lang" | "rate" => {
            handle_user_action(&bot, &ctx, user_id, &parts, origin).await?;
        }

        // Everything below is admin-only
        _ if !ctx.is_admin(user_id) => {
            warn!(user_id = user_id, action = %action, "Non-admin callback ignored");
        }

        "admin_home" => {
            let admin_id = ctx.admin_id();
            ctx.sessions.clear(admin_id).await;
            delete_tracked(&bot, admin_id, ctx.screens.take_inbox(admin_id).await).await;
            delete_tracked(&bot, admin_id, ctx.screens.take_search(admin_id).await).await;
            delete_tracked(&bot, admin_id, ctx.screens.take_instruction(admin_id).await).await;
            show_admin_home(&bot, &ctx).await?;
        }
        "admin_inbox" => {
            ctx.sessions.clear(ctx.admin_id()).await;
            show_inbox(&bot, &ctx).await?;
        }
        "inbox_filter" => {
            if let Some(filter) = payload.and_then(InboxFilter::parse) {
                ctx.sessions.set_inbox_view(ctx.admin_id(), filter, 0).await;
                show_inbox(&bot, &ctx).await?;
            }
        }
        "inbox_page" => {
            if let Some(page) = payload.and_then(|p| p.parse::<usize>().ok()) {
                let (filter, _) = ctx.sessions.inbox_view(ctx.admin_id()).await;
                ctx.sessions.set_inbox_view(ctx.admin_id(), filter, page).await;
                show_inbox(&bot, &ctx).await?;
            }
        }
        "search_start" => {
            let admin_id = ctx.admin_id();
            let lang = ctx.user_lang(admin_id).await;
            ctx.sessions.set(admin_id, SessionState::AwaitingSearchInput).await;
            delete_tracked(&bot, admin_id, ctx.screens.take_search(admin_id).await).await;
            let sent = bot
                .send_message(ChatId(admin_id), ctx.i18n.t("search.prompt", &lang, None))
                .reply_markup(keyboards::search_prompt_keyboard(&ctx.i18n, &lang))
                .await?;
            ctx.screens.set_search(admin_id, sent.id).await;
        }
        "ticket" => {
            if let Some(ticket_id) = payload.filter(|p| is_ticket_id(p)) {
                show_card_or_report(&bot, &ctx, ticket_id, None).await?;
            }
        }
        "take" => {
            if let Some(ticket_id) = payload.filter(|p| is_ticket_id(p)) {
                take_ticket(&bot, &ctx, ticket_id).await?;
            }
        }
        "close" => {
            if let Some(ticket_id) = payload.filter(|p| is_ticket_id(p)) {
                close_ticket(&bot, &ctx, ticket_id).await?;
            }
        }
        "reply" => {
            if let Some(ticket_id) = payload.filter(|p| is_ticket_id(p)) {
                start_reply(&bot, &ctx, ticket_id).await?;
            }
        }
        "thank" => {
            if let Some(feedback_id) = payload {
                thank_feedback(&bot, &ctx, feedback_id, origin).await?;
            }
        }
        "admin_stats" => {
            show_stats(&bot, &ctx).await?;
        }
        "admin_settings" => {
            let lang = ctx.user_lang(ctx.admin_id()).await;
            show_admin_screen(
                &bot,
                &ctx.screens,
                ctx.admin_id(),
                &ctx.i18n.t("admin.settings_title", &lang, None),
                Some(keyboards::settings_menu(&ctx.i18n, &lang)),
            )
            .await?;
        }
        "ban_user" => {
            let admin_id = ctx.admin_id();
            let lang = ctx.user_lang(admin_id).await;
            ctx.sessions.set(admin_id, SessionState::AwaitingBanUserId).await;
            bot.send_message(ChatId(admin_id), ctx.i18n.t("admin.ban_prompt", &lang, None))
                .await?;
        }
        "unban_user" => {
            let admin_id = ctx.admin_id();
            let lang = ctx.user_lang(admin_id).await;
            ctx.sessions.set(admin_id, SessionState::AwaitingUnbanUserId).await;
            bot.send_message(ChatId(admin_id), ctx.i18n.t("admin.unban_prompt", &lang, None))
                .await?;
        }
        "bans_list" => {
            show_bans_list(&bot, &ctx).await?;
        }
        "clear_tickets" => {
            let count = ctx.tickets.clear_active().await;
            log_admin_action(ctx.admin_id(), "clear_tickets", None);
            let lang = ctx.user_lang(ctx.admin_id()).await;
            let mut params = HashMap::new();
            params.insert("count".to_string(), count.to_string());
            show_admin_screen(
                &bot,
                &ctx.screens,
                ctx.admin_id(),
                &ctx.i18n.t("admin.cleared", &lang, Some(&params)),
                Some(keyboards::home_keyboard(&ctx.i18n, &lang)),
            )
            .await?;
        }
        "admin_language" => {
            let lang = ctx.user_lang(ctx.admin_id()).await;
            show_admin_screen(
                &bot,
                &ctx.screens,
                ctx.admin_id(),
                &ctx.i18n.t("admin.language_prompt", &lang, None),
                Some(keyboards::language_keyboard("admin_lang")),
            )
            .await?;
        }
        "admin_lang" => {
            if let Some(code) = payload.filter(|c| ctx.i18n.is_language_supported(c)) {
                ctx.tickets.set_user_locale(ctx.admin_id(), code.to_string()).await;
                show_admin_home(&bot, &ctx).await?;
            }
        }
        other => {
            warn!(action = %other, "Unknown callback action");
        }
    }

    Ok(())
}

async fn handle_user_action(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    parts: &[&str],
    origin: Option<(ChatId, MessageId)>,
) -> Result<()> {
    if ctx.bans.lock().await.is_banned(user_id) {
        return Ok(());
    }
    let lang = ctx.user_lang(user_id).await;
    let chat = ChatId(user_id);
    let payload = parts.get(1).copied();

    match parts[0] {
        "user_question" => {
            if let Some(active) = ctx.tickets.active_ticket_for(user_id).await {
                let mut params = HashMap::new();
                params.insert("id".to_string(), active.id);
                bot.send_message(chat, ctx.i18n.t("question.active_exists", &lang, Some(&params)))
                    .await?;
                return Ok(());
            }
            ctx.sessions.set(user_id, SessionState::AwaitingQuestion).await;
            bot.send_message(chat, ctx.i18n.t("question.prompt", &lang, None)).await?;
        }
        "user_suggestion" | "user_review" => {
            let kind = if parts[0] == "user_suggestion" {
                FeedbackKind::Suggestion
            } else {
                FeedbackKind::Review
            };
            if let CooldownVerdict::Blocked { remaining_hours } =
                ctx.feedback.check_cooldown(user_id, kind).await
            {
                bot.send_message(chat, ctx.i18n.tp("feedback.cooldown", &lang, remaining_hours, None))
                    .await?;
                return Ok(());
            }
            let (state, prompt) = match kind {
                FeedbackKind::Suggestion => (
                    SessionState::AwaitingSuggestion { cooldown_exempt: false },
                    "feedback.suggestion_prompt",
                ),
                FeedbackKind::Review => (
                    SessionState::AwaitingReview { cooldown_exempt: false },
                    "feedback.review_prompt",
                ),
            };
            ctx.sessions.set(user_id, state).await;
            bot.send_message(chat, ctx.i18n.t(prompt, &lang, None)).await?;
        }
        "after_rate_suggestion" => {
            ctx.sessions
                .set(user_id, SessionState::AwaitingSuggestion { cooldown_exempt: true })
                .await;
            bot.send_message(chat, ctx.i18n.t("feedback.suggestion_prompt", &lang, None))
                .await?;
        }
        "after_rate_review" => {
            ctx.sessions
                .set(user_id, SessionState::AwaitingReview { cooldown_exempt: true })
                .await;
            bot.send_message(chat, ctx.i18n.t("feedback.review_prompt", &lang, None)).await?;
        }
        "cancel_feedback_prompt" => {
            ctx.sessions.clear(user_id).await;
            if let Some((chat_id, message_id)) = origin {
                delete_tracked(bot, chat_id.0, Some(message_id)).await;
            }
        }
        "user_language" => {
            bot.send_message(chat, ctx.i18n.t("menu.language_prompt", &lang, None))
                .reply_markup(keyboards::language_keyboard("user_lang"))
                .await?;
        }
        "user_lang" => {
            if let Some(code) = payload.filter(|c| ctx.i18n.is_language_supported(c)) {
                ctx.tickets.set_user_locale(user_id, code.to_string()).await;
                let lang = code.to_string();
                bot.send_message(chat, ctx.i18n.t("menu.language_set", &lang, None))
                    .reply_markup(keyboards::user_menu(&ctx.i18n, &lang))
                    .await?;
            }
        }
        "rate" => {
            // rate:{ticket_id}:{rating}
            if let (Some(ticket_id), Some(raw)) = (parts.get(1), parts.get(2)) {
                if let Some(rating) = Rating::parse(raw) {
                    rate_ticket(bot, ctx, user_id, ticket_id, rating, origin, &lang).await?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

async fn rate_ticket(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    ticket_id: &str,
    rating: Rating,
    origin: Option<(ChatId, MessageId)>,
    lang: &str,
) -> Result<()> {
    // Only the ticket's own user may rate it
    match ctx.tickets.get(ticket_id).await {
        Some(ticket) if ticket.user_id == user_id => {}
        _ => {
            warn!(user_id = user_id, ticket_id = %ticket_id, "Rating rejected");
            return Ok(());
        }
    }

    let ticket = ctx.tickets.rate(ticket_id, rating).await?;

    // Replace the rating prompt so the buttons cannot be pressed twice
    if let Some((chat_id, message_id)) = origin {
        let _ = bot
            .edit_message_text(chat_id, message_id, ctx.i18n.t("rating.thanks", lang, None))
            .await;
    }

    bot.send_message(ChatId(user_id), ctx.i18n.t("feedback.post_rating_prompt", lang, None))
        .reply_markup(keyboards::post_rating_keyboard(&ctx.i18n, lang))
        .await?;

    let admin_lang = ctx.user_lang(ctx.admin_id()).await;
    show_ticket_card(
        bot,
        &ctx.screens,
        &ctx.i18n,
        &admin_lang,
        ctx.admin_id(),
        &ticket,
        Some("card.rated"),
        ctx.settings.tickets.history_limit,
    )
    .await?;
    Ok(())
}

/// Rebuild and reshow the admin inbox listing
async fn show_inbox(bot: &Bot, ctx: &AppContext) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    let (filter, page) = ctx.sessions.inbox_view(admin_id).await;
    let tickets = ctx.tickets.snapshot().await;
    let rendered = build_inbox(&tickets, filter, page, &ctx.settings.ui, &ctx.i18n, &lang);

    delete_tracked(bot, admin_id, ctx.screens.take_inbox(admin_id).await).await;
    let sent = bot
        .send_message(ChatId(admin_id), rendered.text)
        .reply_markup(rendered.keyboard)
        .await?;
    ctx.screens.set_inbox(admin_id, sent.id).await;
    Ok(())
}

async fn show_card_or_report(
    bot: &Bot,
    ctx: &AppContext,
    ticket_id: &str,
    banner_key: Option<&str>,
) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    match ctx.tickets.get(ticket_id).await {
        Some(ticket) => {
            show_ticket_card(
                bot,
                &ctx.screens,
                &ctx.i18n,
                &lang,
                admin_id,
                &ticket,
                banner_key,
                ctx.settings.tickets.history_limit,
            )
            .await
        }
        None => {
            let mut params = HashMap::new();
            params.insert("id".to_string(), ticket_id.to_string());
            bot.send_message(
                ChatId(admin_id),
                ctx.i18n.t("admin.ticket_missing", &lang, Some(&params)),
            )
            .await?;
            Ok(())
        }
    }
}

async fn take_ticket(bot: &Bot, ctx: &AppContext, ticket_id: &str) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    match ctx.tickets.take(ticket_id, admin_id).await {
        Ok(ticket) => {
            log_ticket_event(&ticket.id, ticket.user_id, "taken");
            let user_lang = ctx.user_lang(ticket.user_id).await;
            bot.send_message(
                ChatId(ticket.user_id),
                ctx.i18n.t("ticket.taken_user", &user_lang, None),
            )
            .await?;
            show_ticket_card(
                bot,
                &ctx.screens,
                &ctx.i18n,
                &lang,
                admin_id,
                &ticket,
                Some("card.taken"),
                ctx.settings.tickets.history_limit,
            )
            .await?;
        }
        Err(e) => report_action_error(bot, ctx, &lang, e).await?,
    }
    Ok(())
}

async fn close_ticket(bot: &Bot, ctx: &AppContext, ticket_id: &str) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;

    // Closing straight from the card of a fresh ticket takes it first
    if let Some(ticket) = ctx.tickets.get(ticket_id).await {
        if ticket.status == TicketStatus::New {
            ctx.tickets.take(ticket_id, admin_id).await?;
        }
    }

    match ctx.tickets.close(ticket_id).await {
        Ok(ticket) => {
            log_ticket_event(&ticket.id, ticket.user_id, "closed");
            // A pending reply session for this ticket is now moot
            if let Some(SessionState::AwaitingReply { ticket_id: pending }) =
                ctx.sessions.get(admin_id).await
            {
                if pending == ticket.id {
                    ctx.sessions.clear(admin_id).await;
                    delete_tracked(bot, admin_id, ctx.screens.take_instruction(admin_id).await)
                        .await;
                }
            }

            let user_lang = ctx.user_lang(ticket.user_id).await;
            bot.send_message(
                ChatId(ticket.user_id),
                ctx.i18n.t("ticket.closed_user", &user_lang, None),
            )
            .reply_markup(keyboards::rating_keyboard(&ticket.id, &ctx.i18n, &user_lang))
            .await?;

            show_ticket_card(
                bot,
                &ctx.screens,
                &ctx.i18n,
                &lang,
                admin_id,
                &ticket,
                Some("card.closed"),
                ctx.settings.tickets.history_limit,
            )
            .await?;
        }
        Err(e) => report_action_error(bot, ctx, &lang, e).await?,
    }
    Ok(())
}

async fn start_reply(bot: &Bot, ctx: &AppContext, ticket_id: &str) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;

    let ticket = match ctx.tickets.get(ticket_id).await {
        Some(ticket) if ticket.status.is_active() => ticket,
        Some(_) => {
            bot.send_message(ChatId(admin_id), ctx.i18n.t("admin.reply_closed", &lang, None))
                .await?;
            return Ok(());
        }
        None => {
            let mut params = HashMap::new();
            params.insert("id".to_string(), ticket_id.to_string());
            bot.send_message(
                ChatId(admin_id),
                ctx.i18n.t("admin.ticket_missing", &lang, Some(&params)),
            )
            .await?;
            return Ok(());
        }
    };

    ctx.sessions
        .set(admin_id, SessionState::AwaitingReply { ticket_id: ticket.id.clone() })
        .await;

    delete_tracked(bot, admin_id, ctx.screens.take_instruction(admin_id).await).await;
    let mut params = HashMap::new();
    params.insert("id".to_string(), ticket.id.clone());
    let sent = bot
        .send_message(
            ChatId(admin_id),
            ctx.i18n.t("admin.reply_instruction", &lang, Some(&params)),
        )
        .await?;
    ctx.screens.set_instruction(admin_id, sent.id).await;
    Ok(())
}

async fn thank_feedback(
    bot: &Bot,
    ctx: &AppContext,
    feedback_id: &str,
    origin: Option<(ChatId, MessageId)>,
) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    match ctx.feedback.thank(feedback_id).await {
        Ok(feedback) => {
            let user_lang = ctx.user_lang(feedback.user_id).await;
            bot.send_message(
                ChatId(feedback.user_id),
                ctx.i18n.t("feedback.thanked_user", &user_lang, None),
            )
            .await?;

            // Swap the card's button for the inert "thanked" marker
            let card = origin
                .or_else(|| feedback.message_id.map(|id| (ChatId(admin_id), MessageId(id))));
            if let Some((chat, message_id)) = card {
                bot.edit_message_reply_markup(chat, message_id)
                    .reply_markup(keyboards::thanked_keyboard(&ctx.i18n, &lang))
                    .await?;
            }
        }
        Err(e) => report_action_error(bot, ctx, &lang, e).await?,
    }
    Ok(())
}

async fn show_stats(bot: &Bot, ctx: &AppContext) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;
    let stats = ctx.tickets.stats().await;

    let mut params = HashMap::new();
    params.insert("total".to_string(), stats.total_tickets.to_string());
    params.insert("active".to_string(), stats.active_tickets.to_string());
    params.insert("closed".to_string(), stats.closed_tickets.to_string());
    params.insert("users".to_string(), stats.total_users.to_string());

    show_admin_screen(
        bot,
        &ctx.screens,
        admin_id,
        &ctx.i18n.t("admin.stats_screen", &lang, Some(&params)),
        Some(keyboards::home_keyboard(&ctx.i18n, &lang)),
    )
    .await
}

async fn show_bans_list(bot: &Bot, ctx: &AppContext) -> Result<()> {
    let admin_id = ctx.admin_id();
    let lang = ctx.user_lang(admin_id).await;

    let entries: Vec<String> = {
        let bans = ctx.bans.lock().await;
        bans.list()
            .iter()
            .map(|(user_id, reason)| {
                let mut params = HashMap::new();
                params.insert("user_id".to_string(), user_id.to_string());
                params.insert("reason".to_string(), reason.clone());
                ctx.i18n.t("admin.bans_entry", &lang, Some(&params))
            })
            .collect()
    };

    let text = if entries.is_empty() {
        ctx.i18n.t("admin.bans_empty", &lang, None)
    } else {
        format!("{}\n\n{}", ctx.i18n.t("admin.bans_title", &lang, None), entries.join("\n"))
    };

    show_admin_screen(
        bot,
        &ctx.screens,
        admin_id,
        &text,
        Some(keyboards::home_keyboard(&ctx.i18n, &lang)),
    )
    .await
}

async fn report_action_error(
    bot: &Bot,
    ctx: &AppContext,
    lang: &str,
    error: crate::utils::errors::SupportBuddyError,
) -> Result<()> {
    warn!(error = %error, severity = %error.severity(), "Admin action failed");
    let detail = if error.is_user_facing() {
        error.to_string()
    } else {
        ctx.i18n.t("admin.internal_error", lang, None)
    };
    let mut params = HashMap::new();
    params.insert("error".to_string(), detail);
    bot.send_message(
        ChatId(ctx.admin_id()),
        ctx.i18n.t("admin.action_failed", lang, Some(&params)),
    )
    .await?;
    Ok(())
}
