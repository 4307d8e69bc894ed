//! Inline keyboard layouts
//!
//! All button rows the bot shows, built from localized labels. Callback data
//! uses `action:payload` with `:`-separated parts.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::i18n::I18n;
use crate::models::{Ticket, TicketStatus};

fn home_row(i18n: &I18n, lang: &str) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(
        format!("🏠 {}", i18n.t("buttons.main_menu", lang, None)),
        "admin_home".to_string(),
    )]
}

/// The user's main inline menu
pub fn user_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("❓ {}", i18n.t("menu.ask_question", lang, None)),
            "user_question".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("💡 {}", i18n.t("menu.suggestion", lang, None)),
            "user_suggestion".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("⭐ {}", i18n.t("menu.review", lang, None)),
            "user_review".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("🌐 {}", i18n.t("menu.change_language", lang, None)),
            "user_language".to_string(),
        )],
    ])
}

/// The admin's main menu
pub fn admin_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("📥 {}", i18n.t("admin.inbox", lang, None)),
            "admin_inbox".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("📊 {}", i18n.t("admin.stats", lang, None)),
            "admin_stats".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("⚙️ {}", i18n.t("admin.settings", lang, None)),
            "admin_settings".to_string(),
        )],
    ])
}

/// Settings menu shown on the admin root screen
pub fn settings_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("🚫 {}", i18n.t("admin.ban_user", lang, None)),
            "ban_user".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("✅ {}", i18n.t("admin.unban_user", lang, None)),
            "unban_user".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("📋 {}", i18n.t("admin.bans_list", lang, None)),
            "bans_list".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("🗑 {}", i18n.t("admin.clear_tickets", lang, None)),
            "clear_tickets".to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("🌐 {}", i18n.t("admin.change_language", lang, None)),
            "admin_language".to_string(),
        )],
        home_row(i18n, lang),
    ])
}

/// Home-only keyboard for plain informational screens
pub fn home_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![home_row(i18n, lang)])
}

/// Action buttons for a ticket card, depending on status
pub fn card_actions(ticket: &Ticket, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    match ticket.status {
        TicketStatus::New => {
            rows.push(vec![
                InlineKeyboardButton::callback(
                    format!("▶️ {}", i18n.t("buttons.take", lang, None)),
                    format!("take:{}", ticket.id),
                ),
                InlineKeyboardButton::callback(
                    format!("✅ {}", i18n.t("buttons.close", lang, None)),
                    format!("close:{}", ticket.id),
                ),
            ]);
        }
        TicketStatus::Working => {
            rows.push(vec![InlineKeyboardButton::callback(
                format!("💬 {}", i18n.t("buttons.reply", lang, None)),
                format!("reply:{}", ticket.id),
            )]);
            rows.push(vec![InlineKeyboardButton::callback(
                format!("✅ {}", i18n.t("buttons.close", lang, None)),
                format!("close:{}", ticket.id),
            )]);
        }
        TicketStatus::Done => {}
    }
    rows.push(vec![InlineKeyboardButton::callback(
        format!("◀️ {}", i18n.t("buttons.back", lang, None)),
        "admin_inbox".to_string(),
    )]);
    rows.push(home_row(i18n, lang));
    InlineKeyboardMarkup::new(rows)
}

/// One row of post-close rating buttons
pub fn rating_keyboard(ticket_id: &str, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            i18n.t("rating.excellent", lang, None),
            format!("rate:{}:excellent", ticket_id),
        ),
        InlineKeyboardButton::callback(
            i18n.t("rating.good", lang, None),
            format!("rate:{}:good", ticket_id),
        ),
        InlineKeyboardButton::callback(
            i18n.t("rating.ok", lang, None),
            format!("rate:{}:ok", ticket_id),
        ),
    ]])
}

/// Feedback prompt shown right after a rating; submissions are cooldown-exempt
pub fn post_rating_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(
                format!("💡 {}", i18n.t("menu.suggestion", lang, None)),
                "after_rate_suggestion".to_string(),
            ),
            InlineKeyboardButton::callback(
                format!("⭐ {}", i18n.t("menu.review", lang, None)),
                "after_rate_review".to_string(),
            ),
        ],
        vec![InlineKeyboardButton::callback(
            i18n.t("buttons.cancel", lang, None),
            "cancel_feedback_prompt".to_string(),
        )],
    ])
}

/// "Thank" button under a feedback card
pub fn thank_keyboard(feedback_id: &str, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("✅ {}", i18n.t("buttons.thank", lang, None)),
        format!("thank:{}", feedback_id),
    )]])
}

/// Replacement markup after the admin has thanked
pub fn thanked_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("✓ {}", i18n.t("buttons.thanked", lang, None)),
        "noop".to_string(),
    )]])
}

/// Language choice; `scope` prefixes the callback so user and admin flows differ
pub fn language_keyboard(scope: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🇬🇧 English", format!("{}:en", scope)),
        InlineKeyboardButton::callback("🇷🇺 Русский", format!("{}:ru", scope)),
    ]])
}

/// Cancel-only keyboard under the search prompt
pub fn search_prompt_keyboard(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        i18n.t("search.button_cancel", lang, None),
        "admin_inbox".to_string(),
    )]])
}

/// Buttons under a successful search result
pub fn search_result_keyboard(ticket_id: &str, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            i18n.t("search.button_open", lang, None),
            format!("ticket:{}", ticket_id),
        )],
        search_retry_row(i18n, lang),
    ])
}

/// Retry/cancel row for a missed search
pub fn search_retry_row(i18n: &I18n, lang: &str) -> Vec<InlineKeyboardButton> {
    vec![
        InlineKeyboardButton::callback(
            i18n.t("search.button_new_search", lang, None),
            "search_start".to_string(),
        ),
        InlineKeyboardButton::callback(
            i18n.t("search.button_cancel", lang, None),
            "admin_inbox".to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I18nConfig;
    use chrono::{FixedOffset, TimeZone};

    fn i18n() -> I18n {
        I18n::new(&I18nConfig {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string()],
        })
    }

    fn ticket(status: TicketStatus) -> Ticket {
        let mut t = Ticket::open(
            "T-20250101-0001".into(),
            7,
            None,
            "question".into(),
            FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        t.status = status;
        t
    }

    #[test]
    fn test_card_actions_by_status() {
        let rows = |s| card_actions(&ticket(s), &i18n(), "en").inline_keyboard;
        // new: take+close, back, home
        assert_eq!(rows(TicketStatus::New).len(), 3);
        assert_eq!(rows(TicketStatus::New)[0].len(), 2);
        // working: reply, close, back, home
        assert_eq!(rows(TicketStatus::Working).len(), 4);
        // done: back, home only
        assert_eq!(rows(TicketStatus::Done).len(), 2);
    }

    #[test]
    fn test_rating_keyboard_callbacks() {
        let markup = rating_keyboard("T-20250101-0001", &i18n(), "en");
        let row = &markup.inline_keyboard[0];
        assert_eq!(row.len(), 3);
    }
}
