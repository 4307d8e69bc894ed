//! Ticket card rendering
//!
//! The full ticket card the admin sees: identity, status, rating and the
//! tail of the message history.

use crate::i18n::I18n;
use crate::models::{Actor, Rating, Ticket};
use crate::utils::helpers::{display_identity, format_time, format_timestamp};
use crate::views::inbox::status_glyph;

fn rating_display(rating: Rating, i18n: &I18n, lang: &str) -> String {
    let stars = match rating {
        Rating::Excellent => "⭐⭐⭐",
        Rating::Good => "⭐⭐",
        Rating::Ok => "⭐",
    };
    format!("{} {}", stars, i18n.t(&format!("rating.{}", rating.as_str()), lang, None))
}

/// Render the full ticket card
///
/// `history_limit` caps the number of trailing messages shown; 0 shows all.
pub fn render_ticket_card(ticket: &Ticket, history_limit: usize, i18n: &I18n, lang: &str) -> String {
    let mut lines = vec![
        format!("🎫 {}: {}", i18n.t("card.ticket", lang, None), ticket.id),
        format!(
            "👤 {}: {}",
            i18n.t("card.from", lang, None),
            display_identity(ticket.username.as_deref(), ticket.user_id)
        ),
        format!(
            "{} {}: {}",
            status_glyph(ticket.status),
            i18n.t("card.status", lang, None),
            i18n.t(&format!("status.{}", ticket.status.as_str()), lang, None)
        ),
        format!(
            "📅 {}: {}",
            i18n.t("card.created", lang, None),
            format_timestamp(ticket.created_at)
        ),
    ];

    if let Some(rating) = ticket.rating {
        lines.push(format!(
            "⭐ {}: {}",
            i18n.t("card.rating", lang, None),
            rating_display(rating, i18n, lang)
        ));
    }

    lines.push(String::new());
    lines.push(format!("📝 {}:", i18n.t("card.history", lang, None)));
    lines.push(String::new());

    let tail = if history_limit > 0 && ticket.messages.len() > history_limit {
        &ticket.messages[ticket.messages.len() - history_limit..]
    } else {
        &ticket.messages[..]
    };

    if tail.is_empty() {
        lines.push(i18n.t("card.no_messages", lang, None));
    } else {
        for message in tail {
            let sender = match message.sender {
                Actor::User => format!("👤 {}", i18n.t("card.sender_user", lang, None)),
                Actor::Support => format!("🛠 {}", i18n.t("card.sender_support", lang, None)),
            };
            lines.push(format!("{} [{}]:", sender, format_time(message.at)));
            lines.push(message.text.clone().unwrap_or_else(|| "[—]".to_string()));
            lines.push(String::new());
        }
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I18nConfig;
    use crate::models::TicketMessage;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn i18n() -> I18n {
        I18n::new(&I18nConfig {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string()],
        })
    }

    fn at(minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 1, 12, minute, 0)
            .unwrap()
    }

    fn ticket_with_messages(count: usize) -> Ticket {
        let mut ticket = Ticket::open(
            "T-20250101-0001".into(),
            7,
            Some("alice".into()),
            "message 0".into(),
            at(0),
        );
        for n in 1..count {
            ticket.messages.push(TicketMessage {
                sender: if n % 2 == 0 { Actor::User } else { Actor::Support },
                text: Some(format!("message {}", n)),
                at: at(n as u32),
            });
        }
        ticket
    }

    #[test]
    fn test_card_shows_identity_and_status() {
        let card = render_ticket_card(&ticket_with_messages(1), 10, &i18n(), "en");
        assert!(card.contains("T-20250101-0001"));
        assert!(card.contains("@alice (ID:7)"));
        assert!(card.contains("status.new"));
        assert!(!card.contains("card.rating"));
    }

    #[test]
    fn test_history_limit_keeps_tail() {
        let card = render_ticket_card(&ticket_with_messages(15), 10, &i18n(), "en");
        assert!(!card.contains("message 4\n"));
        assert!(card.contains("message 5"));
        assert!(card.contains("message 14"));
    }

    #[test]
    fn test_zero_limit_shows_all() {
        let card = render_ticket_card(&ticket_with_messages(15), 0, &i18n(), "en");
        assert!(card.contains("message 0"));
        assert!(card.contains("message 14"));
    }

    #[test]
    fn test_rating_line_when_rated() {
        let mut ticket = ticket_with_messages(1);
        ticket.rated = true;
        ticket.rating = Some(Rating::Good);
        let card = render_ticket_card(&ticket, 10, &i18n(), "en");
        assert!(card.contains("⭐⭐ rating.good"));
    }

    #[test]
    fn test_media_marker_message() {
        let mut ticket = ticket_with_messages(1);
        ticket.messages.push(TicketMessage { sender: Actor::Support, text: None, at: at(1) });
        let card = render_ticket_card(&ticket, 10, &i18n(), "en");
        assert!(card.contains("[—]"));
    }
}
