//! Ticket model
//!
//! A ticket is a user's support request and its full conversation thread.
//! One canonical message shape is used everywhere; the renderer never has to
//! guess what it was handed.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    New,
    Working,
    Done,
}

impl TicketStatus {
    pub fn is_active(self) -> bool {
        matches!(self, TicketStatus::New | TicketStatus::Working)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Working => "working",
            TicketStatus::Done => "done",
        }
    }
}

/// Which side of the conversation authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Support,
}

/// Post-close quality rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Ok,
}

impl Rating {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "excellent" => Some(Rating::Excellent),
            "good" => Some(Rating::Good),
            "ok" => Some(Rating::Ok),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Ok => "ok",
        }
    }
}

/// One message inside a ticket thread
///
/// `text` is absent for pure-media markers, which instead carry a bracketed
/// media-type label produced by the handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub sender: Actor,
    pub text: Option<String>,
    pub at: DateTime<FixedOffset>,
}

/// A support ticket and its conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub status: TicketStatus,
    pub messages: Vec<TicketMessage>,
    #[serde(default)]
    pub assigned: Option<i64>,
    pub last_actor: Actor,
    pub last_activity_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub first_response_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub rating: Option<Rating>,
    // Reserved for a feedback-solicitation flow; persisted but not driven
    // by any current transition.
    #[serde(default)]
    pub feedback_invited: bool,
    #[serde(default)]
    pub review_received: bool,
    #[serde(default)]
    pub suggestion_received: bool,
}

impl Ticket {
    /// Create a fresh ticket from the user's initial question
    pub fn open(
        id: String,
        user_id: i64,
        username: Option<String>,
        initial_text: String,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id,
            user_id,
            username,
            created_at: now,
            status: TicketStatus::New,
            messages: vec![TicketMessage {
                sender: Actor::User,
                text: Some(initial_text),
                at: now,
            }],
            assigned: None,
            last_actor: Actor::User,
            last_activity_at: now,
            first_response_at: None,
            rated: false,
            rating: None,
            feedback_invited: false,
            review_received: false,
            suggestion_received: false,
        }
    }

    /// First user message text, used for inbox previews
    pub fn first_message_text(&self) -> Option<&str> {
        self.messages.first().and_then(|m| m.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_open_sets_turn_to_user() {
        let ticket = Ticket::open("T-20250101-0001".into(), 7, None, "help me".into(), now());
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.last_actor, Actor::User);
        assert_eq!(ticket.messages.len(), 1);
        assert!(ticket.first_response_at.is_none());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&TicketStatus::Working).unwrap(), "\"working\"");
        assert_eq!(
            serde_json::from_str::<Actor>("\"support\"").unwrap(),
            Actor::Support
        );
    }

    #[test]
    fn test_rating_parse() {
        assert_eq!(Rating::parse("excellent"), Some(Rating::Excellent));
        assert_eq!(Rating::parse("meh"), None);
    }
}
