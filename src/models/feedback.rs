//! Feedback model
//!
//! A suggestion or review submitted independently of any ticket.

use serde::{Deserialize, Serialize};

/// Kind of standalone feedback a user can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Suggestion,
    Review,
}

impl FeedbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::Suggestion => "suggestion",
            FeedbackKind::Review => "review",
        }
    }

    /// Short prefix used in generated feedback IDs
    pub fn id_prefix(self) -> &'static str {
        match self {
            FeedbackKind::Suggestion => "sug",
            FeedbackKind::Review => "rev",
        }
    }
}

/// A feedback card handed to the admin
///
/// Created on submission, mutated once (`thanked = true`), never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub user_id: i64,
    pub kind: FeedbackKind,
    pub text: String,
    pub thanked: bool,
    /// The rendered card in the admin chat, toggled when thanked
    pub message_id: Option<i32>,
}
