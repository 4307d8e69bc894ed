//! Conversation session state
//!
//! Tracks what free-text input each chat is currently expected to provide,
//! plus the admin's current inbox filter and page. In-memory only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::views::inbox::InboxFilter;

/// What the next free-text message from a chat means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingQuestion,
    AwaitingSuggestion { cooldown_exempt: bool },
    AwaitingReview { cooldown_exempt: bool },
    AwaitingReply { ticket_id: String },
    AwaitingBanUserId,
    AwaitingBanReason { user_id: i64 },
    AwaitingUnbanUserId,
    AwaitingSearchInput,
}

/// Per-chat session storage
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    states: Arc<Mutex<HashMap<i64, SessionState>>>,
    inbox_views: Arc<Mutex<HashMap<i64, (InboxFilter, usize)>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, chat_id: i64, state: SessionState) {
        self.states.lock().await.insert(chat_id, state);
    }

    /// Remove and return the current state, ending the session
    pub async fn take(&self, chat_id: i64) -> Option<SessionState> {
        self.states.lock().await.remove(&chat_id)
    }

    pub async fn get(&self, chat_id: i64) -> Option<SessionState> {
        self.states.lock().await.get(&chat_id).cloned()
    }

    pub async fn clear(&self, chat_id: i64) {
        self.states.lock().await.remove(&chat_id);
    }

    /// Current inbox filter and page for an admin, defaulting to all/first
    pub async fn inbox_view(&self, admin_id: i64) -> (InboxFilter, usize) {
        self.inbox_views
            .lock()
            .await
            .get(&admin_id)
            .copied()
            .unwrap_or((InboxFilter::All, 0))
    }

    pub async fn set_inbox_view(&self, admin_id: i64, filter: InboxFilter, page: usize) {
        self.inbox_views.lock().await.insert(admin_id, (filter, page));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_ends_session() {
        let sessions = SessionStore::new();
        sessions.set(7, SessionState::AwaitingQuestion).await;
        assert_eq!(sessions.take(7).await, Some(SessionState::AwaitingQuestion));
        assert_eq!(sessions.get(7).await, None);
    }

    #[tokio::test]
    async fn test_state_carries_payload() {
        let sessions = SessionStore::new();
        sessions
            .set(1, SessionState::AwaitingReply { ticket_id: "T-20250101-0001".into() })
            .await;
        assert_eq!(
            sessions.get(1).await,
            Some(SessionState::AwaitingReply { ticket_id: "T-20250101-0001".into() })
        );
    }

    #[tokio::test]
    async fn test_inbox_view_defaults() {
        let sessions = SessionStore::new();
        assert_eq!(sessions.inbox_view(1).await, (InboxFilter::All, 0));
        sessions.set_inbox_view(1, InboxFilter::Working, 2).await;
        assert_eq!(sessions.inbox_view(1).await, (InboxFilter::Working, 2));
    }
}
