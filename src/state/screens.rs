//! Admin screen message tracking
//!
//! Maps of "which rendered message currently occupies this screen slot".
//! Each slot holds at most one live entry; showing a new instance of a
//! screen first takes the previous ID out so the caller can delete it.
//! Owned state, passed through the app context; no global statics.

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::MessageId;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct ScreenMaps {
    /// Per-admin root screen, edited in place across interactions
    root: HashMap<i64, MessageId>,
    /// Per-admin inbox listing message
    inbox: HashMap<i64, MessageId>,
    /// Per-admin search prompt/result message
    search: HashMap<i64, MessageId>,
    /// Per-admin how-to-reply hint message
    instruction: HashMap<i64, MessageId>,
    /// Per-ticket card shown to the admin
    cards: HashMap<String, MessageId>,
}

/// Tracker for the single live message behind every admin screen slot
#[derive(Debug, Clone, Default)]
pub struct ScreenTracker {
    maps: Arc<Mutex<ScreenMaps>>,
}

impl ScreenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn root(&self, admin_id: i64) -> Option<MessageId> {
        self.maps.lock().await.root.get(&admin_id).copied()
    }

    pub async fn set_root(&self, admin_id: i64, message_id: MessageId) {
        self.maps.lock().await.root.insert(admin_id, message_id);
    }

    /// Remove and return the tracked inbox listing, if any
    pub async fn take_inbox(&self, admin_id: i64) -> Option<MessageId> {
        self.maps.lock().await.inbox.remove(&admin_id)
    }

    pub async fn set_inbox(&self, admin_id: i64, message_id: MessageId) {
        self.maps.lock().await.inbox.insert(admin_id, message_id);
    }

    /// Remove and return the tracked search screen, if any
    pub async fn take_search(&self, admin_id: i64) -> Option<MessageId> {
        self.maps.lock().await.search.remove(&admin_id)
    }

    pub async fn set_search(&self, admin_id: i64, message_id: MessageId) {
        self.maps.lock().await.search.insert(admin_id, message_id);
    }

    pub async fn take_instruction(&self, admin_id: i64) -> Option<MessageId> {
        self.maps.lock().await.instruction.remove(&admin_id)
    }

    pub async fn set_instruction(&self, admin_id: i64, message_id: MessageId) {
        self.maps.lock().await.instruction.insert(admin_id, message_id);
    }

    pub async fn card(&self, ticket_id: &str) -> Option<MessageId> {
        self.maps.lock().await.cards.get(ticket_id).copied()
    }

    pub async fn set_card(&self, ticket_id: &str, message_id: MessageId) {
        self.maps.lock().await.cards.insert(ticket_id.to_string(), message_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slots_hold_one_entry_per_key() {
        let tracker = ScreenTracker::new();
        tracker.set_inbox(1, MessageId(10)).await;
        tracker.set_inbox(1, MessageId(11)).await;

        assert_eq!(tracker.take_inbox(1).await, Some(MessageId(11)));
        assert_eq!(tracker.take_inbox(1).await, None);
    }

    #[tokio::test]
    async fn test_maps_are_independent() {
        let tracker = ScreenTracker::new();
        tracker.set_root(1, MessageId(1)).await;
        tracker.set_search(1, MessageId(2)).await;
        tracker.set_card("T-20250101-0001", MessageId(3)).await;

        assert_eq!(tracker.root(1).await, Some(MessageId(1)));
        assert_eq!(tracker.take_search(1).await, Some(MessageId(2)));
        assert_eq!(tracker.card("T-20250101-0001").await, Some(MessageId(3)));
        assert_eq!(tracker.card("T-20250101-0002").await, None);
    }
}
