//! Ticket lifecycle service
//!
//! State transitions, turn-taking and ID generation. The service owns the
//! store behind one async mutex, so the read-then-write sections (ID
//! generation, one-active-ticket check) are atomic with respect to other
//! creators.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::models::{Actor, Rating, Ticket, TicketMessage, TicketStatus};
use crate::storage::{StoreStats, TicketStore, UserSettings};
use crate::utils::errors::{Result, SupportBuddyError};

/// Compute the next ticket ID for a date prefix: max numeric suffix + 1,
/// zero-padded to four digits, starting at 0001
pub(crate) fn next_ticket_id(store: &TicketStore, date_prefix: &str) -> String {
    let prefix = format!("T-{}-", date_prefix);
    let max = store
        .all()
        .filter_map(|t| t.id.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:04}", prefix, max + 1)
}

/// Lifecycle service coordinating all ticket mutations
#[derive(Clone)]
pub struct TicketService {
    store: Arc<Mutex<TicketStore>>,
    tz: FixedOffset,
}

impl TicketService {
    pub fn new(store: Arc<Mutex<TicketStore>>, tz: FixedOffset) -> Self {
        Self { store, tz }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Create a new ticket from a user's question
    ///
    /// Rejected while the user still has a ticket in `new` or `working`.
    pub async fn create_ticket(
        &self,
        user_id: i64,
        username: Option<String>,
        initial_text: String,
    ) -> Result<Ticket> {
        let mut store = self.store.lock().await;

        if let Some(active) = store.all().find(|t| t.user_id == user_id && t.status.is_active()) {
            return Err(SupportBuddyError::ActiveTicketExists { id: active.id.clone() });
        }

        let now = self.now();
        let id = next_ticket_id(&store, &now.format("%Y%m%d").to_string());
        let ticket = Ticket::open(id.clone(), user_id, username, initial_text, now);
        store.create(ticket.clone());
        info!(ticket_id = %id, user_id = user_id, "Created ticket");
        Ok(ticket)
    }

    /// Get a ticket by exact ID
    pub async fn get(&self, ticket_id: &str) -> Option<Ticket> {
        self.store.lock().await.get(ticket_id).cloned()
    }

    /// The user's current ticket in `new` or `working`, if any
    pub async fn active_ticket_for(&self, user_id: i64) -> Option<Ticket> {
        self.store
            .lock()
            .await
            .all()
            .find(|t| t.user_id == user_id && t.status.is_active())
            .cloned()
    }

    /// Append a user message under the turn-taking rule
    ///
    /// Allowed only while `last_actor == Support`; otherwise the user must
    /// wait for a reply.
    pub async fn add_user_message(&self, ticket_id: &str, text: Option<String>) -> Result<Ticket> {
        let mut store = self.store.lock().await;
        let mut ticket = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| SupportBuddyError::TicketNotFound { id: ticket_id.to_string() })?;

        if ticket.last_actor == Actor::User {
            return Err(SupportBuddyError::WaitForReply { id: ticket.id });
        }

        let now = self.now();
        ticket.messages.push(TicketMessage { sender: Actor::User, text, at: now });
        ticket.last_actor = Actor::User;
        ticket.last_activity_at = now;
        store.update(ticket.clone());
        info!(ticket_id = %ticket_id, "Added user message");
        Ok(ticket)
    }

    /// Append a support message; not subject to turn-taking
    ///
    /// The first support message stamps `first_response_at` exactly once and
    /// records the assignee when the ticket has none.
    pub async fn add_support_message(
        &self,
        ticket_id: &str,
        admin_id: i64,
        text: Option<String>,
    ) -> Result<Ticket> {
        let mut store = self.store.lock().await;
        let mut ticket = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| SupportBuddyError::TicketNotFound { id: ticket_id.to_string() })?;

        let now = self.now();
        ticket.messages.push(TicketMessage { sender: Actor::Support, text, at: now });
        ticket.last_actor = Actor::Support;
        ticket.last_activity_at = now;
        if ticket.first_response_at.is_none() {
            ticket.first_response_at = Some(now);
            if ticket.assigned.is_none() {
                ticket.assigned = Some(admin_id);
            }
        }
        store.update(ticket.clone());
        info!(ticket_id = %ticket_id, admin_id = admin_id, "Added support message");
        Ok(ticket)
    }

    /// Admin takes a ticket: `new -> working`
    pub async fn take(&self, ticket_id: &str, admin_id: i64) -> Result<Ticket> {
        let mut store = self.store.lock().await;
        let mut ticket = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| SupportBuddyError::TicketNotFound { id: ticket_id.to_string() })?;

        if ticket.status != TicketStatus::New {
            return Err(SupportBuddyError::InvalidTransition {
                id: ticket.id,
                status: ticket.status.as_str().to_string(),
            });
        }

        ticket.status = TicketStatus::Working;
        ticket.assigned = Some(admin_id);
        ticket.last_activity_at = self.now();
        store.update(ticket.clone());
        info!(ticket_id = %ticket_id, admin_id = admin_id, "Ticket taken");
        Ok(ticket)
    }

    /// Admin closes a ticket: `working -> done`
    pub async fn close(&self, ticket_id: &str) -> Result<Ticket> {
        let mut store = self.store.lock().await;
        let mut ticket = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| SupportBuddyError::TicketNotFound { id: ticket_id.to_string() })?;

        if ticket.status != TicketStatus::Working {
            return Err(SupportBuddyError::InvalidTransition {
                id: ticket.id,
                status: ticket.status.as_str().to_string(),
            });
        }

        ticket.status = TicketStatus::Done;
        ticket.last_activity_at = self.now();
        store.update(ticket.clone());
        info!(ticket_id = %ticket_id, "Ticket closed");
        Ok(ticket)
    }

    /// Record the user's quality rating; orthogonal to status
    pub async fn rate(&self, ticket_id: &str, rating: Rating) -> Result<Ticket> {
        let mut store = self.store.lock().await;
        let mut ticket = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| SupportBuddyError::TicketNotFound { id: ticket_id.to_string() })?;

        ticket.rated = true;
        ticket.rating = Some(rating);
        store.update(ticket.clone());
        info!(ticket_id = %ticket_id, rating = rating.as_str(), "Ticket rated");
        Ok(ticket)
    }

    /// Close every ticket currently in `new` or `working`, reporting the count
    pub async fn clear_active(&self) -> usize {
        let mut store = self.store.lock().await;
        let active: Vec<Ticket> = store
            .by_status(TicketStatus::New)
            .chain(store.by_status(TicketStatus::Working))
            .cloned()
            .collect();
        let count = active.len();
        let now = self.now();
        for mut ticket in active {
            ticket.status = TicketStatus::Done;
            ticket.last_activity_at = now;
            store.update(ticket);
        }
        info!(count = count, "Cleared active tickets");
        count
    }

    /// Close active tickets idle longer than the horizon
    ///
    /// Driven by an external periodic trigger; the service never schedules
    /// itself.
    pub async fn close_stale(&self, horizon_hours: i64) -> Vec<String> {
        let mut store = self.store.lock().await;
        let now = self.now();
        let cutoff = now - Duration::hours(horizon_hours);
        let stale: Vec<Ticket> = store
            .all()
            .filter(|t| t.status.is_active() && t.last_activity_at < cutoff)
            .cloned()
            .collect();
        let mut closed = Vec::with_capacity(stale.len());
        for mut ticket in stale {
            ticket.status = TicketStatus::Done;
            ticket.last_activity_at = now;
            closed.push(ticket.id.clone());
            store.update(ticket);
        }
        if !closed.is_empty() {
            info!(count = closed.len(), "Auto-closed stale tickets");
        }
        closed
    }

    /// Snapshot of every ticket in storage iteration order
    pub async fn snapshot(&self) -> Vec<Ticket> {
        self.store.lock().await.all().cloned().collect()
    }

    /// Aggregate counters for the stats screen
    pub async fn stats(&self) -> StoreStats {
        self.store.lock().await.stats()
    }

    /// Persisted locale for a user, if any
    pub async fn user_locale(&self, user_id: i64) -> Option<String> {
        self.store.lock().await.user_settings(user_id).locale
    }

    /// Persist a user's locale choice
    pub async fn set_user_locale(&self, user_id: i64, locale: String) {
        let mut store = self.store.lock().await;
        let mut settings = store.user_settings(user_id);
        settings.locale = Some(locale);
        store.update_user_settings(user_id, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service(dir: &tempfile::TempDir) -> TicketService {
        let store = TicketStore::load(dir.path().join("data.json"));
        TicketService::new(Arc::new(Mutex::new(store)), FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn test_id_sequence_for_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TicketStore::load(dir.path().join("data.json"));
        let at = Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap());

        for n in 1..=12 {
            let id = next_ticket_id(&store, "20250101");
            assert_eq!(id, format!("T-20250101-{:04}", n));
            store.create(Ticket::open(id, n, None, "question text".into(), at));
        }
        // Another day starts its own sequence
        assert_eq!(next_ticket_id(&store, "20250102"), "T-20250102-0001");
    }

    #[tokio::test]
    async fn test_serial_creation_yields_gapless_ids() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let mut ids = Vec::new();
        for user in 1..=5 {
            let ticket = svc
                .create_ticket(user, None, "a long enough question".into())
                .await
                .unwrap();
            ids.push(ticket.id);
        }
        let prefix = &ids[0][..11];
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*id, format!("{}{:04}", prefix, i + 1));
        }
    }

    #[tokio::test]
    async fn test_one_active_ticket_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let first = svc.create_ticket(7, None, "first question".into()).await.unwrap();
        assert_matches!(
            svc.create_ticket(7, None, "second question".into()).await,
            Err(SupportBuddyError::ActiveTicketExists { id }) if id == first.id
        );

        svc.take(&first.id, 1).await.unwrap();
        assert_matches!(
            svc.create_ticket(7, None, "still blocked".into()).await,
            Err(SupportBuddyError::ActiveTicketExists { .. })
        );

        svc.close(&first.id).await.unwrap();
        let second = svc.create_ticket(7, None, "now allowed".into()).await.unwrap();
        assert_ne!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_turn_taking() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let ticket = svc.create_ticket(7, None, "initial question".into()).await.unwrap();

        // Fresh ticket: last_actor is the user, further user input rejected
        assert_matches!(
            svc.add_user_message(&ticket.id, Some("me again".into())).await,
            Err(SupportBuddyError::WaitForReply { .. })
        );

        let ticket = svc
            .add_support_message(&ticket.id, 1, Some("hello".into()))
            .await
            .unwrap();
        assert_eq!(ticket.last_actor, Actor::Support);

        let ticket = svc
            .add_user_message(&ticket.id, Some("thanks".into()))
            .await
            .unwrap();
        assert_eq!(ticket.last_actor, Actor::User);
        assert_eq!(ticket.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_first_response_set_once() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let ticket = svc.create_ticket(7, None, "initial question".into()).await.unwrap();

        let after_first = svc
            .add_support_message(&ticket.id, 42, Some("first reply".into()))
            .await
            .unwrap();
        let stamp = after_first.first_response_at.unwrap();
        assert_eq!(after_first.assigned, Some(42));

        let after_second = svc
            .add_support_message(&ticket.id, 42, Some("second reply".into()))
            .await
            .unwrap();
        assert_eq!(after_second.first_response_at, Some(stamp));
    }

    #[tokio::test]
    async fn test_transition_closure() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let ticket = svc.create_ticket(7, None, "initial question".into()).await.unwrap();

        // close only succeeds from working
        assert_matches!(
            svc.close(&ticket.id).await,
            Err(SupportBuddyError::InvalidTransition { .. })
        );

        svc.take(&ticket.id, 1).await.unwrap();
        // take only succeeds from new
        assert_matches!(
            svc.take(&ticket.id, 1).await,
            Err(SupportBuddyError::InvalidTransition { .. })
        );

        svc.close(&ticket.id).await.unwrap();
        // done is terminal
        assert_matches!(
            svc.take(&ticket.id, 1).await,
            Err(SupportBuddyError::InvalidTransition { .. })
        );
        assert_matches!(
            svc.close(&ticket.id).await,
            Err(SupportBuddyError::InvalidTransition { .. })
        );
        // unknown IDs report not-found without mutating anything
        assert_matches!(
            svc.take("T-19990101-0001", 1).await,
            Err(SupportBuddyError::TicketNotFound { .. })
        );
        assert_matches!(
            svc.close("T-19990101-0001").await,
            Err(SupportBuddyError::TicketNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_rating_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let ticket = svc.create_ticket(7, None, "initial question".into()).await.unwrap();
        svc.take(&ticket.id, 1).await.unwrap();
        svc.close(&ticket.id).await.unwrap();

        let rated = svc.rate(&ticket.id, Rating::Excellent).await.unwrap();
        assert!(rated.rated);
        assert_eq!(rated.rating, Some(Rating::Excellent));
        assert_eq!(rated.status, TicketStatus::Done);
    }

    #[tokio::test]
    async fn test_clear_active() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let a = svc.create_ticket(1, None, "question one".into()).await.unwrap();
        let b = svc.create_ticket(2, None, "question two".into()).await.unwrap();
        svc.take(&b.id, 1).await.unwrap();
        svc.close(&b.id).await.unwrap();
        svc.create_ticket(3, None, "question three".into()).await.unwrap();

        assert_eq!(svc.clear_active().await, 2);
        assert_eq!(svc.get(&a.id).await.unwrap().status, TicketStatus::Done);
        assert_eq!(svc.clear_active().await, 0);
    }

    #[tokio::test]
    async fn test_close_stale_uses_horizon() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let fresh = svc.create_ticket(1, None, "fresh question".into()).await.unwrap();
        let old = svc.create_ticket(2, None, "old question".into()).await.unwrap();

        // Age the second ticket past the horizon
        {
            let mut store = svc.store.lock().await;
            let mut aged = store.get(&old.id).cloned().unwrap();
            aged.last_activity_at = aged.last_activity_at - Duration::hours(48);
            store.update(aged);
        }

        let closed = svc.close_stale(24).await;
        assert_eq!(closed, vec![old.id.clone()]);
        assert_eq!(svc.get(&fresh.id).await.unwrap().status, TicketStatus::New);
        assert_eq!(svc.get(&old.id).await.unwrap().status, TicketStatus::Done);
    }

    #[tokio::test]
    async fn test_user_locale_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        assert_eq!(svc.user_locale(7).await, None);
        svc.set_user_locale(7, "ru".into()).await;
        assert_eq!(svc.user_locale(7).await.as_deref(), Some("ru"));
    }
}
