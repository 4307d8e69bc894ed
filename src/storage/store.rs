//! Flat-file ticket store
//!
//! In-memory table of tickets and per-user settings, serialized to one JSON
//! document on every mutating call. The process is the only writer; callers
//! serialize access through the lifecycle service's lock.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::models::{Ticket, TicketStatus};

/// Per-user settings bag persisted alongside tickets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub locale: Option<String>,
}

/// The persisted document: two top-level collections
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    tickets: BTreeMap<String, Ticket>,
    #[serde(default)]
    users: BTreeMap<String, UserSettings>,
}

/// Aggregate counters for the admin stats screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_users: usize,
    pub total_tickets: usize,
    pub active_tickets: usize,
    pub closed_tickets: usize,
}

/// In-memory ticket table durable to a flat file
#[derive(Debug)]
pub struct TicketStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl TicketStore {
    /// Load the store from disk, degrading to an empty store when the file
    /// is missing or malformed
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StoreDocument>(&raw) {
                Ok(doc) => {
                    info!(
                        tickets = doc.tickets.len(),
                        users = doc.users.len(),
                        "Loaded ticket store"
                    );
                    doc
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Ticket store file is malformed, starting empty");
                    StoreDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Ticket store file not found, starting empty");
                StoreDocument::default()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read ticket store, starting empty");
                StoreDocument::default()
            }
        };
        Self { path, doc }
    }

    /// Persist the whole table; save failures are logged, not retried
    fn save(&self) {
        if let Err(e) = self.try_save() {
            error!(path = %self.path.display(), error = %e, "Failed to save ticket store");
        }
    }

    fn try_save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.doc)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, raw)
    }

    /// Get a ticket by exact ID
    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.doc.tickets.get(id)
    }

    /// Insert a new ticket and persist immediately
    pub fn create(&mut self, ticket: Ticket) {
        self.doc.tickets.insert(ticket.id.clone(), ticket);
        self.save();
    }

    /// Replace an existing ticket; no-op when the ticket is absent
    pub fn update(&mut self, ticket: Ticket) {
        if !self.doc.tickets.contains_key(&ticket.id) {
            warn!(ticket_id = %ticket.id, "Update for unknown ticket ignored");
            return;
        }
        self.doc.tickets.insert(ticket.id.clone(), ticket);
        self.save();
    }

    /// All tickets in storage iteration order
    pub fn all(&self) -> impl Iterator<Item = &Ticket> {
        self.doc.tickets.values()
    }

    /// Tickets currently in one status, storage iteration order
    pub fn by_status(&self, status: TicketStatus) -> impl Iterator<Item = &Ticket> {
        self.doc.tickets.values().filter(move |t| t.status == status)
    }

    /// Settings bag for a user, defaulted when unseen
    pub fn user_settings(&self, user_id: i64) -> UserSettings {
        self.doc
            .users
            .get(&user_id.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Merge updated settings for a user and persist
    pub fn update_user_settings(&mut self, user_id: i64, settings: UserSettings) {
        self.doc.users.insert(user_id.to_string(), settings);
        self.save();
    }

    /// Aggregate counters
    pub fn stats(&self) -> StoreStats {
        let total_tickets = self.doc.tickets.len();
        let active_tickets = self
            .doc
            .tickets
            .values()
            .filter(|t| t.status.is_active())
            .count();
        StoreStats {
            total_users: self.doc.users.len(),
            total_tickets,
            active_tickets,
            closed_tickets: total_tickets - active_tickets,
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Actor, Rating, TicketMessage};
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn ts(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 1, h, m, 0)
            .unwrap()
    }

    fn sample_ticket(id: &str, user_id: i64) -> Ticket {
        let mut ticket = Ticket::open(
            id.to_string(),
            user_id,
            Some("alice".to_string()),
            "Спец-symbols: \"quotes\" & <tags> | pipes\nsecond line".to_string(),
            ts(10, 0),
        );
        ticket.messages.push(TicketMessage {
            sender: Actor::Support,
            text: Some("On it".to_string()),
            at: ts(10, 5),
        });
        ticket.messages.push(TicketMessage {
            sender: Actor::User,
            text: None,
            at: ts(10, 6),
        });
        ticket.first_response_at = Some(ts(10, 5));
        ticket.rated = true;
        ticket.rating = Some(Rating::Good);
        ticket
    }

    #[test]
    fn test_round_trip_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = TicketStore::load(&path);
        store.create(sample_ticket("T-20250101-0001", 7));
        store.create(sample_ticket("T-20250101-0002", 8));
        store.update_user_settings(7, UserSettings { locale: Some("ru".to_string()) });

        let reloaded = TicketStore::load(&path);
        assert_eq!(
            reloaded.get("T-20250101-0001"),
            store.get("T-20250101-0001")
        );
        assert_eq!(
            reloaded.get("T-20250101-0002"),
            store.get("T-20250101-0002")
        );
        assert_eq!(reloaded.user_settings(7).locale.as_deref(), Some("ru"));
        assert_eq!(reloaded.user_settings(99), UserSettings::default());
    }

    #[test]
    fn test_malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TicketStore::load(&path);
        assert_eq!(store.all().count(), 0);
        assert_eq!(store.stats().total_tickets, 0);
    }

    #[test]
    fn test_update_unknown_ticket_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TicketStore::load(dir.path().join("data.json"));
        store.update(sample_ticket("T-20250101-0009", 7));
        assert!(store.get("T-20250101-0009").is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_stats_counts_by_activity() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TicketStore::load(dir.path().join("data.json"));
        let mut closed = sample_ticket("T-20250101-0001", 7);
        closed.status = TicketStatus::Done;
        store.create(closed);
        store.create(sample_ticket("T-20250101-0002", 8));

        let stats = store.stats();
        assert_eq!(stats.total_tickets, 2);
        assert_eq!(stats.active_tickets, 1);
        assert_eq!(stats.closed_tickets, 1);

        assert_eq!(store.by_status(TicketStatus::Done).count(), 1);
        assert_eq!(store.by_status(TicketStatus::New).count(), 1);
        assert_eq!(store.by_status(TicketStatus::Working).count(), 0);
    }
}
