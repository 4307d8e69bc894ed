//! Application context
//!
//! The single composition root: everything the handlers need, wired once at
//! startup and injected through the dispatcher.

use std::sync::Arc;

use regex::Regex;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Settings;
use crate::i18n::I18n;
use crate::services::{FeedbackService, TicketService};
use crate::state::screens::ScreenTracker;
use crate::state::session::SessionStore;
use crate::storage::{BanRegistry, TicketStore};
use crate::utils::errors::{Result, SupportBuddyError};

/// Application-wide context containing services and settings
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub tickets: TicketService,
    pub feedback: FeedbackService,
    pub bans: Arc<Mutex<BanRegistry>>,
    pub screens: ScreenTracker,
    pub sessions: SessionStore,
    pub i18n: Arc<I18n>,
}

impl AppContext {
    /// Wire the full application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let tz = settings.utc_offset()?;

        let store = Arc::new(Mutex::new(TicketStore::load(&settings.storage.data_file)));
        let tickets = TicketService::new(store, tz);

        let link_pattern = Regex::new(&settings.bans.name_link_pattern)
            .map_err(|e| SupportBuddyError::Config(format!("Invalid name link pattern: {}", e)))?;
        let bans = Arc::new(Mutex::new(BanRegistry::load(
            &settings.storage.banned_file,
            settings.bans.default_reason.clone(),
            link_pattern,
        )));

        let mut i18n = I18n::new(&settings.i18n);
        i18n.load_translations("translations").await?;

        info!("Application context initialized");
        Ok(Self {
            feedback: FeedbackService::new(settings.feedback.clone()),
            tickets,
            bans,
            screens: ScreenTracker::new(),
            sessions: SessionStore::new(),
            i18n: Arc::new(i18n),
            settings,
        })
    }

    pub fn admin_id(&self) -> i64 {
        self.settings.bot.admin_id
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.settings.bot.admin_id
    }

    /// Resolve a user's display language: stored preference, else default
    pub async fn user_lang(&self, user_id: i64) -> String {
        match self.tickets.user_locale(user_id).await {
            Some(lang) if self.i18n.is_language_supported(&lang) => lang,
            _ => self.i18n.default_language().to_string(),
        }
    }
}
