//! SupportBuddy Telegram Bot
//!
//! A single-admin support ticket bot. Users open tickets, the admin triages
//! them from an inline inbox, and closed tickets collect ratings and
//! feedback, with multi-language support and flat-file persistence.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;
pub mod views;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SupportBuddyError};

// Re-export main components for easy access
pub use i18n::I18n;
pub use services::{FeedbackService, TicketService};
pub use state::AppContext;
pub use storage::{BanRegistry, TicketStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
