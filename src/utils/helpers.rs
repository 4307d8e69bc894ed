//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, FixedOffset};

/// Truncate text to a maximum number of characters with ellipsis
///
/// Operates on characters, not bytes, so multi-byte input never panics.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Format a timestamp for card and inbox display
pub fn format_timestamp(timestamp: DateTime<FixedOffset>) -> String {
    timestamp.format("%d.%m.%Y %H:%M").to_string()
}

/// Format a timestamp as time-of-day only (message history lines)
pub fn format_time(timestamp: DateTime<FixedOffset>) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Render the user identity shown to the admin
pub fn display_identity(username: Option<&str>, user_id: i64) -> String {
    match username {
        Some(name) => format!("@{} (ID:{})", name, user_id),
        None => format!("ID:{}", user_id),
    }
}
