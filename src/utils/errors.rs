//! Error handling for SupportBuddy
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for SupportBuddy application
#[derive(Error, Debug)]
pub enum SupportBuddyError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ticket not found: {id}")]
    TicketNotFound { id: String },

    #[error("Feedback not found: {id}")]
    FeedbackNotFound { id: String },

    #[error("User already has an active ticket: {id}")]
    ActiveTicketExists { id: String },

    #[error("Invalid ticket transition: {id} is {status}")]
    InvalidTransition { id: String, status: String },

    #[error("User must wait for a support reply on ticket {id}")]
    WaitForReply { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for SupportBuddy operations
pub type Result<T> = std::result::Result<T, SupportBuddyError>;

impl SupportBuddyError {
    /// Check if the error should be surfaced to the actor as a corrective
    /// message rather than logged as a fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SupportBuddyError::TicketNotFound { .. }
                | SupportBuddyError::FeedbackNotFound { .. }
                | SupportBuddyError::ActiveTicketExists { .. }
                | SupportBuddyError::InvalidTransition { .. }
                | SupportBuddyError::WaitForReply { .. }
                | SupportBuddyError::InvalidInput(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SupportBuddyError::Config(_) => ErrorSeverity::Critical,
            SupportBuddyError::Io(_) => ErrorSeverity::Error,
            SupportBuddyError::Serialization(_) => ErrorSeverity::Error,
            SupportBuddyError::Telegram(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
