//! Bot handlers module
//!
//! Telegram update handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for free-text and media input

pub mod callbacks;
pub mod commands;
pub mod messages;

pub use callbacks::handle_callback_query;
pub use commands::{handle_help, handle_start};
pub use messages::handle_message;
