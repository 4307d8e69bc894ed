//! Internationalization module
//!
//! Multi-language support: translation loading, language detection and
//! message formatting for the bot's two audiences (users and the admin).

pub mod loader;

pub use loader::{I18n, TranslationParams};
