//! Configuration management module
//!
//! This module handles loading and validation of application configuration
//! from TOML files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{
    BanConfig, BotConfig, FeedbackConfig, I18nConfig, LoggingConfig, Settings, StorageConfig,
    TicketConfig, UiConfig,
};
