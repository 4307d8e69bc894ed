//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub tickets: TicketConfig,
    pub feedback: FeedbackConfig,
    pub bans: BanConfig,
    pub ui: UiConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// The single administrator who triages tickets
    pub admin_id: i64,
}

/// Flat-file storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_file: String,
    pub banned_file: String,
}

/// Ticket lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketConfig {
    /// UTC offset used when computing the ID date prefix, e.g. "+03:00"
    pub utc_offset: String,
    /// Minimum length of the initial question text
    pub min_question_length: usize,
    /// How many trailing messages the admin card shows (0 = all)
    pub history_limit: usize,
    /// Horizon for `close_stale`, driven by an external trigger
    pub auto_close_after_hours: i64,
    /// Whether users may attach media to tickets
    pub allow_user_media: bool,
}

/// Feedback cooldown configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    pub cooldown_enabled: bool,
    pub cooldown_hours: i64,
}

/// Ban registry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BanConfig {
    pub default_reason: String,
    /// Pattern flagging links in display names, advisory only
    pub name_link_pattern: String,
}

/// Inbox rendering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    pub page_size: usize,
    pub preview_length: usize,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("SUPPORTBUDDY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SupportBuddyError> {
        super::validation::validate_settings(self)
    }

    /// Parse the configured UTC offset
    pub fn utc_offset(&self) -> Result<FixedOffset, crate::utils::errors::SupportBuddyError> {
        parse_utc_offset(&self.tickets.utc_offset).ok_or_else(|| {
            crate::utils::errors::SupportBuddyError::Config(format!(
                "invalid tickets.utc_offset: {}",
                self.tickets.utc_offset
            ))
        })
    }
}

/// Parse an offset string of the form "+HH:MM" or "-HH:MM"
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_id: 0,
            },
            storage: StorageConfig {
                data_file: "./bot_data/data.json".to_string(),
                banned_file: "./bot_data/banned.txt".to_string(),
            },
            tickets: TicketConfig {
                utc_offset: "+00:00".to_string(),
                min_question_length: 10,
                history_limit: 10,
                auto_close_after_hours: 24,
                allow_user_media: false,
            },
            feedback: FeedbackConfig {
                cooldown_enabled: true,
                cooldown_hours: 24,
            },
            bans: BanConfig {
                default_reason: "Rule violation".to_string(),
                name_link_pattern: r"(?i)(https?://|www\.|t\.me/|@)".to_string(),
            },
            ui: UiConfig {
                page_size: 10,
                preview_length: 100,
            },
            i18n: I18nConfig {
                default_language: "en".to_string(),
                supported_languages: vec!["en".to_string(), "ru".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "./bot_data/logs".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+03:00"), FixedOffset::east_opt(3 * 3600));
        assert_eq!(parse_utc_offset("-05:30"), FixedOffset::west_opt(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("+00:00"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("03:00"), FixedOffset::east_opt(3 * 3600));
        assert_eq!(parse_utc_offset("garbage"), None);
        assert_eq!(parse_utc_offset("+99:00"), None);
    }
}
