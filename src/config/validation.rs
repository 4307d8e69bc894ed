//! Configuration validation
//!
//! Startup-time checks that reject configurations the bot cannot run with.

use regex::Regex;

use super::settings::{parse_utc_offset, Settings};
use crate::utils::errors::{Result, SupportBuddyError};

/// Validate the full settings tree, failing fast on the first problem
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.bot.token.is_empty() {
        return Err(SupportBuddyError::Config("bot.token is not set".to_string()));
    }

    if settings.bot.admin_id <= 0 {
        return Err(SupportBuddyError::Config("bot.admin_id is not set or invalid".to_string()));
    }

    if parse_utc_offset(&settings.tickets.utc_offset).is_none() {
        return Err(SupportBuddyError::Config(format!(
            "tickets.utc_offset is not a valid offset: {}",
            settings.tickets.utc_offset
        )));
    }

    if settings.ui.page_size == 0 {
        return Err(SupportBuddyError::Config("ui.page_size must be at least 1".to_string()));
    }

    if settings.feedback.cooldown_enabled && settings.feedback.cooldown_hours <= 0 {
        return Err(SupportBuddyError::Config(
            "feedback.cooldown_hours must be positive when the cooldown is enabled".to_string(),
        ));
    }

    if Regex::new(&settings.bans.name_link_pattern).is_err() {
        return Err(SupportBuddyError::Config(format!(
            "bans.name_link_pattern is not a valid regex: {}",
            settings.bans.name_link_pattern
        )));
    }

    if !settings
        .i18n
        .supported_languages
        .contains(&settings.i18n.default_language)
    {
        return Err(SupportBuddyError::Config(format!(
            "i18n.default_language '{}' is not in supported_languages",
            settings.i18n.default_language
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123:abc".to_string();
        settings.bot.admin_id = 1;
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_offset_rejected() {
        let mut settings = valid_settings();
        settings.tickets.utc_offset = "Moscow".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut settings = valid_settings();
        settings.ui.page_size = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut settings = valid_settings();
        settings.bans.name_link_pattern = "(".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
