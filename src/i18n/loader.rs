//! Translation loader and i18n management
//!
//! Loads per-language JSON files with nested keys ("inbox.no_tickets"),
//! formats `{name}` placeholders and picks plural forms for en/ru.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{Result, SupportBuddyError};

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    default_language: String,
    supported_languages: Vec<String>,
}

impl I18n {
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
        }
    }

    /// Load all translation files from `dir` (one `<lang>.json` per language)
    ///
    /// A missing or broken file for the default language is fatal; other
    /// languages degrade to the default with a warning.
    pub async fn load_translations(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let supported_languages = self.supported_languages.clone();

        for lang_code in &supported_languages {
            let file_path = dir.join(format!("{}.json", lang_code));

            if !file_path.exists() {
                warn!("Translation file not found: {}", file_path.display());
                if lang_code == &self.default_language {
                    return Err(SupportBuddyError::Config(format!(
                        "Default language translation file not found: {}",
                        file_path.display()
                    )));
                }
                continue;
            }

            match self.load_language_file(&file_path, lang_code).await {
                Ok(()) => info!("Loaded translations for language: {}", lang_code),
                Err(e) => {
                    error!("Failed to load translations for {}: {}", lang_code, e);
                    if lang_code == &self.default_language {
                        return Err(SupportBuddyError::Config(format!(
                            "Failed to load default language translations: {}",
                            e
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<()> {
        let content = fs::read_to_string(file_path).await?;
        let translations: Value = serde_json::from_str(&content)?;

        match translations {
            Value::Object(map) => {
                debug!("Loaded {} top-level translation keys for {}", map.len(), lang_code);
                self.translations.insert(lang_code.to_string(), map);
                Ok(())
            }
            _ => Err(SupportBuddyError::Config(format!(
                "Invalid translation file format for {}",
                lang_code
            ))),
        }
    }

    /// Get a translated message
    ///
    /// Falls back to the default language, then to the key itself, so a
    /// missing translation never breaks a screen.
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.effective_language(lang);

        if let Some(value) = self.lookup(key, &effective_lang) {
            return self.format_message(&extract_text(&value), params);
        }
        if effective_lang != self.default_language {
            if let Some(value) = self.lookup(key, &self.default_language) {
                return self.format_message(&extract_text(&value), params);
            }
        }
        warn!("Translation key '{}' not found", key);
        key.to_string()
    }

    /// Get a translated message with pluralization ("{key}.one" etc.)
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.effective_language(lang);
        let plural_key = format!("{}.{}", key, plural_form(count, &effective_lang));

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        self.t(&plural_key, &effective_lang, Some(&final_params))
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Map a Telegram language code onto a supported language
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        if let Some(lang) = telegram_lang {
            // "en-US" -> "en"
            let lang_code = lang.split('-').next().unwrap_or(lang);
            if self.is_language_supported(lang_code) {
                return lang_code.to_string();
            }
        }
        self.default_language.clone()
    }

    fn effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Resolve a dotted key against the nested JSON structure
    fn lookup(&self, key: &str, lang: &str) -> Option<Value> {
        let mut current = self.translations.get(lang).map(|m| Value::Object(m.clone()))?;
        for part in key.split('.') {
            current = current.get(part)?.clone();
        }
        Some(current)
    }

    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        match params {
            Some(params) => {
                let mut result = template.to_string();
                for (key, value) in params {
                    result = result.replace(&format!("{{{}}}", key), value);
                }
                result
            }
            None => template.to_string(),
        }
    }
}

fn extract_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("other")
            .or_else(|| obj.values().next())
            .map(extract_text)
            .unwrap_or_default(),
        _ => value.to_string(),
    }
}

fn plural_form(count: i64, lang: &str) -> &'static str {
    match lang {
        "ru" => {
            let abs_count = count.abs();
            let last_digit = abs_count % 10;
            let last_two = abs_count % 100;
            if last_digit == 1 && last_two != 11 {
                "one"
            } else if (2..=4).contains(&last_digit) && !(12..=14).contains(&last_two) {
                "few"
            } else {
                "many"
            }
        }
        _ => {
            if count == 1 {
                "one"
            } else {
                "other"
            }
        }
    }
}
