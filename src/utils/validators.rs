//! Input validation helpers
//!
//! Free-text coming from Telegram is untrusted; everything the handlers feed
//! into the lifecycle service passes through here first.

use regex::Regex;

/// Check that a string is a fully-formed ticket ID (`T-YYYYMMDD-NNNN`)
pub fn is_ticket_id(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 15 || !input.starts_with("T-") || bytes[10] != b'-' {
        return false;
    }
    input[2..10].bytes().all(|b| b.is_ascii_digit())
        && input[11..].bytes().all(|b| b.is_ascii_digit())
}

/// Parse a positive user ID out of free text
pub fn parse_user_id(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Normalize a search query: trim and strip a leading `#`
pub fn normalize_search_query(input: &str) -> String {
    input.trim().trim_start_matches('#').to_string()
}

/// Check a display name against the configured link pattern
pub fn name_contains_link(pattern: &Regex, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    pattern.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ticket_id() {
        assert!(is_ticket_id("T-20250101-0007"));
        assert!(!is_ticket_id("T-2025-0007"));
        assert!(!is_ticket_id("X-20250101-0007"));
        assert!(!is_ticket_id("T-20250101-00070"));
        assert!(!is_ticket_id(""));
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(" 12345 "), Some(12345));
        assert_eq!(parse_user_id("-5"), None);
        assert_eq!(parse_user_id("abc"), None);
    }

    #[test]
    fn test_normalize_search_query() {
        assert_eq!(normalize_search_query("#0007"), "0007");
        assert_eq!(normalize_search_query("  0007  "), "0007");
        assert_eq!(normalize_search_query("T-20250101-0007"), "T-20250101-0007");
    }

    #[test]
    fn test_name_contains_link() {
        let pattern = Regex::new(r"(?i)(https?://|www\.|t\.me/|@)").unwrap();
        assert!(name_contains_link(&pattern, "visit t.me/spam"));
        assert!(name_contains_link(&pattern, "HTTPS://example.com"));
        assert!(name_contains_link(&pattern, "john @promo"));
        assert!(!name_contains_link(&pattern, "John Smith"));
        assert!(!name_contains_link(&pattern, ""));
    }
}
