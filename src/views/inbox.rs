//! Inbox view builder
//!
//! Builds the admin's filtered, paginated ticket listing as pure data: text
//! plus control layout, no transport access. The caller decides how to put
//! it on screen.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::config::UiConfig;
use crate::i18n::I18n;
use crate::models::{Ticket, TicketStatus};
use crate::utils::helpers::{display_identity, format_timestamp, truncate_text};
use crate::utils::validators::normalize_search_query;

/// Inbox filter over ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxFilter {
    All,
    New,
    Working,
    Done,
}

impl InboxFilter {
    pub const ALL: [InboxFilter; 4] = [
        InboxFilter::All,
        InboxFilter::New,
        InboxFilter::Working,
        InboxFilter::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InboxFilter::All => "all",
            InboxFilter::New => "new",
            InboxFilter::Working => "working",
            InboxFilter::Done => "done",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(InboxFilter::All),
            "new" => Some(InboxFilter::New),
            "working" => Some(InboxFilter::Working),
            "done" => Some(InboxFilter::Done),
            _ => None,
        }
    }

    pub fn matches(self, ticket: &Ticket) -> bool {
        match self {
            InboxFilter::All => true,
            InboxFilter::New => ticket.status == TicketStatus::New,
            InboxFilter::Working => ticket.status == TicketStatus::Working,
            InboxFilter::Done => ticket.status == TicketStatus::Done,
        }
    }

    fn label(self, i18n: &I18n, lang: &str) -> String {
        i18n.t(&format!("inbox.filter_{}", self.as_str()), lang, None)
    }
}

/// A rendered inbox page: text plus control layout
#[derive(Debug, Clone)]
pub struct InboxPage {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
    pub page: usize,
    pub total_pages: usize,
}

pub(crate) fn status_glyph(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::New => "🆕",
        TicketStatus::Working => "⏳",
        TicketStatus::Done => "✅",
    }
}

/// Multi-line preview block for one ticket
fn ticket_preview(ticket: &Ticket, preview_length: usize) -> String {
    let excerpt = ticket
        .first_message_text()
        .map(|t| truncate_text(t, preview_length))
        .unwrap_or_else(|| "—".to_string());
    format!(
        "{} {}\n👤 {}\n📅 {}\n💬 {}",
        status_glyph(ticket.status),
        ticket.id,
        display_identity(ticket.username.as_deref(), ticket.user_id),
        format_timestamp(ticket.created_at),
        excerpt
    )
}

/// Build the inbox listing for `(filter, page)`
pub fn build_inbox(
    tickets: &[Ticket],
    filter: InboxFilter,
    page: usize,
    ui: &UiConfig,
    i18n: &I18n,
    lang: &str,
) -> InboxPage {
    let mut selected: Vec<&Ticket> = tickets.iter().filter(|t| filter.matches(t)).collect();
    // Newest first, single stable key
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = selected.len();
    let total_pages = std::cmp::max(1, total.div_ceil(ui.page_size));
    let start = page.saturating_mul(ui.page_size);
    let page_tickets: &[&Ticket] = if start >= total {
        &[]
    } else {
        &selected[start..std::cmp::min(start + ui.page_size, total)]
    };

    let mut params = std::collections::HashMap::new();
    params.insert("page".to_string(), (page + 1).to_string());
    params.insert("total".to_string(), total_pages.to_string());
    let header = format!(
        "📥 {} ({}) | {}",
        i18n.t("inbox.title", lang, None),
        filter.label(i18n, lang),
        i18n.t("inbox.page", lang, Some(&params))
    );

    let text = if page_tickets.is_empty() {
        format!("{}\n\n{}", header, i18n.t("inbox.no_tickets", lang, None))
    } else {
        let previews: Vec<String> = page_tickets
            .iter()
            .map(|t| ticket_preview(t, ui.preview_length))
            .collect();
        format!("{}\n\n{}", header, previews.join("\n\n"))
    };

    // Filter row with the active filter marked
    let filter_row: Vec<InlineKeyboardButton> = InboxFilter::ALL
        .iter()
        .map(|f| {
            let marker = if *f == filter { "✅ " } else { "" };
            InlineKeyboardButton::callback(
                format!("{}{}", marker, f.label(i18n, lang)),
                format!("inbox_filter:{}", f.as_str()),
            )
        })
        .collect();

    // Prev/next only when applicable
    let mut nav_row = Vec::new();
    if page > 0 {
        nav_row.push(InlineKeyboardButton::callback(
            format!("◀️ {}", i18n.t("buttons.back", lang, None)),
            format!("inbox_page:{}", page - 1),
        ));
    }
    if page + 1 < total_pages {
        nav_row.push(InlineKeyboardButton::callback(
            format!("{} ▶️", i18n.t("buttons.forward", lang, None)),
            format!("inbox_page:{}", page + 1),
        ));
    }

    let mut rows = vec![filter_row];
    if !nav_row.is_empty() {
        rows.push(nav_row);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        i18n.t("search.button", lang, None),
        "search_start".to_string(),
    )]);
    rows.push(vec![InlineKeyboardButton::callback(
        format!("🏠 {}", i18n.t("buttons.main_menu", lang, None)),
        "admin_home".to_string(),
    )]);

    InboxPage {
        text,
        keyboard: InlineKeyboardMarkup::new(rows),
        page,
        total_pages,
    }
}

/// Substring search over ticket IDs; first hit in storage iteration order wins
pub fn search_by_id<'a>(tickets: &'a [Ticket], query: &str) -> Option<&'a Ticket> {
    let needle = normalize_search_query(query);
    if needle.is_empty() {
        return None;
    }
    tickets.iter().find(|t| t.id.contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{I18nConfig, UiConfig};
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};

    fn i18n() -> I18n {
        // No translation files loaded: lookups echo the key, which is all
        // these structural tests need
        I18n::new(&I18nConfig {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string()],
        })
    }

    fn ui(page_size: usize) -> UiConfig {
        UiConfig { page_size, preview_length: 60 }
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, day, hour, 0, 0)
            .unwrap()
    }

    fn ticket(n: u32, day: u32) -> Ticket {
        Ticket::open(
            format!("T-202501{:02}-{:04}", day, n),
            n as i64,
            None,
            format!("question number {}", n),
            at(day, n % 24),
        )
    }

    fn tickets(count: u32) -> Vec<Ticket> {
        (1..=count).map(|n| ticket(n, 1)).collect()
    }

    #[test]
    fn test_pagination_boundaries() {
        // page_size + 1 tickets: page 0 full, page 1 holds the remainder
        let all = tickets(11);
        let page0 = build_inbox(&all, InboxFilter::All, 0, &ui(10), &i18n(), "en");
        assert_eq!(page0.total_pages, 2);
        assert_eq!(page0.text.matches("T-2025").count(), 10);

        let page1 = build_inbox(&all, InboxFilter::All, 1, &ui(10), &i18n(), "en");
        assert_eq!(page1.total_pages, 2);
        assert_eq!(page1.text.matches("T-2025").count(), 1);
    }

    #[test]
    fn test_page_beyond_total_is_safe() {
        let all = tickets(3);
        let page = build_inbox(&all, InboxFilter::All, 9, &ui(10), &i18n(), "en");
        assert_eq!(page.total_pages, 1);
        assert!(page.text.contains("inbox.no_tickets"));
    }

    #[test]
    fn test_empty_inbox_reports_one_page() {
        let page = build_inbox(&[], InboxFilter::All, 0, &ui(10), &i18n(), "en");
        assert_eq!(page.total_pages, 1);
        assert!(page.text.contains("inbox.no_tickets"));
    }

    #[test]
    fn test_sorted_newest_first() {
        let mut all = vec![ticket(1, 1), ticket(2, 3), ticket(3, 2)];
        all[0].created_at = at(1, 0);
        let page = build_inbox(&all, InboxFilter::All, 0, &ui(10), &i18n(), "en");

        let pos_day3 = page.text.find("T-20250103-0002").unwrap();
        let pos_day2 = page.text.find("T-20250102-0003").unwrap();
        let pos_day1 = page.text.find("T-20250101-0001").unwrap();
        assert!(pos_day3 < pos_day2 && pos_day2 < pos_day1);
    }

    #[test]
    fn test_filter_selects_by_status() {
        let mut all = tickets(4);
        all[0].status = TicketStatus::Done;
        all[1].status = TicketStatus::Working;

        let done = build_inbox(&all, InboxFilter::Done, 0, &ui(10), &i18n(), "en");
        assert_eq!(done.text.matches("T-2025").count(), 1);
        assert!(done.text.contains("T-20250101-0001"));

        let fresh = build_inbox(&all, InboxFilter::New, 0, &ui(10), &i18n(), "en");
        assert_eq!(fresh.text.matches("T-2025").count(), 2);
    }

    #[test]
    fn test_nav_row_only_when_applicable() {
        let all = tickets(11);
        let rows = |page: InboxPage| page.keyboard.inline_keyboard;

        // Single page: filter, search, home
        assert_eq!(rows(build_inbox(&tickets(3), InboxFilter::All, 0, &ui(10), &i18n(), "en")).len(), 3);
        // Two pages: nav row appears
        let page0 = rows(build_inbox(&all, InboxFilter::All, 0, &ui(10), &i18n(), "en"));
        assert_eq!(page0.len(), 4);
        assert_eq!(page0[1].len(), 1); // forward only
        let page1 = rows(build_inbox(&all, InboxFilter::All, 1, &ui(10), &i18n(), "en"));
        assert_eq!(page1[1].len(), 1); // back only
    }

    #[test]
    fn test_search_substring_match() {
        let all: Vec<Ticket> = vec![
            ticket(7, 1),  // T-20250101-0007
            ticket(17, 2), // T-20250102-0017
        ];

        assert_eq!(search_by_id(&all, "7").unwrap().id, "T-20250101-0007");
        assert_eq!(search_by_id(&all, "0007").unwrap().id, "T-20250101-0007");
        assert_eq!(search_by_id(&all, "20250101").unwrap().id, "T-20250101-0007");
        assert_eq!(search_by_id(&all, "#0007").unwrap().id, "T-20250101-0007");
        assert_eq!(search_by_id(&all, "0017").unwrap().id, "T-20250102-0017");
        assert!(search_by_id(&all, "9999").is_none());
        assert!(search_by_id(&all, "  ").is_none());
    }

    #[test]
    fn test_created_at_tiebreak_is_stable() {
        let mut a = ticket(1, 1);
        let mut b = ticket(2, 1);
        a.created_at = at(1, 5);
        b.created_at = at(1, 5);
        let page = build_inbox(&[a, b], InboxFilter::All, 0, &ui(10), &i18n(), "en");
        // Equal keys keep input order under the stable sort
        let pos_a = page.text.find("T-20250101-0001").unwrap();
        let pos_b = page.text.find("T-20250101-0002").unwrap();
        assert!(pos_a < pos_b);
    }
}
