//! View builders module
//!
//! Pure rendering of listing text, cards and keyboards, plus the
//! edit-in-place delivery policy for admin screens.

pub mod card;
pub mod inbox;
pub mod keyboards;
pub mod screen;

pub use card::render_ticket_card;
pub use inbox::{build_inbox, search_by_id, InboxFilter, InboxPage};
pub use screen::{delete_tracked, show_admin_screen, show_ticket_card};
