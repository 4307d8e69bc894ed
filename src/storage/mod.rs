//! Flat-file persistence module
//!
//! Durable state lives in two files: one JSON document for tickets and user
//! settings, one line-oriented block-list.

pub mod bans;
pub mod store;

pub use bans::BanRegistry;
pub use store::{StoreStats, TicketStore, UserSettings};
