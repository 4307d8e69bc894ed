//! Services module
//!
//! This module contains business logic services

pub mod feedback;
pub mod tickets;

pub use feedback::{CooldownVerdict, FeedbackService};
pub use tickets::TicketService;
