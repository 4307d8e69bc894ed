//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod feedback;
pub mod ticket;

// Re-export commonly used models
pub use feedback::{Feedback, FeedbackKind};
pub use ticket::{Actor, Rating, Ticket, TicketMessage, TicketStatus};
