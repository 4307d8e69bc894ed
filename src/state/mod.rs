//! In-memory conversation and screen state

pub mod context;
pub mod screens;
pub mod session;

pub use context::AppContext;
pub use screens::ScreenTracker;
pub use session::{SessionState, SessionStore};
