//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the SupportBuddy application.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard must be kept alive for the lifetime of the process,
/// otherwise buffered file output is dropped.
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, "supportbuddy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log ticket lifecycle events with structured data
pub fn log_ticket_event(ticket_id: &str, user_id: i64, event: &str) {
    info!(ticket_id = %ticket_id, user_id = user_id, event = event, "Ticket event");
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>) {
    info!(admin_id = admin_id, action = action, target = target, "Admin action performed");
}
