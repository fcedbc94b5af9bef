//! Observability for replica read resources
//!
//! This module provides:
//! - Structured logging (JSON)
//! - Monotonic counters
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//! 4. A failure to log never becomes a failure of the caller
//!
//! # Usage
//!
//! ```ignore
//! use replica_io::observability::{self, Event};
//!
//! observability::log_event(Event::StreamCloseFailed, &[("stream", "checksum")]);
//! observability::metrics().increment_close_failures();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

#[cfg(test)]
pub(crate) use logger::capture_logs;

use std::sync::OnceLock;

static METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

/// Process-wide metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    METRICS.get_or_init(MetricsRegistry::new)
}

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
