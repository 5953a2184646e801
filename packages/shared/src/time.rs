//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, Local, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current point in time (UTC)
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given point in time
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

/// Format a timestamp for chat display, e.g. `01-01 10:01` (day-month hour:minute, local time)
pub fn format_display_time(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%d-%m %H:%M")
        .to_string()
}
