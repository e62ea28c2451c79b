//! Record shapes the check engine reads from and writes to its stores.
//!
//! These are plain values; the persistence layer maps them to whatever
//! schema it uses. The engine never sees ORM types.

use chrono::{DateTime, Utc};

use super::stats::MonitorAggregate;

/// A configured target URL checked on a recurring interval, together with
/// its rolling aggregate as loaded from the monitor store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub id: i32,
    pub name: Option<String>,
    pub url: String,
    /// Seconds between checks. Positive; new monitors default to 60.
    pub interval_seconds: i32,
    /// Hard per-probe timeout in seconds.
    pub timeout_seconds: i32,
    pub is_active: bool,
    pub aggregate: MonitorAggregate,
}

impl Monitor {
    /// Label for log lines: the display name when set, the URL otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// Immutable record of one probe, keyed by `(monitor_id, checked_at)`.
/// Written exactly once per completed probe and never touched again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub monitor_id: i32,
    /// HTTP status code, absent when the request never produced a response.
    pub status_code: Option<i32>,
    /// Wall-clock milliseconds from send to header receipt; absent on
    /// transport failure.
    pub response_time_ms: Option<i32>,
    pub is_healthy: bool,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}
