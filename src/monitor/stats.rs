//! Rolling per-monitor statistics.

use chrono::{DateTime, Utc};

/// Rolling counters and timestamps summarizing a monitor's check history.
///
/// Only the check engine writes these fields; everything else (admin
/// screens, exports) reads them. The invariant
/// `healthy_checks + unhealthy_checks == total_checks` holds as long as
/// all updates go through [`MonitorAggregate::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorAggregate {
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_healthy_at: Option<DateTime<Utc>>,
    pub last_unhealthy_at: Option<DateTime<Utc>>,
    pub total_checks: i64,
    pub healthy_checks: i64,
    pub unhealthy_checks: i64,
}

impl MonitorAggregate {
    /// Fold one classified probe into the aggregate.
    ///
    /// Returns the updated value; the caller decides when (and whether) it
    /// becomes visible, so concurrent probes of different monitors never
    /// share mutable state.
    pub fn apply(mut self, is_healthy: bool, checked_at: DateTime<Utc>) -> MonitorAggregate {
        self.total_checks += 1;
        self.last_checked_at = Some(checked_at);
        if is_healthy {
            self.healthy_checks += 1;
            self.last_healthy_at = Some(checked_at);
        } else {
            self.unhealthy_checks += 1;
            self.last_unhealthy_at = Some(checked_at);
        }
        self
    }
}
