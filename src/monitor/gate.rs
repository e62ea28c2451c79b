//! Decides whether a monitor is due for a check.

use chrono::{DateTime, Duration, Utc};

use super::models::Monitor;

/// True when `monitor` should be probed at `now`.
///
/// Inactive monitors are never due. A monitor that has never been
/// checked is due immediately. Otherwise it is due once at least
/// `interval_seconds` have elapsed since the last check; the comparison
/// is inclusive so a check lands on exact interval boundaries instead
/// of always drifting one tick late.
pub fn is_due(monitor: &Monitor, now: DateTime<Utc>) -> bool {
    if !monitor.is_active {
        return false;
    }
    match monitor.aggregate.last_checked_at {
        None => true,
        Some(last) => {
            now.signed_duration_since(last) >= Duration::seconds(monitor.interval_seconds as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::super::stats::MonitorAggregate;
    use super::*;

    fn monitor_with_last_check(last: Option<DateTime<Utc>>) -> Monitor {
        Monitor {
            id: 7,
            name: None,
            url: "https://example.com".to_string(),
            interval_seconds: 60,
            timeout_seconds: 10,
            is_active: true,
            aggregate: MonitorAggregate {
                last_checked_at: last,
                ..MonitorAggregate::default()
            },
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, secs).unwrap()
    }

    fn at_minute(min: u32, secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, min, secs).unwrap()
    }

    #[test]
    fn never_checked_monitor_is_due() {
        let monitor = monitor_with_last_check(None);
        assert!(is_due(&monitor, at(0)));
    }

    #[test]
    fn inactive_monitor_is_never_due() {
        let mut monitor = monitor_with_last_check(None);
        monitor.is_active = false;
        assert!(!is_due(&monitor, at(0)));
    }

    #[test]
    fn not_due_before_interval_elapses() {
        let monitor = monitor_with_last_check(Some(at(0)));
        assert!(!is_due(&monitor, at(59)));
    }

    #[test]
    fn due_exactly_on_the_interval_boundary() {
        let monitor = monitor_with_last_check(Some(at(0)));
        assert!(is_due(&monitor, at_minute(1, 0)));
    }

    #[test]
    fn due_after_the_interval_has_passed() {
        let monitor = monitor_with_last_check(Some(at(0)));
        assert!(is_due(&monitor, at_minute(5, 30)));
    }
}
