//! Maps a raw probe outcome to a health verdict.
//!
//! Pure and deterministic: same outcome and threshold, same verdict.

use serde::Serialize;

use super::prober::ProbeOutcome;

/// Health state of a monitor after one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Slow,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "up",
            HealthStatus::Slow => "slow",
            HealthStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result. `is_healthy` is what gets persisted on the
/// check row and folded into aggregates; `status` is the finer-grained
/// state for logs and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: HealthStatus,
    pub is_healthy: bool,
}

impl Verdict {
    fn up() -> Verdict {
        Verdict { status: HealthStatus::Up, is_healthy: true }
    }

    fn slow() -> Verdict {
        Verdict { status: HealthStatus::Slow, is_healthy: true }
    }

    fn down() -> Verdict {
        Verdict { status: HealthStatus::Down, is_healthy: false }
    }
}

/// Classify one probe outcome.
///
/// Transport failure or a missing status code is `Down`. 4xx and 5xx are
/// `Down`. 2xx is `Up`, demoted to `Slow` (still healthy) when the
/// response took longer than `slow_threshold_ms`. 3xx counts as `Up`:
/// the probe does not follow redirects, so a redirect response means the
/// server answered.
pub fn classify(outcome: &ProbeOutcome, slow_threshold_ms: i32) -> Verdict {
    if outcome.transport_error.is_some() {
        return Verdict::down();
    }
    let Some(code) = outcome.status_code else {
        return Verdict::down();
    };
    match code {
        200..=299 => match outcome.response_time_ms {
            Some(ms) if ms > slow_threshold_ms => Verdict::slow(),
            _ => Verdict::up(),
        },
        300..=399 => Verdict::up(),
        _ => Verdict::down(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::prober::{TransportError, TransportErrorKind};
    use super::*;

    const THRESHOLD: i32 = 2000;

    #[test]
    fn fast_2xx_is_up_and_healthy() {
        let outcome = ProbeOutcome::response(200, 120);
        let verdict = classify(&outcome, THRESHOLD);
        assert_eq!(verdict.status, HealthStatus::Up);
        assert!(verdict.is_healthy);
    }

    #[test]
    fn response_over_threshold_is_slow_but_healthy() {
        let outcome = ProbeOutcome::response(204, THRESHOLD + 1);
        let verdict = classify(&outcome, THRESHOLD);
        assert_eq!(verdict.status, HealthStatus::Slow);
        assert!(verdict.is_healthy);
    }

    #[test]
    fn response_exactly_at_threshold_is_up() {
        let outcome = ProbeOutcome::response(200, THRESHOLD);
        assert_eq!(classify(&outcome, THRESHOLD).status, HealthStatus::Up);
    }

    #[test]
    fn redirect_is_up_regardless_of_latency() {
        let outcome = ProbeOutcome::response(301, THRESHOLD + 500);
        let verdict = classify(&outcome, THRESHOLD);
        assert_eq!(verdict.status, HealthStatus::Up);
        assert!(verdict.is_healthy);
    }

    #[test]
    fn client_and_server_errors_are_down() {
        for code in [400, 404, 429, 500, 503] {
            let outcome = ProbeOutcome::response(code, 50);
            let verdict = classify(&outcome, THRESHOLD);
            assert_eq!(verdict.status, HealthStatus::Down, "code {code}");
            assert!(!verdict.is_healthy, "code {code}");
        }
    }

    #[test]
    fn transport_error_is_down() {
        let outcome = ProbeOutcome::failed(TransportError {
            kind: TransportErrorKind::Timeout,
            detail: "request timed out".to_string(),
        });
        let verdict = classify(&outcome, THRESHOLD);
        assert_eq!(verdict.status, HealthStatus::Down);
        assert!(!verdict.is_healthy);
    }

    #[test]
    fn missing_status_without_error_is_down() {
        let outcome = ProbeOutcome {
            status_code: None,
            response_time_ms: Some(10),
            transport_error: None,
        };
        assert_eq!(classify(&outcome, THRESHOLD).status, HealthStatus::Down);
    }

    #[test]
    fn range_boundaries_classify_correctly() {
        assert_eq!(
            classify(&ProbeOutcome::response(199, 50), THRESHOLD).status,
            HealthStatus::Down
        );
        assert_eq!(
            classify(&ProbeOutcome::response(299, 50), THRESHOLD).status,
            HealthStatus::Up
        );
        assert_eq!(
            classify(&ProbeOutcome::response(399, 50), THRESHOLD).status,
            HealthStatus::Up
        );
        assert_eq!(
            classify(&ProbeOutcome::response(-1, 50), THRESHOLD).status,
            HealthStatus::Down
        );
    }

    #[test]
    fn informational_codes_are_down() {
        let outcome = ProbeOutcome::response(103, 20);
        assert_eq!(classify(&outcome, THRESHOLD).status, HealthStatus::Down);
    }
}
