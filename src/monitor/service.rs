//! Check run orchestration.
//!
//! [`UptimeMonitorService`] owns one responsibility: given the monitors
//! that are due, probe them with bounded concurrency and persist what
//! happened. Stores, probing and time all arrive through trait objects,
//! so the whole engine runs in tests against in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::classifier::{Verdict, classify};
use super::gate;
use super::models::{CheckResult, Monitor};
use super::prober::{ProbeOutcome, Prober};
use super::stats::MonitorAggregate;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum MonitorServiceError {
    #[error("Monitor store error: {0}")]
    Store(#[from] StoreError),
}

/// Source of monitors and sink for finished checks.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// All monitors currently enabled for checking, with their aggregates.
    async fn list_active(&self) -> Result<Vec<Monitor>, StoreError>;

    /// Persist one check result together with the monitor's updated
    /// aggregate. The pair must land atomically; if only one write can
    /// survive, it must be the result row.
    async fn record_check(
        &self,
        result: &CheckResult,
        aggregate: &MonitorAggregate,
    ) -> Result<(), StoreError>;
}

/// Time source. Injected so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What triggered a run, carried through for log attribution.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub triggered_by: Option<String>,
}

impl RunContext {
    pub fn new(triggered_by: impl Into<String>) -> RunContext {
        RunContext {
            triggered_by: Some(triggered_by.into()),
        }
    }
}

/// Outcome tally of one run. `total` counts checks that completed and
/// were recorded, so `total == healthy + unhealthy` always holds.
/// Monitors skipped for unusable configuration land in `invalid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// Healthy responses slower than this many milliseconds classify as
    /// slow instead of up.
    pub slow_threshold_ms: i32,
    /// Upper bound on probes running at the same time.
    pub max_concurrent_probes: usize,
}

impl Default for MonitorSettings {
    fn default() -> MonitorSettings {
        MonitorSettings {
            slow_threshold_ms: 2000,
            max_concurrent_probes: 8,
        }
    }
}

pub struct UptimeMonitorService {
    store: Arc<dyn MonitorStore>,
    prober: Arc<dyn Prober>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    /// Monitor ids with a probe currently in flight. A monitor is never
    /// probed twice concurrently, even if a run overlaps a slow probe
    /// from the previous one.
    in_flight: DashSet<i32>,
}

impl UptimeMonitorService {
    pub fn new(
        store: Arc<dyn MonitorStore>,
        prober: Arc<dyn Prober>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        UptimeMonitorService {
            store,
            prober,
            clock,
            settings,
            in_flight: DashSet::new(),
        }
    }

    /// Run one checking pass over every due monitor.
    ///
    /// A monitor that fails to probe or persist is logged and excluded
    /// from the tally; it never aborts the run. The only hard failure is
    /// being unable to load the monitor list at all.
    pub async fn run_scheduled_checks(
        &self,
        ctx: &RunContext,
    ) -> Result<RunSummary, MonitorServiceError> {
        let monitors = self.store.list_active().await?;
        let now = self.clock.now();

        let mut summary = RunSummary::default();
        let mut due = Vec::new();
        for monitor in monitors {
            if let Err(reason) = validate_config(&monitor) {
                warn!(
                    monitor_id = monitor.id,
                    monitor = monitor.display_name(),
                    reason,
                    "Skipping monitor with invalid configuration."
                );
                summary.invalid += 1;
                continue;
            }
            if gate::is_due(&monitor, now) {
                due.push(monitor);
            }
        }

        debug!(
            due = due.len(),
            triggered_by = ctx.triggered_by.as_deref().unwrap_or("unknown"),
            "Starting check run."
        );

        let verdicts: Vec<Option<Verdict>> =
            stream::iter(due.into_iter().map(|monitor| self.check_one(monitor)))
                .buffer_unordered(self.settings.max_concurrent_probes)
                .collect()
                .await;

        for verdict in verdicts.into_iter().flatten() {
            summary.total += 1;
            if verdict.is_healthy {
                summary.healthy += 1;
            } else {
                summary.unhealthy += 1;
            }
        }
        Ok(summary)
    }

    async fn check_one(&self, monitor: Monitor) -> Option<Verdict> {
        if !self.in_flight.insert(monitor.id) {
            debug!(
                monitor_id = monitor.id,
                monitor = monitor.display_name(),
                "Probe already in flight, skipping."
            );
            return None;
        }
        // Released on drop, so a run cancelled mid-probe (the trigger may
        // impose a run-level deadline) cannot leave the id stuck in the set.
        let _guard = InFlightGuard {
            set: &self.in_flight,
            id: monitor.id,
        };
        self.probe_and_record(&monitor).await
    }

    async fn probe_and_record(&self, monitor: &Monitor) -> Option<Verdict> {
        let timeout = Duration::from_secs(monitor.timeout_seconds.max(1) as u64);
        let outcome = self.prober.probe(&monitor.url, timeout).await;
        let checked_at = self.clock.now();
        let verdict = classify(&outcome, self.settings.slow_threshold_ms);

        let result = CheckResult {
            monitor_id: monitor.id,
            status_code: outcome.status_code,
            response_time_ms: outcome.response_time_ms,
            is_healthy: verdict.is_healthy,
            error_message: error_message(&outcome, verdict),
            checked_at,
        };
        let aggregate = monitor.aggregate.apply(verdict.is_healthy, checked_at);

        match self.store.record_check(&result, &aggregate).await {
            Ok(()) => {
                debug!(
                    monitor_id = monitor.id,
                    monitor = monitor.display_name(),
                    status = verdict.status.as_str(),
                    "Check recorded."
                );
                Some(verdict)
            }
            Err(e) => {
                error!(
                    monitor_id = monitor.id,
                    monitor = monitor.display_name(),
                    error = %e,
                    "Failed to record check result."
                );
                None
            }
        }
    }
}

/// Removes its monitor id from the in-flight set when dropped, whether the
/// probe finished or its future was cancelled.
struct InFlightGuard<'a> {
    set: &'a DashSet<i32>,
    id: i32,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

fn validate_config(monitor: &Monitor) -> Result<(), String> {
    if monitor.interval_seconds <= 0 {
        return Err(format!(
            "interval_seconds must be positive, got {}",
            monitor.interval_seconds
        ));
    }
    if monitor.timeout_seconds <= 0 {
        return Err(format!(
            "timeout_seconds must be positive, got {}",
            monitor.timeout_seconds
        ));
    }
    let url = reqwest::Url::parse(&monitor.url).map_err(|e| format!("invalid url: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported url scheme `{other}`")),
    }
}

/// Human-readable failure note for the persisted row. Transport errors
/// keep their kind and detail; unhealthy HTTP responses record the code;
/// healthy checks carry nothing.
fn error_message(outcome: &ProbeOutcome, verdict: Verdict) -> Option<String> {
    if let Some(error) = &outcome.transport_error {
        return Some(error.to_string());
    }
    if verdict.is_healthy {
        return None;
    }
    outcome.status_code.map(|code| format!("HTTP {code}"))
}
