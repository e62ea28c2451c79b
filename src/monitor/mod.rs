//! The uptime checking engine: probing, classification, scheduling and
//! aggregate bookkeeping, independent of any concrete database.

pub mod classifier;
pub mod gate;
pub mod models;
pub mod prober;
pub mod service;
pub mod stats;

pub use classifier::{HealthStatus, Verdict, classify};
pub use gate::is_due;
pub use models::{CheckResult, Monitor};
pub use prober::{HttpProber, ProbeOutcome, Prober, TransportError, TransportErrorKind};
pub use service::{
    Clock, MonitorServiceError, MonitorSettings, MonitorStore, RunContext, RunSummary, StoreError,
    SystemClock, UptimeMonitorService,
};
pub use stats::MonitorAggregate;
