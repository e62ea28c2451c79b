//! HTTP probing.
//!
//! A probe is a single GET with a hard timeout. It never fails as a Rust
//! error: every network misfortune is folded into the returned
//! [`ProbeOutcome`] so the caller can classify and persist it like any
//! other observation.

use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Broad category of a failed probe, for operators scanning logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    ConnectionRefused,
    DnsFailure,
    TlsError,
    Unknown,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::ConnectionRefused => "connection_refused",
            TransportErrorKind::DnsFailure => "dns_failure",
            TransportErrorKind::TlsError => "tls_error",
            TransportErrorKind::Unknown => "unknown",
        }
    }
}

/// Why a probe produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub detail: String,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// What one probe observed. Exactly one of `status_code` or
/// `transport_error` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status_code: Option<i32>,
    pub response_time_ms: Option<i32>,
    pub transport_error: Option<TransportError>,
}

impl ProbeOutcome {
    /// The server answered with `code` after `response_time_ms`.
    pub fn response(code: i32, response_time_ms: i32) -> ProbeOutcome {
        ProbeOutcome {
            status_code: Some(code),
            response_time_ms: Some(response_time_ms),
            transport_error: None,
        }
    }

    /// The request died in transit before any response arrived.
    pub fn failed(error: TransportError) -> ProbeOutcome {
        ProbeOutcome {
            status_code: None,
            response_time_ms: None,
            transport_error: Some(error),
        }
    }
}

/// Issues probes. Swapped out for a scripted fake in engine tests.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// Real prober backed by a shared reqwest client.
///
/// Redirects are disabled so a 3xx stays observable instead of being
/// followed to whatever it points at.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sitewatch/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(HttpProber { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let elapsed_ms = start.elapsed().as_millis() as i32;
                ProbeOutcome::response(response.status().as_u16() as i32, elapsed_ms)
            }
            Err(e) => ProbeOutcome::failed(map_reqwest_error(&e)),
        }
    }
}

fn map_reqwest_error(e: &reqwest::Error) -> TransportError {
    let detail = root_cause(e);
    let kind = kind_from_parts(e.is_timeout(), e.is_connect(), io_kind(e), &detail);
    TransportError { kind, detail }
}

/// Innermost source message. reqwest wraps hyper wraps io; the deepest
/// message is the one worth keeping.
fn root_cause(e: &reqwest::Error) -> String {
    let mut cause: &dyn std::error::Error = e;
    while let Some(source) = cause.source() {
        cause = source;
    }
    cause.to_string()
}

fn io_kind(e: &reqwest::Error) -> Option<std::io::ErrorKind> {
    let mut cause: Option<&dyn std::error::Error> = Some(e);
    while let Some(err) = cause {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        cause = err.source();
    }
    None
}

/// Pure mapping from error facts to a kind, kept separate from the
/// reqwest types so it can be unit tested.
fn kind_from_parts(
    is_timeout: bool,
    is_connect: bool,
    io_kind: Option<std::io::ErrorKind>,
    detail: &str,
) -> TransportErrorKind {
    if is_timeout {
        return TransportErrorKind::Timeout;
    }
    if io_kind == Some(std::io::ErrorKind::ConnectionRefused) {
        return TransportErrorKind::ConnectionRefused;
    }
    let lowered = detail.to_ascii_lowercase();
    if lowered.contains("dns") || lowered.contains("lookup") {
        return TransportErrorKind::DnsFailure;
    }
    if lowered.contains("certificate")
        || lowered.contains("tls")
        || lowered.contains("handshake")
    {
        return TransportErrorKind::TlsError;
    }
    if is_connect {
        return TransportErrorKind::ConnectionRefused;
    }
    TransportErrorKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_wins_over_other_signals() {
        let kind = kind_from_parts(true, true, None, "operation timed out");
        assert_eq!(kind, TransportErrorKind::Timeout);
    }

    #[test]
    fn refused_io_kind_maps_to_connection_refused() {
        let kind = kind_from_parts(
            false,
            true,
            Some(std::io::ErrorKind::ConnectionRefused),
            "tcp connect error",
        );
        assert_eq!(kind, TransportErrorKind::ConnectionRefused);
    }

    #[test]
    fn dns_detail_maps_to_dns_failure() {
        let kind = kind_from_parts(false, true, None, "dns error: failed to lookup address");
        assert_eq!(kind, TransportErrorKind::DnsFailure);
    }

    #[test]
    fn certificate_detail_maps_to_tls_error() {
        let kind = kind_from_parts(false, false, None, "invalid peer certificate: Expired");
        assert_eq!(kind, TransportErrorKind::TlsError);
    }

    #[test]
    fn bare_connect_failure_maps_to_connection_refused() {
        let kind = kind_from_parts(false, true, None, "tcp connect error");
        assert_eq!(kind, TransportErrorKind::ConnectionRefused);
    }

    #[test]
    fn unrecognized_failure_maps_to_unknown() {
        let kind = kind_from_parts(false, false, None, "connection reset by peer");
        assert_eq!(kind, TransportErrorKind::Unknown);
    }

    #[tokio::test]
    async fn probe_against_closed_port_reports_transport_error() {
        let prober = HttpProber::new().unwrap();
        // Port 1 is essentially never listening.
        let outcome = prober
            .probe("http://127.0.0.1:1/", Duration::from_secs(2))
            .await;
        assert!(outcome.status_code.is_none());
        let error = outcome.transport_error.expect("expected a transport error");
        assert!(
            matches!(
                error.kind,
                TransportErrorKind::ConnectionRefused
                    | TransportErrorKind::Timeout
                    | TransportErrorKind::Unknown
            ),
            "unexpected kind: {:?}",
            error.kind
        );
    }

    #[tokio::test]
    async fn probe_against_invalid_url_does_not_panic() {
        let prober = HttpProber::new().unwrap();
        let outcome = prober.probe("not a url", Duration::from_secs(1)).await;
        assert!(outcome.transport_error.is_some());
    }
}
