//! Resolution Probe — one timed DNS lookup for one host.
//!
//! A failed lookup is a normal outcome: it is logged and reported through
//! `ResolutionResult::succeeded`, never returned as an error.

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// DNS resolver capability. Returns the number of addresses found; the
/// addresses themselves are of no interest to the exporter.
pub trait Resolve: Send + Sync + 'static {
    fn lookup(&self, host: &str) -> impl Future<Output = io::Result<usize>> + Send;
}

/// The platform resolver (getaddrinfo via tokio's blocking pool).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    async fn lookup(&self, host: &str) -> io::Result<usize> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.count())
    }
}

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub host: String,
    pub succeeded: bool,
    pub latency: Duration,
}

/// Resolve `host` once and time it.
///
/// Latency is measured for successes and failures alike. With `timeout` set,
/// a lookup that has not finished in time is abandoned and counted as failed.
pub async fn probe<R: Resolve>(
    resolver: &R,
    host: &str,
    timeout: Option<Duration>,
) -> ResolutionResult {
    let start = Instant::now();

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, resolver.lookup(host)).await {
            Ok(res) => res,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("lookup timed out after {}ms", limit.as_millis()),
            )),
        },
        None => resolver.lookup(host).await,
    };

    let latency = start.elapsed();

    let succeeded = match outcome {
        Ok(addrs) => {
            debug!(host = %host, addrs, latency_ms = latency.as_millis() as u64, "resolved");
            true
        }
        Err(e) => {
            warn!(host = %host, error = %e, "could not lookup host");
            false
        }
    };

    ResolutionResult {
        host: host.to_string(),
        succeeded,
        latency,
    }
}
