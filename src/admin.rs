//! HTTP API — Prometheus scrape endpoint, health check, counter status.
//!
//! Endpoints:
//!   GET /metrics — runs one collection cycle, Prometheus exposition format
//!   GET /health  — 200 OK, for load balancer health checks
//!   GET /status  — JSON snapshot of hosts and cumulative counters (no probing)

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::debug;

use crate::collector::Collector;
use crate::metrics::{self, Snapshot};
use crate::probe::Resolve;

/// Shared state for the HTTP endpoints.
pub struct AdminState<R> {
    pub collector: Arc<Collector<R>>,
}

impl<R> Clone for AdminState<R> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
        }
    }
}

pub fn router<R: Resolve>(state: AdminState<R>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(scrape::<R>))
        .route("/status", get(status::<R>))
        .with_state(state)
}

/// Serve the HTTP API on an already bound listener until the server fails.
pub async fn serve<R: Resolve>(listener: TcpListener, state: AdminState<R>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

// ─── GET /health ─────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/json")], r#"{"status":"ok"}"#)
}

// ─── GET /metrics ────────────────────────────────────────────────────────────

async fn scrape<R: Resolve>(State(state): State<AdminState<R>>) -> Response {
    let snap = Arc::new(Snapshot::new());
    state.collector.collect(snap.clone()).await;

    let samples = snap.take_samples();
    debug!(samples = samples.len(), "scrape");

    let out = metrics::render(state.collector.descriptors(), &samples);

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        out,
    )
        .into_response()
}

// ─── GET /status ─────────────────────────────────────────────────────────────

async fn status<R: Resolve>(State(state): State<AdminState<R>>) -> Response {
    let collector = &state.collector;

    let counters: Vec<_> = collector
        .store()
        .snapshot()
        .into_iter()
        .map(|(host, tally)| {
            json!({
                "host": host,
                "attempts": tally.attempts,
                "errors": tally.errors,
            })
        })
        .collect();

    let body = json!({
        "hosts": collector.registry().hosts(),
        "metrics": collector.describe().iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        "counters": counters,
    });

    (
        StatusCode::OK,
        [("content-type", "application/json")],
        body.to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorOptions;
    use crate::metrics::Descriptors;
    use crate::probe::testing::ScriptedResolver;
    use crate::registry::HostRegistry;
    use crate::store::CounterStore;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start(hosts: &[&str], resolver: ScriptedResolver) -> SocketAddr {
        let collector = Collector::new(
            Descriptors::new("dns_exporter").unwrap(),
            HostRegistry::new(hosts.iter().copied()),
            Arc::new(CounterStore::new()),
            Arc::new(resolver),
            CollectorOptions::default(),
        );
        let state = AdminState {
            collector: Arc::new(collector),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            serve(listener, state).await.unwrap();
        });
        addr
    }

    /// Minimal HTTP/1.1 GET; returns (status line, body).
    async fn get(addr: SocketAddr, path: &str) -> (String, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8(raw).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        let status = head.lines().next().unwrap().to_string();
        (status, body.to_string())
    }

    #[tokio::test]
    async fn test_health() {
        let addr = start(&[], ScriptedResolver::new()).await;
        let (status, body) = get(addr, "/health").await;
        assert!(status.contains("200"));
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_metrics_scrape_runs_cycle() {
        let addr = start(
            &["example.org", "bad.invalid"],
            ScriptedResolver::new().ok("example.org", 1).fail("bad.invalid", 1),
        )
        .await;

        let (status, body) = get(addr, "/metrics").await;
        assert!(status.contains("200"));
        assert!(body.contains("# TYPE dns_exporter_resolution_total counter\n"));
        assert!(body.contains("# TYPE dns_exporter_resolution_seconds gauge\n"));
        assert!(body.contains("dns_exporter_resolution_total{host=\"example.org\"} 1\n"));
        assert!(body.contains("dns_exporter_resolution_error_total{host=\"example.org\"} 0\n"));
        assert!(body.contains("dns_exporter_resolution_error_total{host=\"bad.invalid\"} 1\n"));
        assert!(body.contains("dns_exporter_resolution_seconds{host=\"bad.invalid\"} "));

        let (_, body) = get(addr, "/metrics").await;
        assert!(body.contains("dns_exporter_resolution_total{host=\"example.org\"} 2\n"));
        assert!(body.contains("dns_exporter_resolution_error_total{host=\"bad.invalid\"} 2\n"));
    }

    #[tokio::test]
    async fn test_abandoned_scrape_does_not_break_next_one() {
        let addr = start(&["slow.example"], ScriptedResolver::new().ok("slow.example", 150)).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        drop(stream);
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;

        let (status, body) = get(addr, "/metrics").await;
        assert!(status.contains("200"));
        assert!(body.contains("dns_exporter_resolution_total{host=\"slow.example\"} 2\n"));
    }

    #[tokio::test]
    async fn test_metrics_empty_registry() {
        let addr = start(&[], ScriptedResolver::new()).await;
        let (status, body) = get(addr, "/metrics").await;
        assert!(status.contains("200"));
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_status_does_not_probe() {
        let addr = start(&["example.org"], ScriptedResolver::new().ok("example.org", 1)).await;

        let (_, body) = get(addr, "/status").await;
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["hosts"], json!(["example.org"]));
        assert_eq!(v["counters"], json!([]));

        get(addr, "/metrics").await;
        let (_, body) = get(addr, "/status").await;
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            v["counters"],
            json!([{"host": "example.org", "attempts": 1, "errors": 0}])
        );
    }
}
