//! Startup — builds the collector from config and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::admin::{self, AdminState};
use crate::collector::{Collector, CollectorOptions};
use crate::config::Config;
use crate::metrics::Descriptors;
use crate::probe::SystemResolver;
use crate::registry::HostRegistry;
use crate::store::CounterStore;

/// Start the exporter. Only returns on a startup or server error.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    // ─── Collector state, built once ────────────────────────────────────

    let descs = Descriptors::new(&config.namespace)?;
    let registry = HostRegistry::from_config(&config)?;
    let options = CollectorOptions {
        probe_timeout: (config.probe_timeout_ms > 0)
            .then(|| Duration::from_millis(config.probe_timeout_ms)),
        max_concurrency: (config.max_concurrency > 0).then_some(config.max_concurrency),
    };

    info!(
        hosts = %registry.hosts().join(", "),
        namespace = %config.namespace,
        "host registry"
    );
    if registry.is_empty() {
        warn!("no hosts configured, scrapes will be empty");
    }
    if let Some(timeout) = options.probe_timeout {
        info!(timeout_ms = timeout.as_millis() as u64, "probe timeout");
    }
    if let Some(limit) = options.max_concurrency {
        info!(limit, "probe concurrency cap");
    }

    let collector = Collector::new(
        descs,
        registry,
        Arc::new(CounterStore::new()),
        Arc::new(SystemResolver),
        options,
    );

    // ─── Listener ───────────────────────────────────────────────────────

    let addr = format!("{}:{}", config.listen_host, config.listen_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening, metrics at /metrics");

    let state = AdminState {
        collector: Arc::new(collector),
    };
    admin::serve(listener, state).await?;

    Ok(())
}
