//! Collection Cycle — one scrape resolves every registered host concurrently.
//!
//! One task per host is spawned onto the runtime; each probes its host,
//! records the outcome in the shared `CounterStore` and publishes three
//! samples. The cycle returns once every task has finished. A lookup failure
//! is just a counted outcome, and a panicking task is logged without affecting
//! its siblings.
//!
//! The tasks are detached from the caller: if a scrape is abandoned midway
//! (client disconnect, scrape timeout) every probe it launched still runs to
//! completion and is counted.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::metrics::{Desc, Descriptors, MetricSample, MetricSink};
use crate::probe::{self, Resolve};
use crate::registry::HostRegistry;
use crate::store::CounterStore;

/// Optional safeguards. Both are off by default: no timeout, one task per
/// host with no cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorOptions {
    pub probe_timeout: Option<Duration>,
    pub max_concurrency: Option<usize>,
}

pub struct Collector<R> {
    descs: Descriptors,
    registry: HostRegistry,
    store: Arc<CounterStore>,
    resolver: Arc<R>,
    probe_timeout: Option<Duration>,
    max_concurrency: Option<usize>,
}

impl<R: Resolve> Collector<R> {
    pub fn new(
        descs: Descriptors,
        registry: HostRegistry,
        store: Arc<CounterStore>,
        resolver: Arc<R>,
        options: CollectorOptions,
    ) -> Self {
        Self {
            descs,
            registry,
            store,
            resolver,
            probe_timeout: options.probe_timeout,
            max_concurrency: options.max_concurrency.filter(|&n| n > 0),
        }
    }

    pub fn describe(&self) -> [&Desc; 3] {
        self.descs.all()
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descs
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    /// Run one collection cycle, publishing three samples per host into `sink`.
    pub async fn collect(&self, sink: Arc<dyn MetricSink>) {
        let started = Instant::now();
        let hosts = self.registry.hosts();
        // Cap is per cycle: overlapping scrapes each get their own permits.
        let limit = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(hosts.len());

        for host in hosts {
            let host = host.clone();
            let resolver = Arc::clone(&self.resolver);
            let store = Arc::clone(&self.store);
            let sink = Arc::clone(&sink);
            let descs = self.descs.clone();
            let limit = limit.clone();
            let timeout = self.probe_timeout;

            tasks.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquire only fails if it
                // were; run unbounded in that case.
                let _permit = match &limit {
                    Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
                    None => None,
                };

                let result = probe::probe(resolver.as_ref(), &host, timeout).await;
                let tally = store.record(&result.host, result.succeeded);

                sink.publish(MetricSample::new(&descs.total, &host, tally.attempts as f64));
                sink.publish(MetricSample::new(&descs.errors, &host, tally.errors as f64));
                sink.publish(MetricSample::new(
                    &descs.latency,
                    &host,
                    result.latency.as_secs_f64(),
                ));
            }));
        }

        // Dropping a JoinHandle detaches its task, so an abandoned cycle
        // still finishes every probe.
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "probe task failed");
            }
        }

        debug!(
            hosts = self.registry.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle complete"
        );
    }
}
