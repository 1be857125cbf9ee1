//! Metric descriptors, samples, and the sink they are emitted into.
//!
//! No external crate needed — we format Prometheus exposition text manually.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Name, help text and type of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
}

impl Desc {
    pub fn new(namespace: &str, name: &str, help: &'static str, kind: MetricKind) -> Result<Self, String> {
        let name = build_fq_name(namespace, name);
        validate_metric_name(&name)?;
        Ok(Self { name, help, kind })
    }
}

/// The three families exported per host.
#[derive(Debug, Clone)]
pub struct Descriptors {
    pub total: Desc,
    pub errors: Desc,
    pub latency: Desc,
}

impl Descriptors {
    pub fn new(namespace: &str) -> Result<Self, String> {
        Ok(Self {
            total: Desc::new(
                namespace,
                "resolution_total",
                "Total number of DNS resolutions.",
                MetricKind::Counter,
            )?,
            errors: Desc::new(
                namespace,
                "resolution_error_total",
                "Total number of DNS resolution errors.",
                MetricKind::Counter,
            )?,
            latency: Desc::new(
                namespace,
                "resolution_seconds",
                "Time taken to resolve DNS.",
                MetricKind::Gauge,
            )?,
        })
    }

    pub fn all(&self) -> [&Desc; 3] {
        [&self.total, &self.errors, &self.latency]
    }
}

/// Join non-empty name parts with `_`.
pub fn build_fq_name(namespace: &str, name: &str) -> String {
    match (namespace.is_empty(), name.is_empty()) {
        (_, true) => String::new(),
        (true, false) => name.to_string(),
        (false, false) => format!("{namespace}_{name}"),
    }
}

/// Metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn validate_metric_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("metric name is empty".into());
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == ':') {
        return Err(format!("'{name}' is not a valid metric name"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
        return Err(format!("'{name}' is not a valid metric name"));
    }
    Ok(())
}

/// One observation for one host.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub kind: MetricKind,
    pub host: String,
    pub value: f64,
}

impl MetricSample {
    pub fn new(desc: &Desc, host: &str, value: f64) -> Self {
        Self {
            name: desc.name.clone(),
            kind: desc.kind,
            host: host.to_string(),
            value,
        }
    }
}

/// Receives samples from concurrently running probes.
pub trait MetricSink: Send + Sync {
    fn publish(&self, sample: MetricSample);
}

/// Sink that buffers every sample of one scrape.
#[derive(Default)]
pub struct Snapshot {
    samples: Mutex<Vec<MetricSample>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything published so far. Probe tasks may still hold the
    /// sink, so this empties the buffer rather than consuming it.
    pub fn take_samples(&self) -> Vec<MetricSample> {
        std::mem::take(&mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl MetricSink for Snapshot {
    fn publish(&self, sample: MetricSample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }
}

/// Render samples in Prometheus text format.
///
/// Samples arrive in whatever order the probes finished; each family is
/// written once in descriptor order with its samples sorted by host.
pub fn render(descs: &Descriptors, samples: &[MetricSample]) -> String {
    let mut out = String::with_capacity(256 + samples.len() * 64);

    for desc in descs.all() {
        let mut family: Vec<&MetricSample> = samples
            .iter()
            .filter(|s| s.name == desc.name && s.kind == desc.kind)
            .collect();
        if family.is_empty() {
            continue;
        }
        family.sort_by(|a, b| a.host.cmp(&b.host));

        let _ = writeln!(out, "# HELP {} {}", desc.name, desc.help);
        let _ = writeln!(out, "# TYPE {} {}", desc.name, desc.kind.as_str());
        for s in family {
            push_metric(&mut out, &s.name, &s.host, s.value);
        }
    }

    out
}

fn push_metric(out: &mut String, name: &str, host: &str, value: f64) {
    let _ = writeln!(out, "{name}{{host=\"{}\"}} {value}", escape_label_value(host));
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
