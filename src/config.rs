//! Configuration — CLI flags, environment variables, config file.

use clap::Parser;
use std::fs;
use std::path::Path;

use crate::metrics::validate_metric_name;

/// dns-exporter — DNS resolution metrics for Prometheus
#[derive(Parser, Debug, Default)]
#[command(name = "dns-exporter", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(long, default_value = "dns-exporter.conf")]
    pub config: String,

    /// Listen port
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long)]
    pub listen_host: Option<String>,

    /// Comma-separated hostnames to resolve on every scrape
    #[arg(long)]
    pub hosts: Option<String>,

    /// TOML file with a `hosts = [...]` list
    #[arg(long)]
    pub hosts_file: Option<String>,

    /// Metric namespace prefix
    #[arg(long)]
    pub namespace: Option<String>,

    /// Log level
    #[arg(long)]
    pub log_level: Option<String>,

    /// Per-probe timeout in milliseconds (0 = wait for the resolver)
    #[arg(long)]
    pub probe_timeout_ms: Option<u64>,

    /// Max concurrent probes per scrape (0 = one task per host)
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_port: u16,
    pub listen_host: String,
    pub hosts: Vec<String>,
    pub hosts_file: Option<String>,
    pub namespace: String,
    pub log_level: String,
    pub probe_timeout_ms: u64,
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 8000,
            listen_host: "localhost".into(),
            hosts: vec!["example.org".into(), "google.com".into()],
            hosts_file: None,
            namespace: "dns_exporter".into(),
            log_level: "info".into(),
            probe_timeout_ms: 0,
            max_concurrency: 0,
        }
    }
}

impl Config {
    /// Load configuration: defaults → config file → env vars → CLI flags.
    pub fn load() -> Self {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Self {
        let mut config = Config::default();

        // 1. Config file
        let config_path = Path::new(&cli.config);
        if config_path.exists() {
            if let Ok(content) = fs::read_to_string(config_path) {
                apply_config_file(&mut config, &content);
            }
        }

        // 2. Environment variables
        apply_env(&mut config);

        // 3. CLI flags (highest priority)
        if let Some(v) = cli.port {
            config.listen_port = v;
        }
        if let Some(v) = cli.listen_host {
            config.listen_host = v;
        }
        if let Some(v) = cli.hosts {
            config.hosts = split_list(&v);
            config.hosts_file = None;
        }
        if let Some(v) = cli.hosts_file {
            config.hosts_file = Some(v);
        }
        if let Some(v) = cli.namespace {
            config.namespace = v;
        }
        if let Some(v) = cli.log_level {
            config.log_level = v;
        }
        if let Some(v) = cli.probe_timeout_ms {
            config.probe_timeout_ms = v;
        }
        if let Some(v) = cli.max_concurrency {
            config.max_concurrency = v;
        }

        config
    }

    /// Validate configuration. Returns an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("listen_port must be > 0".into());
        }
        if !self.namespace.is_empty() {
            validate_metric_name(&self.namespace)
                .map_err(|e| format!("invalid namespace: {e}"))?;
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn apply_config_file(config: &mut Config, content: &str) {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(eq_pos) = trimmed.find('=') else {
            continue;
        };

        let key = trimmed[..eq_pos].trim();
        let mut value = trimmed[eq_pos + 1..].trim().to_string();

        // Strip quotes
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = value[1..value.len() - 1].to_string();
        }

        match key {
            "port" | "listen_port" => {
                if let Ok(v) = value.parse() {
                    config.listen_port = v;
                }
            }
            "listen_host" | "host" => config.listen_host = value,
            "hosts" => config.hosts = split_list(&value),
            "hosts_file" => config.hosts_file = Some(value),
            "namespace" => config.namespace = value,
            "log_level" => config.log_level = value,
            "probe_timeout_ms" | "probe_timeout" => {
                if let Ok(v) = value.parse() {
                    config.probe_timeout_ms = v;
                }
            }
            "max_concurrency" => {
                if let Ok(v) = value.parse() {
                    config.max_concurrency = v;
                }
            }
            _ => {}
        }
    }
}

fn apply_env(config: &mut Config) {
    if let Ok(v) = std::env::var("DNS_EXPORTER_PORT") {
        if let Ok(p) = v.parse() {
            config.listen_port = p;
        }
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_HOST") {
        config.listen_host = v;
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_HOSTS") {
        config.hosts = split_list(&v);
        config.hosts_file = None;
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_HOSTS_FILE") {
        config.hosts_file = Some(v);
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_NAMESPACE") {
        config.namespace = v;
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_LOG_LEVEL") {
        config.log_level = v;
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_PROBE_TIMEOUT_MS") {
        if let Ok(t) = v.parse() {
            config.probe_timeout_ms = t;
        }
    }
    if let Ok(v) = std::env::var("DNS_EXPORTER_MAX_CONCURRENCY") {
        if let Ok(n) = v.parse() {
            config.max_concurrency = n;
        }
    }
}
