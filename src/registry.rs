//! Host Registry — the fixed, ordered list of hostnames probed on every scrape.
//!
//! Built once at startup from the config (inline list or TOML hosts file) and
//! shared read-only between scrapes.

use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;

/// Structure of the TOML hosts file.
#[derive(Debug, Deserialize)]
pub struct HostsFile {
    #[serde(default)]
    pub hosts: Vec<String>,
}

/// Immutable ordered host list. Repeated hosts keep their first position;
/// a second copy would export the same series twice.
#[derive(Debug, Clone)]
pub struct HostRegistry {
    hosts: Arc<[String]>,
}

impl HostRegistry {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let hosts: Vec<String> = hosts
            .into_iter()
            .map(|h| {
                let h: String = h.into();
                h.trim().to_string()
            })
            .filter(|h| !h.is_empty() && seen.insert(h.clone()))
            .collect();
        Self { hosts: hosts.into() }
    }

    /// Build the registry from config. A configured hosts file replaces the
    /// inline list.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        match &config.hosts_file {
            Some(path) => load_hosts_file(path),
            None => Ok(Self::new(config.hosts.iter().cloned())),
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Load hosts from a TOML file of the form `hosts = ["a", "b"]`.
pub fn load_hosts_file(path: &str) -> Result<HostRegistry, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read hosts file '{}': {}", path, e))?;
    parse_hosts(&content).map_err(|e| format!("invalid TOML in '{}': {}", path, e))
}

fn parse_hosts(content: &str) -> Result<HostRegistry, toml::de::Error> {
    let parsed: HostsFile = toml::from_str(content)?;
    Ok(HostRegistry::new(parsed.hosts))
}
