//! Counter Store — per-host cumulative attempt and error counts.
//!
//! Created once at startup, shared as `Arc<CounterStore>` between scrapes and
//! never reset. The outer map is only write-locked the first time a host is
//! seen; after that every host has its own lock, so probes for different hosts
//! never contend while same-host updates from overlapping scrapes serialize.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Cumulative counts for one host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempts: u64,
    pub errors: u64,
}

impl Tally {
    pub fn increment_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors += 1;
    }
}

#[derive(Default)]
pub struct CounterStore {
    hosts: RwLock<HashMap<String, Arc<Mutex<Tally>>>>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the per-host slot.
    fn slot(&self, host: &str) -> Arc<Mutex<Tally>> {
        {
            let hosts = self.hosts.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = hosts.get(host) {
                return Arc::clone(slot);
            }
        }
        let mut hosts = self.hosts.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(hosts.entry(host.to_string()).or_default())
    }

    fn update<F>(&self, host: &str, f: F) -> Tally
    where
        F: FnOnce(&mut Tally),
    {
        let slot = self.slot(host);
        let mut tally = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tally);
        *tally
    }

    /// Current pair for `host`; zero if the host was never probed.
    pub fn read(&self, host: &str) -> Tally {
        let hosts = self.hosts.read().unwrap_or_else(PoisonError::into_inner);
        match hosts.get(host) {
            Some(slot) => *slot.lock().unwrap_or_else(PoisonError::into_inner),
            None => Tally::default(),
        }
    }

    /// Count one probe outcome and return the updated pair.
    ///
    /// Attempt increment, error increment and read-back happen under the
    /// host's lock, so the returned pair always includes this probe and is
    /// never a mix of two concurrent probes.
    pub fn record(&self, host: &str, succeeded: bool) -> Tally {
        self.update(host, |t| {
            t.increment_attempt();
            if !succeeded {
                t.increment_error();
            }
        })
    }

    /// All tallies, sorted by host. Each pair is read atomically; pairs of
    /// different hosts may come from different moments.
    pub fn snapshot(&self) -> Vec<(String, Tally)> {
        let mut names: Vec<String> = self
            .hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
            .into_iter()
            .map(|host| {
                let tally = self.read(&host);
                (host, tally)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_host_reads_zero() {
        let store = CounterStore::new();
        assert_eq!(store.read("example.org"), Tally::default());
    }

    #[test]
    fn test_tally_increments() {
        let mut tally = Tally::default();
        tally.increment_attempt();
        assert_eq!(tally, Tally { attempts: 1, errors: 0 });
        tally.increment_error();
        assert_eq!(tally, Tally { attempts: 1, errors: 1 });
    }

    #[test]
    fn test_first_record_initialises_host() {
        let store = CounterStore::new();
        assert_eq!(store.record("a", true), Tally { attempts: 1, errors: 0 });
        assert_eq!(store.record("b", false), Tally { attempts: 1, errors: 1 });
        assert_eq!(store.read("a"), Tally { attempts: 1, errors: 0 });
    }

    #[test]
    fn test_record_success_and_failure() {
        let store = CounterStore::new();
        assert_eq!(store.record("h", true), Tally { attempts: 1, errors: 0 });
        assert_eq!(store.record("h", false), Tally { attempts: 2, errors: 1 });
        assert_eq!(store.read("h"), Tally { attempts: 2, errors: 1 });
    }

    #[test]
    fn test_snapshot_sorted() {
        let store = CounterStore::new();
        store.record("zeta", true);
        store.record("alpha", false);
        assert_eq!(
            store.snapshot(),
            vec![
                ("alpha".to_string(), Tally { attempts: 1, errors: 1 }),
                ("zeta".to_string(), Tally { attempts: 1, errors: 0 }),
            ]
        );
    }

    #[test]
    fn test_concurrent_records_lose_nothing() {
        let store = Arc::new(CounterStore::new());
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..1000 {
                        let tally = store.record("shared", n % 4 != 0);
                        assert!(tally.errors <= tally.attempts);
                        store.record(&format!("own-{i}"), true);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(store.read("shared"), Tally { attempts: 8000, errors: 2000 });
        for i in 0..8 {
            assert_eq!(store.read(&format!("own-{i}")).attempts, 1000);
        }
    }
}
