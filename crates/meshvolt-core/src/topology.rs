// ── Topology cache and failure bookkeeping ──
//
// The station map, its staleness clock, and the per-station login
// failure counters live together behind the engine's cache lock:
// evictions triggered by poll workers must never race a refresh or
// another eviction.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::model::MacAddress;

/// Discovered mesh topology plus failure counters.
///
/// A crawl replaces the station map wholesale and clears every counter;
/// evictions remove single entries between crawls and leave the clock
/// untouched.
#[derive(Debug, Default)]
pub struct Topology {
    stations: HashMap<MacAddress, IpAddr>,
    last_crawl: Option<Instant>,
    login_failures: HashMap<MacAddress, u32>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the topology has never been crawled, or the last crawl
    /// is older than `ttl`.
    pub fn should_refresh(&self, ttl: Duration) -> bool {
        self.last_crawl.is_none_or(|at| at.elapsed() > ttl)
    }

    /// Replace the station map wholesale with a fresh crawl result,
    /// clear all failure counters, and stamp the clock.
    pub fn replace(&mut self, stations: HashMap<MacAddress, IpAddr>) {
        info!(count = stations.len(), "topology replaced");
        self.stations = stations;
        self.login_failures.clear();
        self.last_crawl = Some(Instant::now());
    }

    /// Current station set, cloned so poll workers iterate without
    /// holding the cache lock.
    pub fn stations(&self) -> Vec<(MacAddress, IpAddr)> {
        self.stations.iter().map(|(m, a)| (*m, *a)).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.stations.contains_key(mac)
    }

    /// Drop one station and its failure counter. Leaves the clock
    /// untouched -- a removal never triggers a re-crawl by itself.
    pub fn remove(&mut self, mac: &MacAddress) {
        if self.stations.remove(mac).is_some() {
            warn!(station = %mac, "removed station from topology");
        }
        self.login_failures.remove(mac);
    }

    /// Reset the failure counter after a successful login.
    pub fn record_login_success(&mut self, mac: &MacAddress) {
        self.login_failures.insert(*mac, 0);
    }

    /// Count one login failure. Once `threshold` consecutive failures
    /// accumulate the station is evicted; returns `true` in that case.
    pub fn record_login_failure(&mut self, mac: &MacAddress, threshold: u32) -> bool {
        let count = self.login_failures.entry(*mac).or_insert(0);
        *count += 1;
        if *count >= threshold {
            self.remove(mac);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn failure_count(&self, mac: &MacAddress) -> u32 {
        self.login_failures.get(mac).copied().unwrap_or(0)
    }
}
