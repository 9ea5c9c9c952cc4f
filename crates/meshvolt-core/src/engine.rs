// ── Telemetry engine ──
//
// Facade tying discovery, caching, and polling together. One instance
// owns one topology cache; consumers construct it with an EngineConfig
// and call `snapshot()` / `read_root()`. There is no process-wide
// state: drop the engine and everything it learned goes with it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::EngineConfig;
use crate::convert::battery_percentage;
use crate::crawl;
use crate::error::CoreError;
use crate::link::{MeshLink, RadioVisit, UbusLink};
use crate::model::{BatteryLevel, MacAddress, StationReading};
use crate::poller;
use crate::topology::Topology;

/// Topology discovery and telemetry polling engine for one mesh.
pub struct Engine<L: MeshLink = UbusLink> {
    config: Arc<EngineConfig>,
    link: L,
    topology: Arc<Mutex<Topology>>,
    /// Serializes crawls: two refreshes must never interleave. The
    /// crawl result is built while holding only this gate, then swapped
    /// into the topology under its own lock.
    refresh_gate: Mutex<()>,
}

impl Engine<UbusLink> {
    /// Create an engine from configuration.
    ///
    /// Fails fast on misconfiguration and performs no network activity.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let link = UbusLink::new(config.transport(), config.credentials());
        Ok(Self::with_link(config, link))
    }
}

impl<L> Engine<L>
where
    L: MeshLink + Clone + 'static,
{
    /// Create an engine over a custom mesh link.
    ///
    /// The caller is responsible for having validated the config; the
    /// primary constructor is [`Engine::new`].
    pub fn with_link(config: EngineConfig, link: L) -> Self {
        Self {
            config: Arc::new(config),
            link,
            topology: Arc::new(Mutex::new(Topology::new())),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live snapshot of every currently reachable station.
    ///
    /// Re-crawls the topology first when the cache is stale, then polls
    /// all cached stations with bounded parallelism. Always returns a
    /// (possibly empty) list; per-station failures are logged, not
    /// propagated.
    pub async fn snapshot(&self) -> Vec<StationReading> {
        self.snapshot_within(None).await
    }

    /// Like [`snapshot()`](Self::snapshot), bounded by an overall
    /// deadline. Workers still in flight when the deadline elapses are
    /// abandoned and their results discarded.
    pub async fn snapshot_within(&self, deadline: Option<Duration>) -> Vec<StationReading> {
        self.refresh_if_stale().await;
        poller::poll_all(
            self.link.clone(),
            Arc::clone(&self.topology),
            Arc::clone(&self.config),
            deadline,
        )
        .await
    }

    /// One authoritative point-in-time reading from the root radio.
    ///
    /// Unlike [`snapshot()`](Self::snapshot), failures here propagate:
    /// the caller asked for this specific radio and needs to know.
    pub async fn read_root(&self) -> Result<BatteryLevel, CoreError> {
        let session = self.link.open(self.config.root_address).await?;
        let voltage = session.voltage().await;
        session.close().await;

        let voltage = voltage?;
        Ok(BatteryLevel {
            voltage,
            percentage: battery_percentage(
                voltage,
                self.config.voltage_min,
                self.config.voltage_max,
            ),
        })
    }

    /// Force a topology re-crawl regardless of cache age.
    pub async fn refresh_topology(&self) {
        let _gate = self.refresh_gate.lock().await;
        self.crawl_and_replace().await;
    }

    /// Number of stations currently cached.
    pub async fn station_count(&self) -> usize {
        self.topology.lock().await.len()
    }

    /// MACs of the stations currently cached.
    pub async fn cached_stations(&self) -> Vec<MacAddress> {
        self.topology
            .lock()
            .await
            .stations()
            .into_iter()
            .map(|(mac, _)| mac)
            .collect()
    }

    async fn refresh_if_stale(&self) {
        let _gate = self.refresh_gate.lock().await;
        // Re-check under the gate: another caller may have finished a
        // crawl while we waited for it.
        let stale = self
            .topology
            .lock()
            .await
            .should_refresh(self.config.topology_ttl);
        if stale {
            self.crawl_and_replace().await;
        }
    }

    async fn crawl_and_replace(&self) {
        debug!(root = %self.config.root_address, "refreshing mesh topology");
        let stations = crawl::discover(
            &self.link,
            self.config.root_address,
            self.config.network_prefix,
        )
        .await;
        self.topology.lock().await.replace(stations);
    }
}
