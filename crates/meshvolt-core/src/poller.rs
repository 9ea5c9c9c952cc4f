// ── Telemetry polling ──
//
// Fans out one unit of work per cached station: probe, login, read the
// sensor, convert, always log out. A semaphore bounds the fan-out so a
// large mesh cannot open unbounded simultaneous connections; isolation
// means one dead station costs one timeout, not the whole poll.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::convert::battery_percentage;
use crate::link::{MeshLink, RadioVisit};
use crate::model::{MacAddress, StationReading};
use crate::topology::Topology;

/// Poll every station currently in the topology.
///
/// Results are collected as workers complete; order is immaterial. With
/// a `deadline`, workers still in flight when it elapses are aborted and
/// their eventual results discarded.
pub(crate) async fn poll_all<L>(
    link: L,
    topology: Arc<Mutex<Topology>>,
    config: Arc<EngineConfig>,
    deadline: Option<Duration>,
) -> Vec<StationReading>
where
    L: MeshLink + Clone + 'static,
{
    let stations = topology.lock().await.stations();
    if stations.is_empty() {
        return Vec::new();
    }

    let limit = Arc::new(Semaphore::new(config.poll_width));
    let mut workers: JoinSet<Option<StationReading>> = JoinSet::new();

    for (mac, address) in stations {
        let link = link.clone();
        let topology = Arc::clone(&topology);
        let config = Arc::clone(&config);
        let limit = Arc::clone(&limit);

        workers.spawn(async move {
            // The semaphore is never closed; acquisition only fails if
            // the JoinSet is dropped, which aborts us anyway.
            let _permit = limit.acquire_owned().await.ok()?;
            poll_station(&link, &topology, &config, mac, address).await
        });
    }

    let mut readings = Vec::new();
    let collect = async {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Some(reading)) => readings.push(reading),
                Ok(None) => {}
                Err(e) if e.is_panic() => warn!(error = %e, "poll worker panicked"),
                Err(_) => {}
            }
        }
    };

    match deadline {
        Some(deadline) => {
            if tokio::time::timeout(deadline, collect).await.is_err() {
                warn!("poll deadline elapsed, abandoning in-flight workers");
            }
        }
        None => collect.await,
    }

    // Dropping the JoinSet aborts any abandoned workers.
    readings
}

/// One station's unit of work. `None` when the station yields no valid
/// reading -- never a placeholder value.
async fn poll_station<L: MeshLink>(
    link: &L,
    topology: &Mutex<Topology>,
    config: &EngineConfig,
    mac: MacAddress,
    address: IpAddr,
) -> Option<StationReading> {
    if !link.probe(address).await {
        debug!(station = %mac, %address, "not reachable, skipping");
        return None;
    }

    let session = match link.open(address).await {
        Ok(session) => {
            topology.lock().await.record_login_success(&mac);
            session
        }
        Err(e) => {
            debug!(station = %mac, %address, error = %e, "login failed");
            let evicted = topology
                .lock()
                .await
                .record_login_failure(&mac, config.eviction_threshold);
            if evicted {
                warn!(station = %mac, "station evicted after repeated login failures");
            }
            return None;
        }
    };

    // Read under the authenticated session; logout runs on every path.
    let voltage = session.voltage().await;
    session.close().await;

    match voltage {
        Ok(voltage) => Some(StationReading {
            percentage: battery_percentage(voltage, config.voltage_min, config.voltage_max),
            mac,
            address,
            voltage,
        }),
        Err(e) => {
            debug!(station = %mac, %address, error = %e, "sensor read failed");
            None
        }
    }
}
