// ── Topology discovery ──
//
// Walks the mesh transitively from the root radio: list the current
// radio's associations, resolve each new MAC to its mesh address, probe
// it, and enqueue it for its own association listing. The visited set
// bounds the walk on cyclic meshes; per-station failures are logged and
// skipped so one bad node cannot hide the rest of the mesh.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::link::{MeshLink, RadioVisit};
use crate::model::MacAddress;
use crate::resolve::mesh_address;

/// Discover every reachable station starting from the root radio.
///
/// Returns the MAC -> address map of stations that passed the
/// reachability probe and accepted a login. The root itself is an entry
/// point, not a discovered peer: it never appears in the map. An
/// unavailable root yields an empty map.
pub(crate) async fn discover<L: MeshLink>(
    link: &L,
    root_address: IpAddr,
    prefix: [u8; 2],
) -> HashMap<MacAddress, IpAddr> {
    let mut found: HashMap<MacAddress, IpAddr> = HashMap::new();
    let mut visited: HashSet<MacAddress> = HashSet::new();

    let Some(root_peers) = visit(link, root_address).await else {
        warn!(address = %root_address, "root radio unavailable, crawl found nothing");
        return found;
    };

    // Breadth-first: stations whose association lists still need
    // walking. Bounded by the visited set even when the mesh graph
    // contains cycles.
    let mut pending: VecDeque<MacAddress> = root_peers.into();

    while let Some(mac) = pending.pop_front() {
        if !visited.insert(mac) {
            continue;
        }

        let address = IpAddr::V4(mesh_address(&mac, prefix));
        if !link.probe(address).await {
            debug!(station = %mac, %address, "station not reachable, skipping");
            continue;
        }

        match visit(link, address).await {
            Some(peers) => {
                found.insert(mac, address);
                pending.extend(peers);
            }
            None => debug!(station = %mac, %address, "login failed, excluded from topology"),
        }
    }

    info!(count = found.len(), "mesh crawl complete");
    found
}

/// Log in to one station, list its associations, log out.
///
/// `None` means the login failed and the station should be excluded. A
/// station that accepts the login but cannot produce an association
/// list still counts as discovered, with no peers to contribute.
async fn visit<L: MeshLink>(link: &L, address: IpAddr) -> Option<Vec<MacAddress>> {
    let session = match link.open(address).await {
        Ok(session) => session,
        Err(e) => {
            debug!(%address, error = %e, "crawl login failed");
            return None;
        }
    };

    let peers = session.peers().await;
    session.close().await;

    match peers {
        Ok(peers) => Some(peers),
        Err(e) => {
            debug!(%address, error = %e, "association list failed");
            Some(Vec::new())
        }
    }
}
