// Reachability probe.
//
// A bare TCP connect against the radio's HTTPS port, bounded by a short
// timeout. Crawl and poll paths use it to skip clearly-dead peers
// without paying for a full TLS handshake and RPC round trip.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// TCP port of the radio control endpoint.
pub const CONTROL_PORT: u16 = 443;

/// Returns `true` if a TCP connection to the radio's control port
/// succeeds within `deadline`.
pub async fn is_reachable(address: IpAddr, deadline: Duration) -> bool {
    let target = SocketAddr::new(address, CONTROL_PORT);
    match timeout(deadline, TcpStream::connect(target)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            trace!(%target, error = %e, "probe refused");
            false
        }
        Err(_) => {
            trace!(%target, "probe timed out");
            false
        }
    }
}
