// ── Mesh link abstraction ──
//
// The crawl and poll engines reach radios through this seam instead of
// constructing RPC sessions directly. `UbusLink` is the production
// implementation backed by `meshvolt-api`; tests drive the engine
// against an in-memory mesh through the same two traits.

use std::future::Future;
use std::net::IpAddr;

use tracing::trace;

use meshvolt_api::{Credentials, RadioSession, TransportConfig, probe};

use crate::model::MacAddress;

/// Connection factory for the mesh: reachability probes and
/// authenticated session setup, one radio at a time.
pub trait MeshLink: Send + Sync {
    type Session: RadioVisit;

    /// Bare transport-level reachability check, bounded by the link's
    /// timeout. No RPC, no TLS.
    fn probe(&self, address: IpAddr) -> impl Future<Output = bool> + Send;

    /// Construct a session for `address` and log in. Any failure here
    /// counts as a login failure for the target station.
    fn open(
        &self,
        address: IpAddr,
    ) -> impl Future<Output = Result<Self::Session, meshvolt_api::Error>> + Send;
}

/// One authenticated visit to a radio.
pub trait RadioVisit: Send {
    /// Link-layer addresses of the peers currently associated with this
    /// radio.
    fn peers(&self) -> impl Future<Output = Result<Vec<MacAddress>, meshvolt_api::Error>> + Send;

    /// Battery voltage in volts.
    fn voltage(&self) -> impl Future<Output = Result<f64, meshvolt_api::Error>> + Send;

    /// Release the session. Runs on every exit path; never fails.
    fn close(self) -> impl Future<Output = ()> + Send;
}

// ── Production implementation ───────────────────────────────────────

/// HTTPS ubus sessions built from engine configuration.
#[derive(Clone)]
pub struct UbusLink {
    transport: TransportConfig,
    credentials: Credentials,
}

impl UbusLink {
    pub fn new(transport: TransportConfig, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }
}

impl MeshLink for UbusLink {
    type Session = RadioSession;

    async fn probe(&self, address: IpAddr) -> bool {
        probe::is_reachable(address, self.transport.timeout).await
    }

    async fn open(&self, address: IpAddr) -> Result<RadioSession, meshvolt_api::Error> {
        let mut session = RadioSession::new(address, self.credentials.clone(), &self.transport)?;
        session.login().await?;
        Ok(session)
    }
}

impl RadioVisit for RadioSession {
    async fn peers(&self) -> Result<Vec<MacAddress>, meshvolt_api::Error> {
        let associations = self.list_associations().await?;
        // Stale association entries occasionally carry garbage MACs;
        // drop them rather than failing the whole listing.
        Ok(associations
            .into_iter()
            .filter_map(|a| match MacAddress::parse(&a.mac) {
                Ok(mac) => Some(mac),
                Err(e) => {
                    trace!(error = %e, "dropping malformed association entry");
                    None
                }
            })
            .collect())
    }

    async fn voltage(&self) -> Result<f64, meshvolt_api::Error> {
        self.read_voltage().await
    }

    async fn close(mut self) {
        self.logout().await;
    }
}
