// ── Address resolution ──
//
// The deployment's addressing scheme derives each radio's IPv4 address
// from its link-layer address: the last two MAC octets appended to a
// fixed /16 prefix. Pure arithmetic, no I/O.

use std::net::Ipv4Addr;

use crate::model::MacAddress;

/// Map a radio's link-layer address to its IPv4 address under the mesh
/// addressing scheme.
///
/// Deterministic: the same MAC and prefix always yield the same address.
#[must_use]
pub fn mesh_address(mac: &MacAddress, prefix: [u8; 2]) -> Ipv4Addr {
    let octets = mac.octets();
    Ipv4Addr::new(prefix[0], prefix[1], octets[4], octets[5])
}
