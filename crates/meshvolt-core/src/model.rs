// ── Domain model ──
//
// MacAddress is the stable identity of a radio; StationReading is the
// per-poll output handed to consumers. Everything here is transient --
// nothing is persisted across process restarts.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── MacAddress ──────────────────────────────────────────────────────

/// Error produced when parsing a link-layer address.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid MAC address '{input}': {reason}")]
pub struct MacParseError {
    input: String,
    reason: &'static str,
}

impl MacParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

/// Link-layer address of a radio: the stable unique identifier across
/// the mesh. Accepts colon- or dash-separated hex octets; displays as
/// lowercase colon-separated form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Parse from colon- or dash-separated hex octets.
    pub fn parse(raw: &str) -> Result<Self, MacParseError> {
        let mut octets = [0u8; 6];
        let mut count = 0;

        for part in raw.split([':', '-']) {
            if count == 6 {
                return Err(MacParseError::new(raw, "more than six octets"));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::new(raw, "octet is not two hex digits"))?;
            count += 1;
        }

        if count != 6 {
            return Err(MacParseError::new(raw, "expected six octets"));
        }

        Ok(Self(octets))
    }

    /// The raw octets, most significant first.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

// ── Readings ────────────────────────────────────────────────────────

/// One station's poll result: identity, resolved address, and the
/// battery reading. A station with no valid reading is omitted from
/// poll output entirely -- never represented by a placeholder value.
#[derive(Debug, Clone, Serialize)]
pub struct StationReading {
    pub mac: MacAddress,
    pub address: IpAddr,
    /// Battery voltage in volts.
    pub voltage: f64,
    /// Battery charge estimate in percent, clamped to 0..=100.
    pub percentage: f64,
}

/// A point-in-time battery reading from a single radio.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatteryLevel {
    pub voltage: f64,
    pub percentage: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_parses_colon_form() {
        let mac = MacAddress::parse("AA:BB:CC:DD:44:25").unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0x44, 0x25]);
    }

    #[test]
    fn mac_parses_dash_form() {
        let mac = MacAddress::parse("aa-bb-cc-dd-ee-ff").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_display_is_lowercase() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn mac_rejects_short_input() {
        assert!(MacAddress::parse("aa:bb:cc").is_err());
    }

    #[test]
    fn mac_rejects_garbage_octet() {
        assert!(MacAddress::parse("aa:bb:cc:dd:ee:zz").is_err());
        assert!(MacAddress::parse("").is_err());
    }

    #[test]
    fn mac_serde_round_trip() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"aa:bb:cc:dd:ee:ff\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
