// ── Engine configuration ──
//
// Everything the engine needs is handed in here at construction time.
// The engine never reads config files or global state; the binary (or
// the host plugin embedding the engine) builds one of these and passes
// it to `Engine::new`.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use secrecy::SecretString;

use meshvolt_api::{Credentials, TransportConfig};

use crate::error::CoreError;

/// Configuration for a telemetry engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address of the root radio, the mesh entry point.
    pub root_address: IpAddr,
    /// Username accepted by every radio's control endpoint.
    pub username: String,
    /// Password for the control endpoint.
    pub password: SecretString,
    /// First two octets of the mesh IPv4 range (the /16 the radios
    /// derive their addresses in).
    pub network_prefix: [u8; 2],
    /// Maximum age of the discovered topology before a re-crawl.
    pub topology_ttl: Duration,
    /// Pack voltage mapped to 0%.
    pub voltage_min: f64,
    /// Pack voltage mapped to 100%.
    pub voltage_max: f64,
    /// Maximum number of concurrent per-station polls.
    pub poll_width: usize,
    /// Per-call network timeout (connect and request).
    pub request_timeout: Duration,
    /// Consecutive login failures after which a station is evicted.
    pub eviction_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_address: IpAddr::V4(Ipv4Addr::new(10, 223, 68, 37)),
            username: "configurator".into(),
            password: SecretString::from(String::new()),
            network_prefix: [10, 223],
            topology_ttl: Duration::from_secs(60),
            voltage_min: 6.6,
            voltage_max: 8.2,
            poll_width: 10,
            request_timeout: Duration::from_secs(2),
            eviction_threshold: 3,
        }
    }
}

impl EngineConfig {
    /// Validate construction-time invariants.
    ///
    /// Called by `Engine::new` -- a misconfigured engine is rejected
    /// here, before any network activity begins.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.voltage_max <= self.voltage_min {
            return Err(CoreError::Config {
                message: format!(
                    "voltage_max ({}) must exceed voltage_min ({})",
                    self.voltage_max, self.voltage_min
                ),
            });
        }
        if self.poll_width == 0 {
            return Err(CoreError::Config {
                message: "poll_width must be at least 1".into(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request_timeout must be nonzero".into(),
            });
        }
        if self.eviction_threshold == 0 {
            return Err(CoreError::Config {
                message: "eviction_threshold must be at least 1".into(),
            });
        }
        if self.username.is_empty() {
            return Err(CoreError::Config {
                message: "username must not be empty".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.request_timeout,
            ..TransportConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_voltage_range_rejected() {
        let config = EngineConfig {
            voltage_min: 8.2,
            voltage_max: 6.6,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn zero_width_rejected() {
        let config = EngineConfig {
            poll_width: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
