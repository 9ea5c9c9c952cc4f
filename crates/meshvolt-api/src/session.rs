// Session-oriented client for a single mesh radio.
//
// One RadioSession maps to one radio for the duration of one operation:
// construct, login, issue authenticated calls, logout. Sessions are
// never shared across peers -- crawl and poll paths build a fresh one
// per visit.

use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rpc::{NULL_SESSION, UbusResponse};
use crate::transport::TransportConfig;

/// Divisor converting the raw `VIN VOLTAGE` reading to volts.
const VIN_SCALE: f64 = 20.2;

/// Sensor readout file on the radio's filesystem.
const SENSOR_FILE: &str = "/tmp/run/pancake.txt";

/// Wireless interface queried for peer associations.
const WLAN_DEVICE: &str = "wlan0";

/// Credentials accepted by a radio's control endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// One directly associated peer, as reported by `iwinfo.assoclist`.
#[derive(Debug, Clone, Deserialize)]
pub struct Association {
    /// Link-layer address of the peer.
    pub mac: String,
    /// Received signal strength in dBm.
    pub signal: Option<i64>,
    /// Noise floor in dBm.
    pub noise: Option<i64>,
    /// Seconds since the peer last transmitted.
    pub inactive: Option<u64>,
}

/// Authenticated RPC session against a single radio.
///
/// Lifecycle: construct -> [`login()`](Self::login) -> authenticated
/// calls -> [`logout()`](Self::logout). Every call carries the transport
/// timeout, so an unresponsive radio fails the call instead of stalling
/// the caller.
pub struct RadioSession {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
    token: Option<String>,
}

impl RadioSession {
    /// Create a session for the radio at `address`.
    ///
    /// The control endpoint is always `https://{address}/ubus`.
    pub fn new(
        address: IpAddr,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("https://{address}/ubus"))?;
        Ok(Self {
            http: transport.build_client()?,
            endpoint,
            credentials,
            token: None,
        })
    }

    /// Create a session against an arbitrary endpoint with a pre-built
    /// client. Used by tests to point a session at a mock server.
    pub fn with_endpoint(http: reqwest::Client, endpoint: Url, credentials: Credentials) -> Self {
        Self {
            http,
            endpoint,
            credentials,
            token: None,
        }
    }

    /// The RPC endpoint this session talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a login has succeeded on this session.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Authenticate with the radio.
    ///
    /// On success the opaque `ubus_rpc_session` token is stored and used
    /// for all subsequent calls. Any transport error, explicit RPC
    /// error, or malformed response leaves the session unauthenticated.
    pub async fn login(&mut self) -> Result<(), Error> {
        debug!(endpoint = %self.endpoint, "logging in");

        let args = json!({
            "username": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
        });

        let payload = self
            .call(NULL_SESSION, "session", "login", args)
            .await
            .map_err(|e| match e {
                // An error member on the login call means the radio
                // rejected the credentials, not that it spoke garbage.
                Error::Rpc { message } => Error::Authentication { message },
                other => other,
            })?;

        let token = payload
            .get("ubus_rpc_session")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Protocol {
                message: "login response missing ubus_rpc_session".into(),
            })?;

        self.token = Some(token.to_owned());
        debug!(endpoint = %self.endpoint, "login successful");
        Ok(())
    }

    /// Read the battery voltage from the radio's sensor readout file.
    ///
    /// Issues `file.exec` of `cat` on the sensor file, parses the
    /// captured stdout as JSON, and scales the raw `VIN VOLTAGE` field
    /// to volts.
    pub async fn read_voltage(&self) -> Result<f64, Error> {
        let token = self.token()?;

        let payload = self
            .call(
                token,
                "file",
                "exec",
                json!({ "command": "cat", "params": [SENSOR_FILE] }),
            )
            .await?;

        let stdout = payload
            .get("stdout")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Protocol {
                message: "exec response missing stdout".into(),
            })?;

        let voltage = parse_voltage(stdout)?;
        debug!(endpoint = %self.endpoint, voltage, "sensor read");
        Ok(voltage)
    }

    /// List the peers currently associated on the wireless interface.
    pub async fn list_associations(&self) -> Result<Vec<Association>, Error> {
        let token = self.token()?;

        let payload = self
            .call(token, "iwinfo", "assoclist", json!({ "device": WLAN_DEVICE }))
            .await?;

        let results = payload
            .get("results")
            .cloned()
            .ok_or_else(|| Error::Protocol {
                message: "assoclist response missing results".into(),
            })?;

        serde_json::from_value(results).map_err(|e| Error::Protocol {
            message: format!("malformed assoclist entry: {e}"),
        })
    }

    /// End the session and release the radio-side session slot.
    ///
    /// Best-effort: failures are logged at debug, never surfaced. Safe
    /// to call repeatedly; only the first call after a login does any
    /// work.
    pub async fn logout(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        match self.call(&token, "session", "destroy", json!({})).await {
            Ok(_) => debug!(endpoint = %self.endpoint, "logged out"),
            Err(e) => debug!(endpoint = %self.endpoint, error = %e, "logout failed (ignored)"),
        }
    }

    fn token(&self) -> Result<&str, Error> {
        self.token.as_deref().ok_or(Error::NotAuthenticated)
    }

    /// Issue one `method:"call"` RPC and unwrap the result payload.
    async fn call(
        &self,
        session: &str,
        namespace: &str,
        procedure: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "call",
            "params": [session, namespace, procedure, args],
        });

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Protocol {
                message: format!("HTTP {status} from radio"),
            });
        }

        let envelope: UbusResponse = resp.json().await.map_err(|e| Error::Protocol {
            message: format!("invalid RPC envelope: {e}"),
        })?;

        envelope.into_payload()
    }
}

/// Parse the sensor readout: a JSON document whose `VIN VOLTAGE` field
/// carries the raw ADC value. Radios emit it either as a number or as a
/// decimal string.
fn parse_voltage(stdout: &str) -> Result<f64, Error> {
    let doc: serde_json::Value =
        serde_json::from_str(stdout.trim()).map_err(|e| Error::Protocol {
            message: format!("sensor output is not valid JSON: {e}"),
        })?;

    let raw = doc.get("VIN VOLTAGE").ok_or_else(|| Error::Protocol {
        message: "sensor output missing VIN VOLTAGE".into(),
    })?;

    let raw = raw
        .as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| Error::Protocol {
            message: "VIN VOLTAGE is not numeric".into(),
        })?;

    Ok(raw / VIN_SCALE)
}
