use thiserror::Error;

/// Top-level error type for the `meshvolt-api` crate.
///
/// Covers every failure mode of a single radio call: authentication,
/// transport, and protocol. `meshvolt-core` decides policy on these
/// (retry counters, eviction, omission from results) -- nothing here is
/// fatal by itself.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The radio rejected the login call (bad credentials, session
    /// table full, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// An authenticated call was issued before a successful login.
    #[error("Not authenticated -- call login() first")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, timeout, DNS failure).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── RPC ─────────────────────────────────────────────────────────
    /// The radio returned an explicit `error` member or a nonzero ubus
    /// status code.
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// The response arrived but did not match the expected shape
    /// (missing `result`, malformed payload, unparseable sensor output).
    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Returns `true` if this error means the peer could not be reached
    /// at the transport level (as opposed to answering badly).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying on a
    /// later poll cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the radio explicitly rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::NotAuthenticated)
    }
}
