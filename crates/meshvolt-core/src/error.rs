// ── Core error types ──
//
// The engine surfaces errors for exactly two things: construction-time
// misconfiguration and operations targeting the root radio explicitly.
// Per-station failures during crawl and poll are policy, not errors --
// they are logged, counted, and folded into the result set.

use std::net::IpAddr;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Construction-time misconfiguration -- rejected before any
    /// network activity begins.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The root radio could not be reached.
    #[error("Root radio unavailable at {address}: {reason}")]
    RootUnavailable { address: IpAddr, reason: String },

    /// RPC-layer failure on an operation that propagates errors
    /// (root-radio reads).
    #[error("RPC error: {0}")]
    Api(#[from] meshvolt_api::Error),
}
