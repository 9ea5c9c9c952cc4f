// meshvolt-api: Async client for the ubus JSON-RPC control endpoint on mesh radios

pub mod error;
pub mod probe;
pub mod session;
pub mod transport;

mod rpc;

pub use error::Error;
pub use session::{Association, Credentials, RadioSession};
pub use transport::{TlsMode, TransportConfig};
