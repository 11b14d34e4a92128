//! Game server transport for the tickstash telemetry bridge.
//!
//! Opens an authenticated session with a Screeps-compatible server and
//! turns its socket pushes into [`TransportEvent`]s on a bounded queue.
//!
//! # Modules
//!
//! - [`api`] -- HTTP calls: sign-in, user lookup, shard discovery
//! - [`frame`] -- Text frame decoding and channel path handling
//! - [`socket`] -- [`ScreepsClient`], the WebSocket session
//! - [`transport`] -- [`Transport`] trait for subscription control
//! - [`error`] -- Shared error types
//!
//! [`TransportEvent`]: tickstash_types::TransportEvent

pub mod api;
pub mod error;
pub mod frame;
pub mod socket;
pub mod transport;

pub use api::ApiClient;
pub use error::TransportError;
pub use socket::ScreepsClient;
pub use transport::Transport;
