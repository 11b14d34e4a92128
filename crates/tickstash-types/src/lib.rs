//! Shared type definitions for the tickstash telemetry bridge.
//!
//! Every crate in the workspace agrees on these types: the transport
//! produces [`TransportEvent`]s, the core turns channel payloads into
//! [`Document`]s, and the store writes them.
//!
//! # Modules
//!
//! - [`names`] -- Type-safe wrappers for shard names and stats entity ids
//! - [`events`] -- Channel payloads (stats, CPU samples, console output)
//! - [`document`] -- Documents bound for the store
//! - [`transport`] -- Lifecycle and data events emitted by the transport

pub mod document;
pub mod events;
pub mod names;
pub mod transport;

// Re-export all public types at crate root for convenience.
pub use document::{Document, DocumentKind};
pub use events::{ConsoleEvent, CpuEvent, StatsEvent, TICK_KEY};
pub use names::{EntityId, ShardName};
pub use transport::{ChannelMessage, TransportEvent};
