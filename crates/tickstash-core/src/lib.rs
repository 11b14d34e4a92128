//! Channel routing, payload transformers, and index naming for tickstash.
//!
//! This crate turns channel messages from the game server into documents
//! ready for the store. It performs no I/O apart from reading the
//! configuration file.
//!
//! # Modules
//!
//! - [`capture`] -- Capture instant attached to every document.
//! - [`config`] -- Configuration loading from `tickstash.yaml` into
//!   strongly-typed structs.
//! - [`console`] -- Console lines to `log` documents.
//! - [`error`] -- [`TransformError`] for payloads that do not fit a channel.
//! - [`index`] -- Destination naming.
//! - [`markup`] -- Extraction of `<log>`/`<font>` wrappers from console lines.
//! - [`performance`] -- CPU/memory samples to `performance` documents.
//! - [`router`] -- Channel name to transformer dispatch.
//! - [`stats`] -- Per-tick stats to per-entity `stats` documents.
//!
//! [`TransformError`]: error::TransformError

pub mod capture;
pub mod config;
pub mod console;
pub mod error;
pub mod index;
pub mod markup;
pub mod performance;
pub mod router;
pub mod stats;

pub use capture::Capture;
pub use config::{ConfigError, StoreBackend, TickstashConfig};
pub use error::TransformError;
pub use index::IndexNaming;
pub use router::{Route, Router};
