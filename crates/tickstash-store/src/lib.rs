//! Document store for the tickstash telemetry bridge.
//!
//! Documents arrive from the router fully formed (destination, kind, body).
//! This crate only moves them to the configured sink.
//!
//! ```text
//! Router --> DocumentWriter::submit --> spawned task --> DocumentSink
//!                 (semaphore)                              |-- Elasticsearch (HTTP)
//!                                                          |-- Stdout (dry run)
//!                                                          +-- Memory (tests)
//! ```
//!
//! # Modules
//!
//! - [`elasticsearch`] -- HTTP sink for Elasticsearch
//! - [`sink`] -- [`DocumentSink`] dispatch and the in-memory sink
//! - [`writer`] -- Bounded concurrent [`DocumentWriter`]
//! - [`error`] -- Shared error types

pub mod elasticsearch;
pub mod error;
pub mod sink;
pub mod writer;

pub use elasticsearch::ElasticsearchSink;
pub use error::StoreError;
pub use sink::{DocumentSink, MemorySink};
pub use writer::DocumentWriter;
