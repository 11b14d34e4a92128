//! Error types for the ingest binary.
//!
//! [`IngestError`] is the top-level error type that wraps all possible
//! failure modes during startup and streaming.

/// Top-level error for the ingest binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tickstash_core::ConfigError,
    },

    /// The document store could not be set up.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: tickstash_store::StoreError,
    },

    /// Connecting, discovering shards, or subscribing failed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: tickstash_transport::TransportError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// The server closed the event stream.
    #[error("event stream ended")]
    StreamEnded,
}

/// Errors from one invocation of the retention tool.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    /// The tool could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Executable that was invoked.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
