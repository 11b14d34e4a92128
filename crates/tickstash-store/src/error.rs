//! Error types for the document store.
//!
//! All errors are propagated via [`StoreError`]. The writer logs them and
//! moves on; nothing here stops the pipeline.

/// Errors that can occur while writing documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request could not be built, sent, or completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store rejected document for {destination}: HTTP {status}: {body}")]
    Rejected {
        /// Destination the document was addressed to.
        destination: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// A document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to standard output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer's concurrency limiter has been closed.
    #[error("document writer is closed")]
    Closed,
}
