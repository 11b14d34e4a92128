//! Error types for the game server transport.
//!
//! Uses `thiserror` for typed errors that surface through connection setup
//! and subscription management: HTTP API calls, the socket handshake, and
//! command delivery.

/// Errors that can occur while talking to the game server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An HTTP API request could not be sent or its response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An HTTP API endpoint answered with a non-success status.
    #[error("API error on {endpoint}: HTTP {status}: {body}")]
    Api {
        /// Endpoint path (e.g. `api/auth/me`).
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// Neither a token nor an email/password pair is configured.
    #[error("no credentials configured: set server.token or server.email and server.password")]
    MissingCredentials,

    /// The server URL cannot be turned into a socket URL.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// The WebSocket connection failed.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The server rejected the auth token.
    #[error("socket authentication failed")]
    AuthFailed,

    /// The server did not answer the auth command in time.
    #[error("socket authentication timed out")]
    AuthTimeout,

    /// The socket is closed; no further commands can be sent.
    #[error("socket closed")]
    Closed,

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
