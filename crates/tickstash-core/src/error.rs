//! Error types for payload transformation.
//!
//! A [`TransformError`] always concerns a single event. The pipeline logs
//! it and moves on to the next event; it never stops ingestion.

/// Errors raised while turning a channel payload into documents.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The payload (or the JSON string it wraps) is not valid JSON for the
    /// channel's payload shape.
    #[error("malformed {channel} payload: {source}")]
    Payload {
        /// Channel the payload arrived on.
        channel: &'static str,
        /// The underlying decode error.
        source: serde_json::Error,
    },

    /// The payload decoded to something other than a JSON object.
    #[error("{channel} payload is not an object (got {found})")]
    NotAnObject {
        /// Channel the payload arrived on.
        channel: &'static str,
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The reserved `tick` field is not a non-negative integer.
    #[error("stats tick is not a non-negative integer: {value}")]
    InvalidTick {
        /// The offending value, rendered as JSON.
        value: String,
    },
}

/// Name of a JSON value's type, for error messages.
pub(crate) const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
