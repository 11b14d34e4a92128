//! Events the transport layer delivers to the pipeline.
//!
//! The transport pushes [`TransportEvent`]s onto a bounded queue in the
//! order it decodes them. Lifecycle variants exist for logging only; just
//! [`TransportEvent::Message`] carries data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded push from one subscribed channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Channel name with any user prefix removed
    /// (`memory/shard0/stats`, `cpu`, `console`).
    pub channel: String,
    /// Payload exactly as decoded from the frame.
    pub payload: Value,
}

impl ChannelMessage {
    /// Build a message for `channel`.
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            payload,
        }
    }
}

/// Everything the transport reports, in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransportEvent {
    /// The socket opened.
    Connected,
    /// The socket closed. No further events follow.
    Disconnected,
    /// The server answered the auth command.
    Auth {
        /// Whether the server accepted the token.
        ok: bool,
    },
    /// A subscribe command was sent for `channel`.
    Subscribed {
        /// Channel name without the user prefix.
        channel: String,
    },
    /// An unsubscribe command was sent for `channel`.
    Unsubscribed {
        /// Channel name without the user prefix.
        channel: String,
    },
    /// Data pushed on a subscribed channel.
    Message(ChannelMessage),
}
