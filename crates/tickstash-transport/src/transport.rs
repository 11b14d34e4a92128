//! The [`Transport`] trait: subscription control over a server session.
//!
//! Data flows separately, through the event queue handed out when the
//! session is opened. This trait only covers the commands the subscriber
//! issues, which keeps the subscriber testable without a socket.

use std::future::Future;

use tickstash_types::ShardName;

use crate::error::TransportError;

/// Subscription control for a connected session.
pub trait Transport: Send {
    /// Discover the server's shards.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if discovery fails.
    fn shards(&self) -> impl Future<Output = Result<Vec<ShardName>, TransportError>> + Send;

    /// Subscribe to `channel` (without the user prefix). Subscribing twice
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the session has ended.
    fn subscribe(&mut self, channel: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Unsubscribe from `channel`. Unknown channels are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the session has ended.
    fn unsubscribe(&mut self, channel: &str)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Channels currently subscribed, in name order.
    fn subscriptions(&self) -> Vec<String>;

    /// Close the session.
    fn disconnect(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}
