//! Event loop: transport events in, store writes out.
//!
//! Events are handled one at a time in delivery order. Each resulting
//! document is handed to the [`DocumentWriter`], which writes it in the
//! background, so completion order in the store is not delivery order.

use tickstash_core::{Capture, Router};
use tickstash_store::DocumentWriter;
use tickstash_types::{ChannelMessage, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters for one run of the pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// Channel messages received.
    pub messages: u64,
    /// Documents handed to the writer.
    pub documents: u64,
    /// Messages whose payload did not fit their channel.
    pub rejected: u64,
}

/// Consume `events` until the transport closes the queue.
pub async fn run(
    mut events: mpsc::Receiver<TransportEvent>,
    router: Router,
    writer: DocumentWriter,
) -> PipelineStats {
    let mut stats = PipelineStats::default();

    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connected => info!("socket connected"),
            TransportEvent::Auth { ok } => info!(ok = ok, "socket auth"),
            TransportEvent::Subscribed { channel } => info!(channel = channel, "subscribed"),
            TransportEvent::Unsubscribed { channel } => info!(channel = channel, "unsubscribed"),
            TransportEvent::Disconnected => warn!("socket disconnected"),
            TransportEvent::Message(message) => {
                debug!(channel = message.channel, "event received");
                stats.messages = stats.messages.saturating_add(1);
                handle(&router, &writer, message, &mut stats).await;
            }
        }
    }

    info!(
        messages = stats.messages,
        documents = stats.documents,
        rejected = stats.rejected,
        "event stream ended"
    );
    stats
}

async fn handle(
    router: &Router,
    writer: &DocumentWriter,
    message: ChannelMessage,
    stats: &mut PipelineStats,
) {
    let channel = message.channel.clone();
    let docs = match router.route(message, &Capture::now()) {
        Ok(docs) => docs,
        Err(e) => {
            warn!(channel = channel, error = %e, "dropping payload");
            stats.rejected = stats.rejected.saturating_add(1);
            return;
        }
    };

    for doc in docs {
        match writer.submit(doc).await {
            Ok(_write) => stats.documents = stats.documents.saturating_add(1),
            Err(e) => warn!(channel = channel, error = %e, "document not submitted"),
        }
    }
}
