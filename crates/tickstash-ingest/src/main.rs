//! Bridge binary: streams game server telemetry into Elasticsearch.
//!
//! This is the main entry point that wires together the game server
//! session, the channel router, the document writer, and the retention
//! schedule. It runs until a shutdown signal arrives or the server closes
//! the socket.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tickstash.yaml` (or `TICKSTASH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the service context (document sink, bounded writer, router)
//! 4. Start the retention schedule
//! 5. Connect and authenticate with the game server
//! 6. Start the event pipeline
//! 7. Subscribe to stats, cpu, and console channels
//! 8. Wait for SIGINT, SIGTERM, or the end of the event stream
//! 9. Unsubscribe, disconnect, and exit without draining writes

mod context;
mod error;
mod logging;
mod pipeline;
mod retention;
mod subscriber;

use std::path::PathBuf;

use tickstash_core::TickstashConfig;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::context::ServiceContext;
use crate::error::IngestError;
use crate::pipeline::PipelineStats;
use crate::retention::RetentionJob;
use crate::subscriber::Subscriber;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "TICKSTASH_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "tickstash.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if startup fails or the server closes the stream.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = TickstashConfig::load(&config_path)?;

    // 2. Initialize structured logging.
    logging::init(&config.logging)?;
    info!(
        config = %config_path.display(),
        found = config_path.exists(),
        "tickstash-ingest starting"
    );

    // 3. Service context: document sink, bounded writer, router.
    let context = ServiceContext::build(config)?;
    let config = context.config();
    info!(
        server = config.server.url,
        store_backend = ?config.store.backend,
        store_url = config.store.endpoint(),
        namespace = ?config.indices.namespace,
        max_in_flight_writes = config.store.max_in_flight_writes,
        retention = config.retention.enabled,
        "Configuration loaded"
    );
    context.check_store().await;

    // 4. Retention schedule.
    let retention = context.retention_job().map(RetentionJob::spawn);

    // 5. Game server session.
    let (client, events) = context.connect().await?;

    // 6. Event pipeline. Started before subscribing so acks are consumed.
    let mut pipeline = tokio::spawn(pipeline::run(
        events,
        context.router().clone(),
        context.writer().clone(),
    ));

    // 7. Subscriptions, then 8. wait.
    let mut subscriber = Subscriber::new(client);
    let outcome = match subscriber
        .subscribe_all(config.server.shards.as_deref())
        .await
    {
        Ok(channels) => {
            info!(channels = ?channels, "Streaming telemetry");
            wait_for_shutdown(&mut pipeline).await
        }
        Err(e) => Err(IngestError::from(e)),
    };
    if let Err(e) = &outcome {
        error!(error = %e, "shutting down after error");
    }

    // 9. Teardown.
    subscriber.shutdown().await;
    context.close();
    pipeline.abort();
    if let Some(handle) = retention {
        handle.abort();
    }
    info!("tickstash-ingest shutdown complete");

    outcome.map_err(Into::into)
}

/// Path of the configuration file.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Wait for SIGINT, SIGTERM, or the pipeline finishing. The pipeline only
/// finishes when the server side closed, which is reported as an error.
async fn wait_for_shutdown(pipeline: &mut JoinHandle<PipelineStats>) -> Result<(), IngestError> {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received SIGINT");
            Ok(())
        }
        () = terminate => {
            info!("received SIGTERM");
            Ok(())
        }
        result = pipeline => {
            if let Err(e) = result {
                error!(error = %e, "pipeline task failed");
            }
            Err(IngestError::StreamEnded)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tickstash_core::Router;
    use tickstash_store::{DocumentSink, DocumentWriter, MemorySink};
    use tickstash_types::TransportEvent;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn stream_end_is_reported_as_shutdown_error() {
        let writer = DocumentWriter::new(DocumentSink::Memory(MemorySink::new()), 1);
        let (tx, rx) = mpsc::channel(4);
        let mut pipeline = tokio::spawn(pipeline::run(rx, Router::default(), writer));

        tx.send(TransportEvent::Connected).await.unwrap();
        tx.send(TransportEvent::Disconnected).await.unwrap();
        drop(tx);

        let outcome = tokio::time::timeout(Duration::from_secs(5), wait_for_shutdown(&mut pipeline))
            .await
            .unwrap();
        assert!(matches!(outcome, Err(IngestError::StreamEnded)));
    }
}
