//! Service context: the handles every component shares.
//!
//! Built once at startup from the validated configuration and passed by
//! reference. Closing it is explicit; nothing here lives in module state.

use tickstash_core::{Router, TickstashConfig};
use tickstash_store::{DocumentSink, DocumentWriter};
use tickstash_transport::ScreepsClient;
use tickstash_types::TransportEvent;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::IngestError;
use crate::retention::RetentionJob;

/// Process-wide handles, constructed once.
#[derive(Debug)]
pub struct ServiceContext {
    config: TickstashConfig,
    router: Router,
    writer: DocumentWriter,
}

impl ServiceContext {
    /// Validate `config` and build the store handles from it.
    pub fn build(config: TickstashConfig) -> Result<Self, IngestError> {
        config.validate()?;
        let sink = DocumentSink::from_config(&config.store)?;
        let writer = DocumentWriter::new(sink, config.store.max_in_flight_writes);
        let router = Router::new(config.indices.naming());
        Ok(Self {
            config,
            router,
            writer,
        })
    }

    /// The configuration the context was built from.
    pub const fn config(&self) -> &TickstashConfig {
        &self.config
    }

    /// Router shared by the pipeline.
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Writer shared by the pipeline.
    pub const fn writer(&self) -> &DocumentWriter {
        &self.writer
    }

    /// Log whether the document store answers. Never fails.
    pub async fn check_store(&self) {
        let DocumentSink::Elasticsearch(store) = self.writer.sink() else {
            info!(sink = self.writer.sink().name(), "Document store check skipped");
            return;
        };
        if let Err(e) = store.ping().await {
            warn!(
                url = store.base_url(),
                error = %e,
                "Document store not reachable, writes will fail until it is"
            );
        }
    }

    /// The retention job, if enabled.
    pub fn retention_job(&self) -> Option<RetentionJob> {
        self.config
            .retention
            .enabled
            .then(|| RetentionJob::new(self.config.retention.clone()))
    }

    /// Open the game server session.
    pub async fn connect(
        &self,
    ) -> Result<(ScreepsClient, mpsc::Receiver<TransportEvent>), IngestError> {
        Ok(ScreepsClient::connect(&self.config.server, self.config.transport.event_buffer).await?)
    }

    /// Stop accepting writes. Writes already running are not awaited.
    pub fn close(&self) {
        self.writer.close();
        info!(in_flight_writes = self.writer.in_flight(), "Document writer closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tickstash_core::StoreBackend;
    use tickstash_types::ChannelMessage;

    use super::*;

    fn config() -> TickstashConfig {
        let mut config = TickstashConfig::default();
        config.server.token = Some("abc".to_owned());
        config.store.backend = StoreBackend::Stdout;
        config.indices.namespace = Some("screeps".to_owned());
        config
    }

    #[test]
    fn build_wires_naming_and_sink() {
        let context = ServiceContext::build(config()).unwrap();
        assert_eq!(context.writer().sink().name(), "stdout");

        let docs = context
            .router()
            .route(
                ChannelMessage::new("cpu", serde_json::json!({ "cpu": 1 })),
                &tickstash_core::Capture::now(),
            )
            .unwrap();
        assert!(docs[0].destination.starts_with("screeps-performance-"));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = config();
        config.server.token = None;
        assert!(matches!(
            ServiceContext::build(config),
            Err(IngestError::Config { .. })
        ));
    }

    #[test]
    fn retention_job_follows_enabled_flag() {
        let context = ServiceContext::build(config()).unwrap();
        assert!(context.retention_job().is_some());

        let mut disabled = config();
        disabled.retention.enabled = false;
        let context = ServiceContext::build(disabled).unwrap();
        assert!(context.retention_job().is_none());
    }

    #[tokio::test]
    async fn close_refuses_new_writes() {
        let context = ServiceContext::build(config()).unwrap();
        context.check_store().await;
        context.close();
        let doc = tickstash_types::Document::new(
            "log-2026-10-19".to_owned(),
            tickstash_types::DocumentKind::Log,
            serde_json::Map::new(),
        );
        assert!(context.writer().submit(doc).await.is_err());
    }
}
