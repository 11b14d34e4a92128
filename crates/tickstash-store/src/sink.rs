//! Document sinks.
//!
//! [`DocumentSink`] dispatches over the concrete sinks with an enum rather
//! than a trait object, the same way the selected store backend is a plain
//! config value.

use std::io::Write;
use std::sync::Arc;

use tickstash_core::config::{StoreBackend, StoreConfig};
use tickstash_types::Document;
use tokio::sync::Mutex;

use crate::elasticsearch::ElasticsearchSink;
use crate::error::StoreError;

/// Where documents end up.
#[derive(Debug, Clone)]
pub enum DocumentSink {
    /// HTTP writes to Elasticsearch.
    Elasticsearch(ElasticsearchSink),
    /// One JSON line per document on standard output.
    Stdout,
    /// In-process buffer, for tests and embedding.
    Memory(MemorySink),
}

impl DocumentSink {
    /// Build the sink selected by `store.backend`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Elasticsearch => {
                Ok(Self::Elasticsearch(ElasticsearchSink::from_config(config)?))
            }
            StoreBackend::Stdout => Ok(Self::Stdout),
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Elasticsearch(_) => "elasticsearch",
            Self::Stdout => "stdout",
            Self::Memory(_) => "memory",
        }
    }

    /// Write one document.
    ///
    /// # Errors
    ///
    /// Returns the underlying sink's [`StoreError`].
    pub async fn index(&self, doc: &Document) -> Result<(), StoreError> {
        match self {
            Self::Elasticsearch(sink) => sink.index(doc).await,
            Self::Stdout => write_line(doc),
            Self::Memory(sink) => {
                sink.push(doc.clone()).await;
                Ok(())
            }
        }
    }
}

/// Print `doc` as a single JSON line. The lock keeps concurrent writers
/// from interleaving within a line.
fn write_line(doc: &Document) -> Result<(), StoreError> {
    let line = serde_json::to_string(doc)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{line}")?;
    Ok(())
}

/// Shared, cloneable document buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: Arc<Mutex<Vec<Document>>>,
}

impl MemorySink {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    async fn push(&self, doc: Document) {
        self.documents.lock().await.push(doc);
    }

    /// Snapshot of everything written so far, in write order.
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.lock().await.clone()
    }

    /// Number of documents written so far.
    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    /// Whether nothing has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::{Map, Value};
    use tickstash_types::DocumentKind;

    use super::*;

    #[test]
    fn backend_selects_sink() {
        let sink = DocumentSink::from_config(&StoreConfig::default()).unwrap();
        assert_eq!(sink.name(), "elasticsearch");

        let config = StoreConfig {
            backend: StoreBackend::Stdout,
            ..StoreConfig::default()
        };
        assert_eq!(DocumentSink::from_config(&config).unwrap().name(), "stdout");
    }

    #[tokio::test]
    async fn memory_sink_keeps_write_order() {
        let memory = MemorySink::new();
        let sink = DocumentSink::Memory(memory.clone());
        for n in 0..3 {
            let mut body = Map::new();
            body.insert("n".to_owned(), Value::from(n));
            sink.index(&Document::new("performance-2026-10-19".to_owned(), DocumentKind::Performance, body))
                .await
                .unwrap();
        }
        let docs = memory.documents().await;
        assert_eq!(memory.len().await, 3);
        assert_eq!(docs[2].field("n"), Some(&Value::from(2)));
    }

    #[tokio::test]
    async fn stdout_sink_accepts_documents() {
        let doc = Document::new("log-2026-10-19".to_owned(), DocumentKind::Log, Map::new());
        DocumentSink::Stdout.index(&doc).await.unwrap();
    }
}
