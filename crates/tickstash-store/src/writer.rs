//! Fire-and-forget document writer with a cap on in-flight writes.
//!
//! Each submitted document is written by its own task. A semaphore bounds
//! how many of those tasks may be talking to the store at once; when the
//! cap is reached, [`DocumentWriter::submit`] waits for a slot, which slows
//! the event pipeline down instead of queueing without limit.
//!
//! Write failures are logged at `warn` and dropped. Nothing is retried.

use std::sync::Arc;

use tickstash_types::Document;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::StoreError;
use crate::sink::DocumentSink;

/// Bounded, concurrent document writer.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    sink: DocumentSink,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl DocumentWriter {
    /// Create a writer allowing at most `max_in_flight` concurrent writes.
    /// A limit of zero is raised to one.
    pub fn new(sink: DocumentSink, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            sink,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// The sink documents are written to.
    pub const fn sink(&self) -> &DocumentSink {
        &self.sink
    }

    /// Number of writes currently running.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.permits.available_permits())
    }

    /// Start writing `doc` in the background.
    ///
    /// Waits while the in-flight cap is reached. The returned handle
    /// resolves once the write has finished, successfully or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the writer has been closed.
    pub async fn submit(&self, doc: Document) -> Result<JoinHandle<()>, StoreError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_closed| StoreError::Closed)?;
        let sink = self.sink.clone();

        Ok(tokio::spawn(async move {
            if let Err(e) = sink.index(&doc).await {
                warn!(
                    destination = doc.destination,
                    kind = %doc.kind,
                    error = %e,
                    "Failed to write document"
                );
            }
            drop(permit);
        }))
    }

    /// Refuse further submissions. Writes already started keep running.
    pub fn close(&self) {
        self.permits.close();
    }
}
