//! Documents produced by the transformers and handed to the document store.
//!
//! A [`Document`] is addressed by `(destination, kind)` and carries a flat
//! JSON object as its body. Every body has a `timestamp` field holding the
//! capture time; the transformers guarantee this, the type does not.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three document types written by the bridge.
///
/// The kind doubles as the destination prefix, so `Log` documents land in
/// `log-<date>` and are indexed with type `log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// One entity object of a per-tick stats payload.
    Stats,
    /// One CPU/memory sample.
    Performance,
    /// One console line (log, result, or error).
    Log,
}

impl DocumentKind {
    /// The wire name of this kind (`stats`, `performance`, `log`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Performance => "performance",
            Self::Log => "log",
        }
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured record bound for the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Date-partitioned index name (e.g. `stats-gcl-2026-10-19`).
    pub destination: String,
    /// Document type.
    pub kind: DocumentKind,
    /// Field map written as the document source.
    pub body: Map<String, Value>,
}

impl Document {
    /// Create a document from its parts.
    pub const fn new(destination: String, kind: DocumentKind, body: Map<String, Value>) -> Self {
        Self {
            destination,
            kind,
            body,
        }
    }

    /// Look up a body field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}
