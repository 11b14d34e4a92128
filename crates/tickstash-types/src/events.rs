//! Payloads delivered on the subscribed channels.
//!
//! Each channel carries its own payload shape:
//!
//! | Channel | Payload |
//! |---------|---------|
//! | `memory/<shard>/stats` | [`StatsEvent`] (JSON-encoded string on the wire) |
//! | `cpu` | [`CpuEvent`] |
//! | `console` | [`ConsoleEvent`] |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::names::{EntityId, ShardName};

/// Reserved top-level key holding the tick number of a stats payload.
pub const TICK_KEY: &str = "tick";

/// A per-tick stats payload.
///
/// The wire object mixes the reserved `tick` field with one sub-object per
/// entity. Non-object values other than `tick` carry no entity and are not
/// represented here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsEvent {
    /// Shard implied by the channel the payload arrived on.
    pub shard: Option<ShardName>,
    /// Simulation tick the stats were captured at, when present.
    pub tick: Option<u64>,
    /// Field map of every entity object, keyed by entity id.
    pub entities: BTreeMap<EntityId, Map<String, Value>>,
}

/// One CPU/memory sample. Not tagged with a shard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuEvent {
    /// CPU used in the sampled tick.
    #[serde(default)]
    pub cpu: Option<Number>,
    /// Memory size in bytes.
    #[serde(default)]
    pub memory: Option<Number>,
}

/// Console output of one tick.
///
/// The server nests the line arrays under `messages`; the flattened shape
/// (`log`/`results` at the top level) is accepted as well. Lines from both
/// places are kept, nested ones first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConsoleEvent")]
pub struct ConsoleEvent {
    /// Shard the output originates from, if tagged.
    pub shard: Option<ShardName>,
    /// Raw log lines, possibly wrapped in a `<log>`/`<font>` tag.
    pub log: Vec<String>,
    /// Echoed console command results.
    pub results: Vec<String>,
    /// A single error line.
    pub error: Option<String>,
}

impl ConsoleEvent {
    /// Whether the event carries nothing to index.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty() && self.results.is_empty() && self.error.is_none()
    }
}

/// Nested line arrays as sent by the server.
#[derive(Debug, Default, Deserialize)]
struct RawConsoleMessages {
    #[serde(default)]
    log: Vec<String>,
    #[serde(default)]
    results: Vec<String>,
}

/// Wire form of [`ConsoleEvent`] before the two shapes are merged.
#[derive(Debug, Default, Deserialize)]
struct RawConsoleEvent {
    #[serde(default)]
    shard: Option<String>,
    #[serde(default)]
    messages: Option<RawConsoleMessages>,
    #[serde(default)]
    log: Vec<String>,
    #[serde(default)]
    results: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawConsoleEvent> for ConsoleEvent {
    fn from(raw: RawConsoleEvent) -> Self {
        let nested = raw.messages.unwrap_or_default();
        let mut log = nested.log;
        log.extend(raw.log);
        let mut results = nested.results;
        results.extend(raw.results);

        Self {
            shard: raw.shard.filter(|s| !s.is_empty()).map(ShardName::from),
            log,
            results,
            error: raw.error,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn console_event_reads_nested_server_shape() {
        let event: ConsoleEvent = serde_json::from_value(serde_json::json!({
            "shard": "shard0",
            "messages": { "log": ["hello"], "results": ["42"] }
        }))
        .unwrap();
        assert_eq!(event.shard, Some(ShardName::from("shard0")));
        assert_eq!(event.log, vec!["hello".to_owned()]);
        assert_eq!(event.results, vec!["42".to_owned()]);
        assert!(event.error.is_none());
    }

    #[test]
    fn console_event_reads_flat_shape() {
        let event: ConsoleEvent = serde_json::from_value(serde_json::json!({
            "log": ["plain warning text"]
        }))
        .unwrap();
        assert_eq!(event.shard, None);
        assert_eq!(event.log.len(), 1);
    }

    #[test]
    fn empty_shard_is_treated_as_untagged() {
        let event: ConsoleEvent =
            serde_json::from_value(serde_json::json!({ "shard": "", "error": "boom" })).unwrap();
        assert_eq!(event.shard, None);
        assert_eq!(event.error.as_deref(), Some("boom"));
        assert!(!event.is_empty());
    }

    #[test]
    fn console_event_without_lines_is_empty() {
        let event: ConsoleEvent =
            serde_json::from_value(serde_json::json!({ "shard": "shard1", "messages": {} }))
                .unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn cpu_event_keeps_integer_memory() {
        let event: CpuEvent =
            serde_json::from_value(serde_json::json!({ "cpu": 12.5, "memory": 900_000 })).unwrap();
        assert_eq!(event.memory, Some(Number::from(900_000)));
        assert_eq!(
            serde_json::to_value(&event.cpu).unwrap(),
            serde_json::json!(12.5)
        );
    }
}
