//! Stats transformer: one document per entity of a per-tick stats payload.
//!
//! Memory channels deliver the stats object as a JSON-encoded string. Early
//! in a tick cycle the value is often missing, which arrives as an absent
//! payload or the literal string `"undefined"`; both produce no documents.
//!
//! ```text
//! memory/shard0/stats  {"tick": 100, "gcl": {"level": 5}, "note": "x"}
//!     --> stats-gcl-<date>  {timestamp, tick: 100, shard: "shard0", level: 5}
//! ```

use serde_json::{Map, Value};
use tickstash_types::{Document, DocumentKind, EntityId, ShardName, StatsEvent, TICK_KEY};

use crate::capture::Capture;
use crate::error::{json_type_name, TransformError};
use crate::index::IndexNaming;

/// Channel label used in errors and logs.
const CHANNEL: &str = "stats";

/// Marker the server sends when the memory path holds no value.
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Body field holding the shard name.
pub const SHARD_FIELD: &str = "shard";

/// Decode a stats payload.
///
/// Returns `Ok(None)` for the empty cases (absent, `null`, empty string,
/// `"undefined"`). Top-level values other than `tick` that are not objects
/// are dropped.
///
/// # Errors
///
/// Returns [`TransformError::Payload`] if a string payload is not JSON,
/// [`TransformError::NotAnObject`] if the payload is not an object, and
/// [`TransformError::InvalidTick`] if `tick` is present but not a
/// non-negative integer.
pub fn decode(shard: Option<ShardName>, payload: Value) -> Result<Option<StatsEvent>, TransformError> {
    let object = match payload {
        Value::Null => return Ok(None),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() || raw == UNDEFINED_SENTINEL {
                return Ok(None);
            }
            match serde_json::from_str::<Value>(raw).map_err(|source| TransformError::Payload {
                channel: CHANNEL,
                source,
            })? {
                Value::Null => return Ok(None),
                Value::Object(object) => object,
                other => {
                    return Err(TransformError::NotAnObject {
                        channel: CHANNEL,
                        found: json_type_name(&other),
                    });
                }
            }
        }
        Value::Object(object) => object,
        other => {
            return Err(TransformError::NotAnObject {
                channel: CHANNEL,
                found: json_type_name(&other),
            });
        }
    };

    let mut event = StatsEvent {
        shard,
        ..StatsEvent::default()
    };

    for (key, value) in object {
        if key == TICK_KEY {
            event.tick = parse_tick(&value)?;
            continue;
        }
        if let Value::Object(fields) = value {
            event.entities.insert(EntityId::from(key), fields);
        }
    }

    Ok(Some(event))
}

/// Build one document per entity.
///
/// Entity fields are copied first; `timestamp`, `tick`, and `shard` are
/// written last so an entity cannot shadow them.
pub fn documents(event: &StatsEvent, capture: &Capture, naming: &IndexNaming) -> Vec<Document> {
    event
        .entities
        .iter()
        .map(|(entity, fields)| {
            let mut body: Map<String, Value> = fields.clone();
            capture.stamp(&mut body);
            if let Some(tick) = event.tick {
                body.insert(TICK_KEY.to_owned(), Value::from(tick));
            }
            if let Some(shard) = &event.shard {
                body.insert(SHARD_FIELD.to_owned(), Value::String(shard.to_string()));
            }
            Document::new(
                naming.destination(DocumentKind::Stats, Some(entity), capture.date()),
                DocumentKind::Stats,
                body,
            )
        })
        .collect()
}

/// Decode and transform in one step.
///
/// # Errors
///
/// Propagates [`decode`] errors.
pub fn transform(
    shard: Option<ShardName>,
    payload: Value,
    capture: &Capture,
    naming: &IndexNaming,
) -> Result<Vec<Document>, TransformError> {
    Ok(decode(shard, payload)?
        .map(|event| documents(&event, capture, naming))
        .unwrap_or_default())
}

/// Read the reserved tick field. `null` counts as absent.
fn parse_tick(value: &Value) -> Result<Option<u64>, TransformError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number.as_u64().map(Some).ok_or_else(|| {
            TransformError::InvalidTick {
                value: number.to_string(),
            }
        }),
        other => Err(TransformError::InvalidTick {
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn capture() -> Capture {
        Capture::at(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
    }

    fn shard0() -> Option<ShardName> {
        Some(ShardName::from("shard0"))
    }

    #[test]
    fn one_document_per_entity_object() {
        let payload = json!({ "tick": 100, "gcl": { "level": 5, "progress": 1000 } });
        let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();

        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.destination, "stats-gcl-2026-10-19");
        assert_eq!(doc.kind, DocumentKind::Stats);
        assert_eq!(
            Value::Object(doc.body.clone()),
            json!({
                "timestamp": "2026-10-19T12:00:00.000Z",
                "tick": 100,
                "shard": "shard0",
                "level": 5,
                "progress": 1000
            })
        );
    }

    #[test]
    fn json_string_payload_is_decoded() {
        let payload = Value::String(r#"{"tick": 7, "cpu": {"used": 3.5}, "rooms": {"W1N1": {"rcl": 4}}}"#.to_owned());
        let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();

        assert_eq!(docs.len(), 2);
        let destinations: Vec<&str> = docs.iter().map(|d| d.destination.as_str()).collect();
        assert!(destinations.contains(&"stats-cpu-2026-10-19"));
        assert!(destinations.contains(&"stats-rooms-2026-10-19"));
        for doc in &docs {
            assert_eq!(doc.field("tick"), Some(&json!(7)));
            assert_eq!(doc.field("shard"), Some(&json!("shard0")));
        }
    }

    #[test]
    fn non_object_values_are_skipped() {
        let payload = json!({ "tick": 5, "note": "not an object" });
        let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn mixed_values_yield_one_document_per_object() {
        let payload = json!({
            "tick": 9,
            "a": { "x": 1 },
            "b": [1, 2],
            "c": 4,
            "d": { "y": 2 },
            "e": null
        });
        let docs = transform(None, payload, &capture(), &IndexNaming::new()).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn empty_payloads_produce_nothing() {
        for payload in [
            Value::Null,
            json!(""),
            json!("undefined"),
            json!("  undefined  "),
            json!("null"),
        ] {
            let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();
            assert!(docs.is_empty());
        }
    }

    #[test]
    fn shard_is_omitted_when_unknown() {
        let payload = json!({ "tick": 1, "gcl": { "level": 2 } });
        let docs = transform(None, payload, &capture(), &IndexNaming::new()).unwrap();
        assert_eq!(docs[0].field("shard"), None);
    }

    #[test]
    fn missing_tick_is_omitted() {
        let payload = json!({ "gcl": { "level": 2 } });
        let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();
        assert_eq!(docs[0].field("tick"), None);
        assert!(docs[0].field("timestamp").is_some());
    }

    #[test]
    fn entity_cannot_shadow_reserved_fields() {
        let payload = json!({ "tick": 42, "weird": { "tick": 1, "shard": "other", "timestamp": "x" } });
        let docs = transform(shard0(), payload, &capture(), &IndexNaming::new()).unwrap();
        let doc = &docs[0];
        assert_eq!(doc.field("tick"), Some(&json!(42)));
        assert_eq!(doc.field("shard"), Some(&json!("shard0")));
        assert_eq!(doc.field("timestamp"), Some(&json!("2026-10-19T12:00:00.000Z")));
    }

    #[test]
    fn same_day_events_share_destination() {
        let naming = IndexNaming::new();
        let first = transform(shard0(), json!({ "tick": 1, "gcl": {} }), &capture(), &naming).unwrap();
        let later = Capture::at(
            Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        );
        let second = transform(shard0(), json!({ "tick": 2, "gcl": {} }), &later, &naming).unwrap();
        assert_eq!(first[0].destination, second[0].destination);
    }

    #[test]
    fn malformed_json_string_is_an_error() {
        let err = transform(shard0(), json!("{not json"), &capture(), &IndexNaming::new());
        assert!(matches!(err, Err(TransformError::Payload { .. })));
    }

    #[test]
    fn array_payload_is_an_error() {
        let err = transform(shard0(), json!([1, 2]), &capture(), &IndexNaming::new());
        assert!(matches!(
            err,
            Err(TransformError::NotAnObject { found: "array", .. })
        ));
    }

    #[test]
    fn negative_tick_is_rejected() {
        let err = decode(shard0(), json!({ "tick": -1, "gcl": {} }));
        assert!(matches!(err, Err(TransformError::InvalidTick { .. })));
    }
}
