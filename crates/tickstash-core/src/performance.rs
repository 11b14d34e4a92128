//! Performance transformer: one document per CPU/memory sample.

use serde_json::{Map, Value};
use tickstash_types::{CpuEvent, Document, DocumentKind};

use crate::capture::Capture;
use crate::error::{json_type_name, TransformError};
use crate::index::IndexNaming;

/// Channel label used in errors and logs.
const CHANNEL: &str = "cpu";

/// Decode a CPU sample.
///
/// # Errors
///
/// Returns [`TransformError::NotAnObject`] if the payload is not an object
/// and [`TransformError::Payload`] if a field has the wrong type.
pub fn decode(payload: Value) -> Result<CpuEvent, TransformError> {
    if !payload.is_object() {
        return Err(TransformError::NotAnObject {
            channel: CHANNEL,
            found: json_type_name(&payload),
        });
    }
    serde_json::from_value(payload).map_err(|source| TransformError::Payload {
        channel: CHANNEL,
        source,
    })
}

/// Build the single performance document for a sample.
///
/// Missing `cpu` or `memory` values are left out of the body.
pub fn document(event: &CpuEvent, capture: &Capture, naming: &IndexNaming) -> Document {
    let mut body = Map::new();
    capture.stamp(&mut body);
    if let Some(cpu) = &event.cpu {
        body.insert("cpu".to_owned(), Value::Number(cpu.clone()));
    }
    if let Some(memory) = &event.memory {
        body.insert("memory".to_owned(), Value::Number(memory.clone()));
    }
    Document::new(
        naming.destination(DocumentKind::Performance, None, capture.date()),
        DocumentKind::Performance,
        body,
    )
}

/// Decode and transform in one step.
///
/// # Errors
///
/// Propagates [`decode`] errors.
pub fn transform(
    payload: Value,
    capture: &Capture,
    naming: &IndexNaming,
) -> Result<Vec<Document>, TransformError> {
    let event = decode(payload)?;
    Ok(vec![document(&event, capture, naming)])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn capture() -> Capture {
        Capture::at(
            Utc.with_ymd_and_hms(2026, 10, 19, 6, 30, 0).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
    }

    #[test]
    fn sample_becomes_one_document() {
        let docs = transform(
            json!({ "cpu": 12.5, "memory": 900_000 }),
            &capture(),
            &IndexNaming::new(),
        )
        .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].destination, "performance-2026-10-19");
        assert_eq!(docs[0].kind, DocumentKind::Performance);
        assert_eq!(
            Value::Object(docs[0].body.clone()),
            json!({
                "timestamp": "2026-10-19T06:30:00.000Z",
                "cpu": 12.5,
                "memory": 900_000
            })
        );
    }

    #[test]
    fn extra_fields_are_not_copied() {
        let docs = transform(
            json!({ "cpu": 1, "memory": 2, "bucket": 10_000 }),
            &capture(),
            &IndexNaming::new(),
        )
        .unwrap();
        assert_eq!(docs[0].field("bucket"), None);
    }

    #[test]
    fn missing_fields_are_left_out() {
        let docs = transform(json!({ "cpu": 3 }), &capture(), &IndexNaming::new()).unwrap();
        assert_eq!(docs[0].field("memory"), None);
        assert_eq!(docs[0].field("cpu"), Some(&json!(3)));
    }

    #[test]
    fn non_numeric_cpu_is_an_error() {
        let err = transform(json!({ "cpu": "lots" }), &capture(), &IndexNaming::new());
        assert!(matches!(err, Err(TransformError::Payload { .. })));
    }

    #[test]
    fn non_object_payload_is_an_error() {
        let err = transform(json!(12), &capture(), &IndexNaming::new());
        assert!(matches!(
            err,
            Err(TransformError::NotAnObject { found: "number", .. })
        ));
    }
}
