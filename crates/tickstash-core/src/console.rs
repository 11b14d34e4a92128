//! Console transformer: one document per console line.
//!
//! All documents go to `log-<date>` and carry an `mtype` discriminator.
//! Lines are emitted in a fixed order:
//!
//! 1. `log` lines (`mtype: "log"`), each run through [`markup::extract`].
//!    A recognized wrapping tag contributes its attributes as fields
//!    (numeric values coerced to numbers) and its inner text as `message`.
//!    Anything else is indexed as the trimmed line.
//! 2. `results` lines (`mtype: "results"`), indexed verbatim.
//! 3. The `error` line (`mtype: "error"`), if present.

use serde_json::{Map, Value};
use tickstash_types::{ConsoleEvent, Document, DocumentKind, ShardName};
use tracing::debug;

use crate::capture::Capture;
use crate::error::{json_type_name, TransformError};
use crate::index::IndexNaming;
use crate::markup;
use crate::stats::SHARD_FIELD;

/// Channel label used in errors and logs.
const CHANNEL: &str = "console";

/// Body field holding the line category.
pub const MTYPE_FIELD: &str = "mtype";

/// Body field holding the line text.
pub const MESSAGE_FIELD: &str = "message";

/// Category of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Script output from `console.log`.
    Log,
    /// Echoed result of a console command.
    Results,
    /// Uncaught script error.
    Error,
}

impl LineType {
    /// The `mtype` value written to the document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Results => "results",
            Self::Error => "error",
        }
    }
}

/// Decode a console payload.
///
/// # Errors
///
/// Returns [`TransformError::NotAnObject`] if the payload is not an object
/// and [`TransformError::Payload`] if the line arrays are malformed.
pub fn decode(payload: Value) -> Result<ConsoleEvent, TransformError> {
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

/// Build the documents for one console event, in emission order.
pub fn documents(event: &ConsoleEvent, capture: &Capture, naming: &IndexNaming) -> Vec<Document> {
    let destination = naming.destination(DocumentKind::Log, None, capture.date());
    let shard = event.shard.as_ref();
    let mut docs = Vec::with_capacity(
        event
            .log
            .len()
            .saturating_add(event.results.len())
            .saturating_add(usize::from(event.error.is_some())),
    );

    for line in &event.log {
        let mut body = Map::new();
        let message = match markup::extract(line) {
            Some(element) => {
                for (name, value) in &element.attributes {
                    body.insert(name.clone(), markup::coerce_attribute(value));
                }
                element.text
            }
            None => line.trim().to_owned(),
        };
        docs.push(line_document(&destination, body, LineType::Log, message, shard, capture));
    }

    for line in &event.results {
        docs.push(line_document(
            &destination,
            Map::new(),
            LineType::Results,
            line.clone(),
            shard,
            capture,
        ));
    }

    if let Some(error) = &event.error {
        docs.push(line_document(
            &destination,
            Map::new(),
            LineType::Error,
            error.clone(),
            shard,
            capture,
        ));
    }

    docs
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
    Ok(documents(&event, capture, naming))
}

/// Finish one line's body. Reserved fields are written after any markup
/// attributes so an attribute cannot replace them.
fn line_document(
    destination: &str,
    mut body: Map<String, Value>,
    line_type: LineType,
    message: String,
    shard: Option<&ShardName>,
    capture: &Capture,
) -> Document {
    capture.stamp(&mut body);
    body.insert(MTYPE_FIELD.to_owned(), Value::from(line_type.as_str()));
    if let Some(shard) = shard {
        body.insert(SHARD_FIELD.to_owned(), Value::String(shard.to_string()));
    }
    debug!(
        mtype = line_type.as_str(),
        " - {}: {message}",
        shard.map_or("-", ShardName::as_str)
    );
    body.insert(MESSAGE_FIELD.to_owned(), Value::String(message));
    Document::new(destination.to_owned(), DocumentKind::Log, body)
}
