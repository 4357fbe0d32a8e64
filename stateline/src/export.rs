//! Serialization of a timeline into its JSON document form.

use serde_json::Value;
use std::io::Write;

use crate::errors::EngineResult;
use crate::types::{DEFERRED_MARKER, META_PREFIX, RECORD_MARKER, Timeline};

/// Key the record marker is rewritten to in the exported document.
const RECORD_TYPE_KEY: &str = "record_type";

/// Render a timeline as its JSON document: `{test, duration_ms, timeline}`.
///
/// Change values serialize as two-element arrays. Source-ecosystem metadata
/// keys (`__`-prefixed) are stripped recursively, and marker keys are
/// rewritten to plain fields so consumers see ordinary maps.
pub fn timeline_document(timeline: &Timeline) -> EngineResult<Value> {
    let mut document = serde_json::to_value(timeline)?;
    sanitize(&mut document);
    Ok(document)
}

/// Serialize the timeline document, pretty-printed, to a writer.
pub fn write_timeline<W: Write>(timeline: &Timeline, writer: W) -> EngineResult<()> {
    let document = timeline_document(timeline)?;
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with(META_PREFIX));
            if let Some(record_type) = map.remove(RECORD_MARKER) {
                map.insert(RECORD_TYPE_KEY.to_string(), record_type);
            }
            if let Some(relation) = map.remove(DEFERRED_MARKER) {
                map.insert("deferred".to_string(), relation);
            }
            for nested in map.values_mut() {
                sanitize(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize(item);
            }
        }
        _ => {}
    }
}
