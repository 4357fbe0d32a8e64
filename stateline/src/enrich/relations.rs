use serde_json::Value;

use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::EngineResult;
use crate::types::{State, is_deferred_relation, is_opaque_record};

/// Census of relation slots: deferred (never fetched) markers versus loaded
/// opaque records, counted recursively through objects and lists.
pub struct RelationCensus;

impl Enricher for RelationCensus {
    fn name(&self) -> &'static str {
        "relation_state"
    }

    fn enrich(&self, state: &State, _opts: &EnrichOptions) -> EngineResult<State> {
        let mut deferred = Vec::new();
        let mut loaded = 0u64;
        walk(state, "", &mut deferred, &mut loaded);

        let mut fields = State::new();
        fields.insert("deferred_relation_count".to_string(), Value::from(deferred.len()));
        fields.insert(
            "deferred_relation_paths".to_string(),
            Value::Array(deferred.into_iter().map(Value::String).collect()),
        );
        fields.insert("loaded_record_count".to_string(), Value::from(loaded));
        Ok(fields)
    }
}

fn walk(map: &State, prefix: &str, deferred: &mut Vec<String>, loaded: &mut u64) {
    for (field, value) in map {
        let path = if prefix.is_empty() {
            field.clone()
        } else {
            format!("{prefix}.{field}")
        };
        walk_value(value, &path, deferred, loaded);
    }
}

fn walk_value(value: &Value, path: &str, deferred: &mut Vec<String>, loaded: &mut u64) {
    if is_deferred_relation(value) {
        deferred.push(path.to_string());
        return;
    }
    match value {
        Value::Object(map) => {
            if is_opaque_record(value) {
                *loaded += 1;
            }
            walk(map, path, deferred, loaded);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk_value(item, &format!("{path}[{index}]"), deferred, loaded);
            }
        }
        _ => {}
    }
}
