use serde_json::Value;
use std::collections::BTreeMap;

use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::EngineResult;
use crate::types::State;

/// Collection-size census: per-path list lengths across nested state.
///
/// Emits `collection_sizes` (dot path → length for every list at any
/// depth), `collection_max_size`, and `collection_total_items`. The growth
/// analyzer tracks these per-path series across the whole timeline.
pub struct CollectionCensus;

impl Enricher for CollectionCensus {
    fn name(&self) -> &'static str {
        "collection_census"
    }

    fn enrich(&self, state: &State, _opts: &EnrichOptions) -> EngineResult<State> {
        let mut sizes = BTreeMap::new();
        walk(state, "", &mut sizes);

        let max = sizes.values().copied().max().unwrap_or(0);
        let total: u64 = sizes.values().sum();

        let mut fields = State::new();
        fields.insert(
            "collection_sizes".to_string(),
            Value::Object(
                sizes
                    .into_iter()
                    .map(|(path, len)| (path, Value::from(len)))
                    .collect(),
            ),
        );
        fields.insert("collection_max_size".to_string(), Value::from(max));
        fields.insert("collection_total_items".to_string(), Value::from(total));
        Ok(fields)
    }
}

fn walk(map: &State, prefix: &str, sizes: &mut BTreeMap<String, u64>) {
    for (field, value) in map {
        let path = if prefix.is_empty() {
            field.clone()
        } else {
            format!("{prefix}.{field}")
        };
        match value {
            Value::Array(items) => {
                sizes.insert(path, items.len() as u64);
            }
            Value::Object(nested) => walk(nested, &path, sizes),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn opts() -> EnrichOptions {
        EnrichOptions::new(Utc::now(), Duration::seconds(300))
    }

    fn census(value: serde_json::Value) -> State {
        let state: State = serde_json::from_value(value).unwrap();
        CollectionCensus.enrich(&state, &opts()).unwrap()
    }

    #[test]
    fn empty_state_reports_zeroes() {
        let fields = census(json!({}));
        assert_eq!(fields["collection_sizes"], json!({}));
        assert_eq!(fields["collection_max_size"], json!(0));
        assert_eq!(fields["collection_total_items"], json!(0));
    }

    #[test]
    fn nested_lists_counted_by_path() {
        let fields = census(json!({
            "items": [1, 2, 3],
            "cart": {"lines": ["a", "b"], "meta": {"tags": []}},
            "name": "x",
        }));

        assert_eq!(
            fields["collection_sizes"],
            json!({"cart.lines": 2, "cart.meta.tags": 0, "items": 3})
        );
        assert_eq!(fields["collection_max_size"], json!(3));
        assert_eq!(fields["collection_total_items"], json!(5));
    }
}
