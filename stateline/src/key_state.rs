//! Reduction of a full snapshot to a small, display-worthy subset.

use serde_json::Value;

use crate::types::State;

/// Fields always copied verbatim into key state, regardless of size or type.
pub const DEFAULT_HIGHLIGHT_FIELDS: &[&str] = &["current_user", "current_action", "errors", "form"];

/// Longest string still considered a "small" primitive.
const MAX_INLINE_STRING_LEN: usize = 100;

/// The built-in highlight set as owned strings, for configuration defaults.
pub fn default_highlight_fields() -> Vec<String> {
    DEFAULT_HIGHLIGHT_FIELDS.iter().map(|f| f.to_string()).collect()
}

/// Reduce a state to its scannable subset.
///
/// Per top-level field: highlighted fields are copied verbatim; lists are
/// always replaced by a `<field>_count`; small primitives (integers,
/// booleans, strings up to 100 chars) pass through only when the caller did
/// not customize the highlight set. Everything else is omitted; the full
/// state remains reachable through `changes` and enrichment fields.
pub fn extract_key_state(state: &State, highlight_fields: &[String]) -> State {
    let default_rules = highlight_fields
        .iter()
        .map(String::as_str)
        .eq(DEFAULT_HIGHLIGHT_FIELDS.iter().copied());

    let mut key_state = State::new();
    for (field, value) in state {
        if highlight_fields.iter().any(|h| h == field) {
            key_state.insert(field.clone(), value.clone());
        } else if let Value::Array(items) = value {
            key_state.insert(format!("{field}_count"), Value::from(items.len()));
        } else if default_rules && is_small_primitive(value) {
            key_state.insert(field.clone(), value.clone());
        }
    }
    key_state
}

fn is_small_primitive(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(number) => number.is_i64() || number.is_u64(),
        Value::String(text) => text.len() <= MAX_INLINE_STRING_LEN,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_state(value: serde_json::Value) -> State {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn default_rules_keep_small_drop_large() {
        let state = make_state(json!({
            "name": "short",
            "big": "x".repeat(101),
            "tags": [1, 2, 3],
        }));
        let key_state = extract_key_state(&state, &default_highlight_fields());

        assert_eq!(key_state.get("name"), Some(&json!("short")));
        assert_eq!(key_state.get("tags_count"), Some(&json!(3)));
        assert!(!key_state.contains_key("big"));
        assert!(!key_state.contains_key("tags"));
    }

    #[test]
    fn highlighted_field_copied_verbatim() {
        let state = make_state(json!({
            "form": {"model": {"name": ""}},
            "noise": {"deep": true},
        }));
        let key_state = extract_key_state(&state, &default_highlight_fields());

        assert_eq!(key_state.get("form"), Some(&json!({"model": {"name": ""}})));
        assert!(!key_state.contains_key("noise"));
    }

    #[test]
    fn custom_highlights_disable_primitive_passthrough() {
        let state = make_state(json!({
            "cart": {"items": 2},
            "count": 7,
            "rows": [1, 2],
        }));
        let highlights = vec!["cart".to_string()];
        let key_state = extract_key_state(&state, &highlights);

        assert_eq!(key_state.get("cart"), Some(&json!({"items": 2})));
        // List-to-count still applies with a caller-supplied highlight set.
        assert_eq!(key_state.get("rows_count"), Some(&json!(2)));
        // Primitive passthrough does not.
        assert!(!key_state.contains_key("count"));
    }

    #[test]
    fn nested_records_and_floats_dropped_by_default() {
        let state = make_state(json!({
            "score": 1.5,
            "user": {"_record": "User", "id": 1},
            "flag": true,
        }));
        let key_state = extract_key_state(&state, &default_highlight_fields());

        assert_eq!(key_state.get("flag"), Some(&json!(true)));
        assert!(!key_state.contains_key("score"));
        assert!(!key_state.contains_key("user"));
    }

    #[test]
    fn boundary_string_length() {
        let state = make_state(json!({
            "at_limit": "x".repeat(100),
            "over_limit": "x".repeat(101),
        }));
        let key_state = extract_key_state(&state, &default_highlight_fields());

        assert!(key_state.contains_key("at_limit"));
        assert!(!key_state.contains_key("over_limit"));
    }
}
