use serde_json::Value;

use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::EngineResult;
use crate::types::State;

/// Keys under which a form wrapper may expose its validation object.
const WRAPPER_KEYS: &[&str] = &["validation", "changeset", "model"];

/// Status of a validation object anywhere in the top level of the state.
///
/// A validation object is an object with a boolean `"valid"` and an
/// `"errors"` member (object keyed by field name, or a flat list). It may
/// appear directly or nested one level inside a form wrapper. The first
/// match in key order wins; the result is empty when nothing is recognized.
pub struct ValidationStatus;

impl Enricher for ValidationStatus {
    fn name(&self) -> &'static str {
        "validation_status"
    }

    fn enrich(&self, state: &State, _opts: &EnrichOptions) -> EngineResult<State> {
        let Some(validation) = find_validation(state) else {
            return Ok(State::new());
        };

        let mut fields = State::new();
        if let Some(valid) = validation.get("valid").and_then(Value::as_bool) {
            fields.insert("validation_valid".to_string(), Value::Bool(valid));
        }

        let (error_count, error_fields) = summarize_errors(validation.get("errors"));
        fields.insert("validation_error_count".to_string(), Value::from(error_count));
        fields.insert(
            "validation_error_fields".to_string(),
            Value::Array(error_fields.into_iter().map(Value::String).collect()),
        );

        let changed: Vec<Value> = validation
            .get("changes")
            .and_then(Value::as_object)
            .map(|changes| changes.keys().cloned().map(Value::String).collect())
            .unwrap_or_default();
        fields.insert("validation_changed_fields".to_string(), Value::Array(changed));
        Ok(fields)
    }
}

fn find_validation(state: &State) -> Option<&State> {
    for value in state.values() {
        if let Some(validation) = as_validation_object(value) {
            return Some(validation);
        }
        // One level inside a form wrapper.
        if let Value::Object(wrapper) = value {
            for key in WRAPPER_KEYS {
                if let Some(validation) = wrapper.get(*key).and_then(as_validation_object) {
                    return Some(validation);
                }
            }
        }
    }
    None
}

fn as_validation_object(value: &Value) -> Option<&State> {
    let map = value.as_object()?;
    let valid_is_bool = matches!(map.get("valid"), Some(Value::Bool(_)));
    (valid_is_bool && map.contains_key("errors")).then_some(map)
}

fn summarize_errors(errors: Option<&Value>) -> (u64, Vec<String>) {
    match errors {
        Some(Value::Object(by_field)) => {
            let count = by_field
                .values()
                .map(|messages| match messages {
                    Value::Array(items) => items.len() as u64,
                    _ => 1,
                })
                .sum();
            (count, by_field.keys().cloned().collect())
        }
        Some(Value::Array(items)) => (items.len() as u64, Vec::new()),
        _ => (0, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn enrich(value: serde_json::Value) -> State {
        let state: State = serde_json::from_value(value).unwrap();
        ValidationStatus
            .enrich(&state, &EnrichOptions::new(Utc::now(), Duration::seconds(300)))
            .unwrap()
    }

    #[test]
    fn no_validation_object_yields_empty_fields() {
        assert!(enrich(json!({"count": 1})).is_empty());
        assert!(enrich(json!({})).is_empty());
    }

    #[test]
    fn direct_validation_object() {
        let fields = enrich(json!({
            "checkout": {
                "valid": false,
                "errors": {"email": ["is invalid", "is required"], "name": ["is required"]},
                "changes": {"email": "x@", "accepted": true},
            }
        }));

        assert_eq!(fields["validation_valid"], json!(false));
        assert_eq!(fields["validation_error_count"], json!(3));
        assert_eq!(fields["validation_error_fields"], json!(["email", "name"]));
        assert_eq!(fields["validation_changed_fields"], json!(["accepted", "email"]));
    }

    #[test]
    fn validation_nested_in_form_wrapper() {
        let fields = enrich(json!({
            "form": {
                "dirty": true,
                "model": {"valid": true, "errors": {}},
            }
        }));

        assert_eq!(fields["validation_valid"], json!(true));
        assert_eq!(fields["validation_error_count"], json!(0));
    }

    #[test]
    fn list_errors_counted_without_fields() {
        let fields = enrich(json!({
            "signup": {"valid": false, "errors": ["too short", "taken"]}
        }));

        assert_eq!(fields["validation_error_count"], json!(2));
        assert_eq!(fields["validation_error_fields"], json!([]));
    }
}
