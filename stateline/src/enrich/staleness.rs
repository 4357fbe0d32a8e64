use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::EngineResult;
use crate::types::State;

/// Field names that look like timestamps.
static TIMESTAMP_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(_at|_on|_time|_date|timestamp)$").unwrap());

/// Creation-time fields are counted but never flagged stale: an old creation
/// time is normal, an old `updated_at` usually is not.
const CREATION_FIELDS: &[&str] = &["created_at", "created_on", "inserted_at"];

/// Flags timestamp-like fields older than the configured threshold.
///
/// A field qualifies when its name matches the timestamp pattern and its
/// value parses as an RFC 3339 string. Ages are measured against the
/// snapshot's own capture time.
pub struct TimestampStaleness;

impl Enricher for TimestampStaleness {
    fn name(&self) -> &'static str {
        "timestamp_staleness"
    }

    fn enrich(&self, state: &State, opts: &EnrichOptions) -> EngineResult<State> {
        let mut total = 0u64;
        let mut stale = Vec::new();
        walk(state, "", opts, &mut total, &mut stale);

        let mut fields = State::new();
        fields.insert("timestamp_field_count".to_string(), Value::from(total));
        fields.insert("stale_timestamp_count".to_string(), Value::from(stale.len()));
        fields.insert(
            "stale_timestamp_fields".to_string(),
            Value::Array(stale.into_iter().map(Value::String).collect()),
        );
        Ok(fields)
    }
}

fn walk(map: &State, prefix: &str, opts: &EnrichOptions, total: &mut u64, stale: &mut Vec<String>) {
    for (field, value) in map {
        let path = if prefix.is_empty() {
            field.clone()
        } else {
            format!("{prefix}.{field}")
        };
        match value {
            Value::Object(nested) => walk(nested, &path, opts, total, stale),
            Value::String(text) if TIMESTAMP_FIELD.is_match(field) => {
                let Ok(parsed) = DateTime::parse_from_rfc3339(text) else {
                    continue;
                };
                *total += 1;
                if CREATION_FIELDS.contains(&field.as_str()) {
                    continue;
                }
                if opts.reference_time - parsed.to_utc() > opts.staleness_threshold {
                    stale.push(path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn opts_at(reference: &str) -> EnrichOptions {
        let reference_time = DateTime::parse_from_rfc3339(reference).unwrap().with_timezone(&Utc);
        EnrichOptions::new(reference_time, Duration::seconds(300))
    }

    fn enrich(value: serde_json::Value, reference: &str) -> State {
        let state: State = serde_json::from_value(value).unwrap();
        TimestampStaleness.enrich(&state, &opts_at(reference)).unwrap()
    }

    #[test]
    fn old_updated_at_is_stale() {
        let fields = enrich(
            json!({"updated_at": "2026-01-01T00:00:00Z"}),
            "2026-01-01T01:00:00Z",
        );
        assert_eq!(fields["timestamp_field_count"], json!(1));
        assert_eq!(fields["stale_timestamp_count"], json!(1));
        assert_eq!(fields["stale_timestamp_fields"], json!(["updated_at"]));
    }

    #[test]
    fn recent_timestamp_is_not_stale() {
        let fields = enrich(
            json!({"updated_at": "2026-01-01T00:59:00Z"}),
            "2026-01-01T01:00:00Z",
        );
        assert_eq!(fields["stale_timestamp_count"], json!(0));
    }

    #[test]
    fn created_at_counted_but_never_stale() {
        let fields = enrich(
            json!({"created_at": "2020-01-01T00:00:00Z", "synced_at": "2020-01-01T00:00:00Z"}),
            "2026-01-01T00:00:00Z",
        );
        assert_eq!(fields["timestamp_field_count"], json!(2));
        assert_eq!(fields["stale_timestamp_fields"], json!(["synced_at"]));
    }

    #[test]
    fn nested_paths_and_non_timestamp_values_skipped() {
        let fields = enrich(
            json!({
                "user": {"last_seen_at": "2026-01-01T00:00:00Z"},
                "updated_at": "not a time",
                "count": 5,
            }),
            "2026-01-01T02:00:00Z",
        );
        assert_eq!(fields["timestamp_field_count"], json!(1));
        assert_eq!(fields["stale_timestamp_fields"], json!(["user.last_seen_at"]));
    }
}
