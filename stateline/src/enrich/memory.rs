use serde_json::Value;

use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::EngineResult;
use crate::types::State;

/// Approximate memory footprint via serialize-and-measure.
///
/// The byte length of the serialized state is a unit-free proxy good enough
/// for trend analysis; the magnitude analyzer baselines against the
/// timeline's own statistics rather than absolute sizes.
pub struct MemoryFootprint;

impl Enricher for MemoryFootprint {
    fn name(&self) -> &'static str {
        "memory_footprint"
    }

    fn enrich(&self, state: &State, _opts: &EnrichOptions) -> EngineResult<State> {
        let serialized = serde_json::to_string(state)?;
        let mut fields = State::new();
        fields.insert("state_size_bytes".to_string(), Value::from(serialized.len()));
        Ok(fields)
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

    #[test]
    fn empty_state_has_brace_size() {
        let fields = MemoryFootprint.enrich(&State::new(), &opts()).unwrap();
        assert_eq!(fields.get("state_size_bytes"), Some(&json!(2)));
    }

    #[test]
    fn size_grows_with_state() {
        let small: State = serde_json::from_value(json!({"a": 1})).unwrap();
        let large: State = serde_json::from_value(json!({"a": 1, "blob": "x".repeat(500)})).unwrap();

        let small_size = MemoryFootprint.enrich(&small, &opts()).unwrap()["state_size_bytes"]
            .as_u64()
            .unwrap();
        let large_size = MemoryFootprint.enrich(&large, &opts()).unwrap()["state_size_bytes"]
            .as_u64()
            .unwrap();
        assert!(large_size > small_size + 500);
    }
}
