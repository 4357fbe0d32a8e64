use serde::{Deserialize, Serialize};

use crate::key_state::default_highlight_fields;

/// Engine configuration, threaded explicitly into each call.
///
/// Loadable from a TOML file:
///
/// ```toml
/// highlight_fields = ["current_user", "cart"]
/// staleness_threshold_secs = 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Top-level fields always copied verbatim into an entry's key state.
    #[serde(default = "default_highlight_fields")]
    pub highlight_fields: Vec<String>,
    /// Age beyond which a timestamp-like field counts as stale.
    #[serde(default = "default_staleness_threshold_secs")]
    pub staleness_threshold_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            highlight_fields: default_highlight_fields(),
            staleness_threshold_secs: default_staleness_threshold_secs(),
        }
    }
}

fn default_staleness_threshold_secs() -> u64 {
    300
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing keys fall back to the
    /// built-in defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn staleness_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.staleness_threshold_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied_for_missing_keys() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.staleness_threshold_secs, 300);
        assert_eq!(config.highlight_fields, default_highlight_fields());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config =
            EngineConfig::from_toml_str("highlight_fields = [\"cart\"]\nstaleness_threshold_secs = 60\n")
                .unwrap();
        assert_eq!(config.highlight_fields, vec!["cart".to_string()]);
        assert_eq!(config.staleness_threshold_secs, 60);
    }
}
