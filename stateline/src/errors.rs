use thiserror::Error;

/// Top-level error type returned by the timeline and analysis engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An enricher failed while computing fields for one entry.
    ///
    /// There is no per-enricher isolation: the whole timeline build aborts.
    #[error("enricher '{name}' failed at sequence {sequence}: {message}")]
    Enricher {
        name: String,
        sequence: usize,
        message: String,
    },

    /// An analyzer failed while running over a timeline. Aborts the run.
    #[error("analyzer '{name}' failed: {message}")]
    Analyzer { name: String, message: String },

    /// An analyzer was requested by name but is not in the registry.
    #[error("unknown analyzer '{name}'")]
    UnknownAnalyzer { name: String },

    /// State or timeline data could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Convenience helper for constructing an analyzer failure.
    pub fn analyzer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analyzer {
            name: name.into(),
            message: message.into(),
        }
    }
}
