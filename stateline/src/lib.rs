//! stateline core library.
//!
//! Turns a raw sequence of per-event state captures into a structured,
//! diffed, enriched timeline, then runs a dependency-ordered set of pattern
//! detectors over it to surface behavioral defects: memory bloat, wasted
//! work, query explosions, event loops.

pub mod analyze;
pub mod config;
pub mod diff;
pub mod enrich;
pub mod errors;
pub mod export;
pub mod key_state;
pub mod registry;
pub mod timeline;
pub mod types;

pub use analyze::{AnalysisContext, Analyzer, run_analyzers, sort_by_dependencies};
pub use config::EngineConfig;
pub use diff::{StateDiff, compute_diff, extract_changes};
pub use enrich::{EnrichOptions, Enricher};
pub use errors::{EngineError, EngineResult};
pub use key_state::{default_highlight_fields, extract_key_state};
pub use registry::{AnalyzerRegistration, AnalyzerSelection, EnricherRegistration, PluginRegistry};
pub use timeline::TimelineBuilder;
pub use types::{
    AnalysisReport, AnalysisResult, AnalyzerRun, ChangeMap, ChangeValue, Finding, Severity,
    Snapshot, State, Timeline, TimelineEntry,
};

// Re-export inventory so external plugins can register without adding the
// dependency themselves.
pub use inventory;
