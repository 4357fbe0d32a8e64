//! Analyzer plugins: findings and stats over a complete timeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::EngineResult;
use crate::types::{AnalysisReport, AnalysisResult, AnalyzerRun, Timeline};

mod collections;
mod frequency;
mod health;
mod memory;
mod relations;
mod scheduler;
pub mod stats;

pub use collections::CollectionGrowthAnalyzer;
pub use frequency::EventFrequencyAnalyzer;
pub use health::HealthSummaryAnalyzer;
pub use memory::MemoryGrowthAnalyzer;
pub use relations::RelationChurnAnalyzer;
pub use scheduler::sort_by_dependencies;

/// Results of analyzers that already ran this round, keyed by name.
///
/// This is how `depends_on` consumers receive their upstream input.
pub struct AnalysisContext<'a> {
    prior: &'a BTreeMap<String, AnalysisResult>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(prior: &'a BTreeMap<String, AnalysisResult>) -> Self {
        Self { prior }
    }

    /// Result of an analyzer that ran earlier in the schedule, if selected.
    pub fn result_of(&self, analyzer: &str) -> Option<&AnalysisResult> {
        self.prior.get(analyzer)
    }
}

/// A plugin inspecting a complete timeline.
///
/// Implementations must tolerate an empty timeline without error, returning
/// empty findings and stats.
pub trait Analyzer: Send + Sync {
    /// Stable identifier used for selection and dependency declarations.
    fn name(&self) -> &'static str;

    /// Whether this analyzer belongs to the registry's default-enabled subset.
    fn default_enabled(&self) -> bool {
        true
    }

    /// Names of enrichers whose output fields this analyzer reads.
    fn requires_enrichers(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Names of analyzers that must execute before this one.
    fn depends_on(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn analyze(&self, timeline: &Timeline, ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult>;
}

/// Run a set of analyzers over a timeline in dependency order.
///
/// Analyzers execute strictly in the scheduler's topological order; each
/// sees the results of everything scheduled before it. An analyzer error
/// aborts the whole run.
pub fn run_analyzers(
    timeline: &Timeline,
    analyzers: &[Arc<dyn Analyzer>],
) -> EngineResult<AnalysisReport> {
    let ordered = sort_by_dependencies(analyzers);
    let mut prior: BTreeMap<String, AnalysisResult> = BTreeMap::new();
    let mut results = Vec::with_capacity(ordered.len());

    for analyzer in ordered {
        log::debug!("running analyzer '{}'", analyzer.name());
        let ctx = AnalysisContext::new(&prior);
        let result = analyzer.analyze(timeline, &ctx)?;
        prior.insert(analyzer.name().to_string(), result.clone());
        results.push(AnalyzerRun {
            analyzer: analyzer.name().to_string(),
            result,
        });
    }

    Ok(AnalysisReport { results })
}
