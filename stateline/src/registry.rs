//! Registry of built-in and externally supplied plugins.

use std::sync::Arc;

use crate::analyze::{
    Analyzer, CollectionGrowthAnalyzer, EventFrequencyAnalyzer, HealthSummaryAnalyzer,
    MemoryGrowthAnalyzer, RelationChurnAnalyzer,
};
use crate::enrich::{
    CollectionCensus, Enricher, MemoryFootprint, RelationCensus, TimestampStaleness,
    ValidationStatus,
};
use crate::errors::{EngineError, EngineResult};

/// External enricher registration. Downstream crates submit one per plugin:
///
/// ```ignore
/// stateline::inventory::submit! {
///     stateline::EnricherRegistration { construct: || Arc::new(MyEnricher) }
/// }
/// ```
pub struct EnricherRegistration {
    pub construct: fn() -> Arc<dyn Enricher>,
}

inventory::collect!(EnricherRegistration);

/// External analyzer registration, collected at process start.
pub struct AnalyzerRegistration {
    pub construct: fn() -> Arc<dyn Analyzer>,
}

inventory::collect!(AnalyzerRegistration);

/// Which analyzers to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerSelection {
    /// The registry's default-enabled subset.
    Default,
    /// Every registered analyzer.
    All,
    /// Explicitly no analysis.
    None,
    /// A specific set of analyzer names.
    Named(Vec<String>),
}

impl AnalyzerSelection {
    /// Parse a selection string: the reserved words `all` and `none`, or a
    /// comma-separated list of analyzer names.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "all" => Self::All,
            "none" => Self::None,
            names => Self::Named(
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

/// Holds the fixed set of built-in plugins plus externally supplied ones.
///
/// Constructed once per run and treated as immutable afterward; there is no
/// concurrent mutation to guard against.
pub struct PluginRegistry {
    enrichers: Vec<Arc<dyn Enricher>>,
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl PluginRegistry {
    /// Registry containing only the built-in plugins.
    pub fn builtin() -> Self {
        Self {
            enrichers: vec![
                Arc::new(MemoryFootprint),
                Arc::new(CollectionCensus),
                Arc::new(TimestampStaleness),
                Arc::new(RelationCensus),
                Arc::new(ValidationStatus),
            ],
            analyzers: vec![
                Arc::new(MemoryGrowthAnalyzer),
                Arc::new(CollectionGrowthAnalyzer),
                Arc::new(EventFrequencyAnalyzer),
                Arc::new(RelationChurnAnalyzer),
                Arc::new(HealthSummaryAnalyzer),
            ],
        }
    }

    /// Built-ins plus every plugin registered through `inventory`.
    pub fn with_external() -> Self {
        let mut registry = Self::builtin();
        for registration in inventory::iter::<EnricherRegistration> {
            registry.register_enricher((registration.construct)());
        }
        for registration in inventory::iter::<AnalyzerRegistration> {
            registry.register_analyzer((registration.construct)());
        }
        registry
    }

    pub fn register_enricher(&mut self, enricher: Arc<dyn Enricher>) {
        self.enrichers.push(enricher);
    }

    pub fn register_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn enrichers(&self) -> &[Arc<dyn Enricher>] {
        &self.enrichers
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    /// Look up an analyzer by its stable name.
    pub fn analyzer(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers
            .iter()
            .find(|analyzer| analyzer.name() == name)
            .cloned()
    }

    /// The default-enabled subset, in registration order.
    pub fn default_analyzers(&self) -> Vec<Arc<dyn Analyzer>> {
        self.analyzers
            .iter()
            .filter(|analyzer| analyzer.default_enabled())
            .cloned()
            .collect()
    }

    /// Resolve a selection to concrete analyzers.
    pub fn select(&self, selection: &AnalyzerSelection) -> EngineResult<Vec<Arc<dyn Analyzer>>> {
        match selection {
            AnalyzerSelection::Default => Ok(self.default_analyzers()),
            AnalyzerSelection::All => Ok(self.analyzers.clone()),
            AnalyzerSelection::None => Ok(Vec::new()),
            AnalyzerSelection::Named(names) => names
                .iter()
                .map(|name| {
                    self.analyzer(name).ok_or_else(|| EngineError::UnknownAnalyzer {
                        name: name.clone(),
                    })
                })
                .collect(),
        }
    }
}
