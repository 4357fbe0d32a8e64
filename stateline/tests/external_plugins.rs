//! Externally supplied plugins registered through `inventory`.

use chrono::Utc;
use serde_json::json;
use stateline::{
    AnalysisContext, AnalysisResult, Analyzer, AnalyzerRegistration, AnalyzerSelection,
    EngineConfig, EngineResult, EnrichOptions, Enricher, EnricherRegistration, PluginRegistry,
    Snapshot, State, Timeline, TimelineBuilder, run_analyzers,
};
use std::sync::Arc;

struct FieldCountEnricher;

impl Enricher for FieldCountEnricher {
    fn name(&self) -> &'static str {
        "field_count"
    }

    fn enrich(&self, state: &State, _opts: &EnrichOptions) -> EngineResult<State> {
        let mut fields = State::new();
        fields.insert("top_level_field_count".to_string(), json!(state.len()));
        Ok(fields)
    }
}

struct EntryCountAnalyzer;

impl Analyzer for EntryCountAnalyzer {
    fn name(&self) -> &'static str {
        "entry_count"
    }

    fn default_enabled(&self) -> bool {
        false
    }

    fn analyze(&self, timeline: &Timeline, _ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        Ok(AnalysisResult::empty().stat("entries", timeline.len()))
    }
}

fn make_enricher() -> Arc<dyn Enricher> {
    Arc::new(FieldCountEnricher)
}

fn make_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(EntryCountAnalyzer)
}

stateline::inventory::submit! {
    EnricherRegistration { construct: make_enricher }
}

stateline::inventory::submit! {
    AnalyzerRegistration { construct: make_analyzer }
}

#[test]
fn submitted_plugins_are_collected() {
    let registry = PluginRegistry::with_external();

    assert!(registry.enrichers().iter().any(|e| e.name() == "field_count"));
    assert!(registry.analyzer("entry_count").is_some());
    // Externally supplied analyzers still honor default_enabled.
    assert!(
        !registry
            .default_analyzers()
            .iter()
            .any(|a| a.name() == "entry_count")
    );
}

#[test]
fn external_plugins_participate_in_the_pipeline() {
    let registry = PluginRegistry::with_external();
    let builder = TimelineBuilder::new(EngineConfig::default(), registry.enrichers().to_vec());

    let state: State = serde_json::from_value(json!({"a": 1, "b": 2})).unwrap();
    let snapshots = vec![Snapshot::new("mount", state, Utc::now(), "widget")];
    let timeline = builder.build(&snapshots, "t").unwrap();
    assert_eq!(
        timeline.entries[0].enrichment("top_level_field_count"),
        Some(&json!(2))
    );

    let analyzers = registry
        .select(&AnalyzerSelection::parse("entry_count"))
        .unwrap();
    let report = run_analyzers(&timeline, &analyzers).unwrap();
    assert_eq!(report.result_of("entry_count").unwrap().stats["entries"], json!(1));
}
