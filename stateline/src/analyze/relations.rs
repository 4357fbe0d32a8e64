use crate::analyze::{AnalysisContext, Analyzer};
use crate::errors::EngineResult;
use crate::types::{AnalysisResult, Finding, Timeline};

/// Relation-churn analyzer: looks for query-explosion patterns in the
/// loaded-record series.
///
/// Not default-enabled: it only says something when the capture hook emits
/// relation markers, which not every instrumentation setup does.
pub struct RelationChurnAnalyzer;

/// Consecutive loading entries under one event label that look like an
/// N+1 access pattern.
const CHURN_RUN_LENGTH: usize = 3;

impl Analyzer for RelationChurnAnalyzer {
    fn name(&self) -> &'static str {
        "relation_churn"
    }

    fn default_enabled(&self) -> bool {
        false
    }

    fn requires_enrichers(&self) -> Vec<&'static str> {
        vec!["relation_state"]
    }

    fn analyze(&self, timeline: &Timeline, _ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        let samples: Vec<(usize, &str, u64, u64)> = timeline
            .entries
            .iter()
            .filter_map(|entry| {
                let loaded = entry.enrichment_u64("loaded_record_count")?;
                let deferred = entry.enrichment_u64("deferred_relation_count").unwrap_or(0);
                Some((entry.sequence, entry.event.as_str(), loaded, deferred))
            })
            .collect();
        if samples.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let mut result = AnalysisResult::empty();
        let mut max_step_load = 0u64;
        let mut loading_run: Vec<(usize, u64)> = Vec::new();
        let mut run_event: Option<&str> = None;

        for window in samples.windows(2) {
            let (_, _, prev_loaded, _) = window[0];
            let (seq, event, loaded, _) = window[1];
            let delta = loaded.saturating_sub(prev_loaded);
            max_step_load = max_step_load.max(delta);

            let continues = delta > 0 && run_event.is_none_or(|e| e == event);
            if continues {
                if loading_run.is_empty() {
                    run_event = Some(event);
                }
                loading_run.push((seq, delta));
            } else {
                flush_run(&mut result, run_event.take(), &mut loading_run);
                if delta > 0 {
                    run_event = Some(event);
                    loading_run.push((seq, delta));
                }
            }
        }
        flush_run(&mut result, run_event.take(), &mut loading_run);

        let (last_seq, _, final_loaded, final_deferred) = *samples.last().expect("non-empty");
        if final_deferred > 0 {
            result.findings.push(
                Finding::info(format!(
                    "{final_deferred} relation(s) still deferred at the end of the run"
                ))
                .related([last_seq])
                .fact("deferred_relations", final_deferred),
            );
        }

        result = result
            .stat("final_loaded_records", final_loaded)
            .stat("max_single_step_load", max_step_load)
            .stat(
                "entries_with_deferred",
                samples.iter().filter(|(_, _, _, deferred)| *deferred > 0).count(),
            );
        Ok(result)
    }
}

fn flush_run(result: &mut AnalysisResult, event: Option<&str>, run: &mut Vec<(usize, u64)>) {
    if run.len() >= CHURN_RUN_LENGTH {
        let event = event.unwrap_or("?");
        let total: u64 = run.iter().map(|(_, delta)| delta).sum();
        result.findings.push(
            Finding::warning(format!(
                "{} consecutive '{event}' entries each loaded more records (+{total} total); \
                 possible N+1 query pattern",
                run.len()
            ))
            .related(run.iter().map(|(seq, _)| *seq).collect::<Vec<_>>())
            .fact("event", event)
            .fact("records_loaded", total),
        );
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::AnalysisContext;
    use crate::types::{Severity, State, TimelineEntry};
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn make_entry(sequence: usize, event: &str, loaded: u64, deferred: u64) -> TimelineEntry {
        let mut enrichments = State::new();
        enrichments.insert("loaded_record_count".to_string(), json!(loaded));
        enrichments.insert("deferred_relation_count".to_string(), json!(deferred));
        TimelineEntry {
            sequence,
            event: event.to_string(),
            timestamp: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            key_state: State::new(),
            changes: None,
            duration_since_previous_ms: None,
            enrichments,
        }
    }

    fn analyze(entries: Vec<TimelineEntry>) -> AnalysisResult {
        let timeline = Timeline {
            test: "t".to_string(),
            duration_ms: 0,
            entries,
        };
        let prior = BTreeMap::new();
        RelationChurnAnalyzer
            .analyze(&timeline, &AnalysisContext::new(&prior))
            .unwrap()
    }

    #[test]
    fn empty_timeline_is_tolerated() {
        let result = analyze(Vec::new());
        assert!(result.findings.is_empty());
        assert!(result.stats.is_empty());
    }

    #[test]
    fn sustained_same_event_loading_is_flagged() {
        let result = analyze(vec![
            make_entry(1, "mount", 1, 0),
            make_entry(2, "render_row", 3, 0),
            make_entry(3, "render_row", 6, 0),
            make_entry(4, "render_row", 10, 0),
        ]);

        let churn = result
            .findings
            .iter()
            .find(|f| f.message.contains("N+1"))
            .expect("churn finding");
        assert_eq!(churn.severity, Severity::Warning);
        assert_eq!(churn.related_entries, vec![2, 3, 4]);
        assert_eq!(churn.metadata["records_loaded"], json!(9));
        assert_eq!(result.stats["max_single_step_load"], json!(4));
    }

    #[test]
    fn mixed_events_do_not_trigger_churn() {
        let result = analyze(vec![
            make_entry(1, "a", 1, 0),
            make_entry(2, "b", 3, 0),
            make_entry(3, "c", 6, 0),
            make_entry(4, "d", 10, 0),
        ]);
        assert!(!result.findings.iter().any(|f| f.message.contains("N+1")));
    }

    #[test]
    fn trailing_deferred_relations_reported() {
        let result = analyze(vec![
            make_entry(1, "mount", 0, 2),
            make_entry(2, "idle", 0, 2),
        ]);

        let deferred = result
            .findings
            .iter()
            .find(|f| f.message.contains("still deferred"))
            .expect("deferred finding");
        assert_eq!(deferred.severity, Severity::Info);
        assert_eq!(result.stats["entries_with_deferred"], json!(2));
    }
}
