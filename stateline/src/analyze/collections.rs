use serde_json::Value;
use std::collections::BTreeMap;

use crate::analyze::{AnalysisContext, Analyzer};
use crate::errors::EngineResult;
use crate::types::{AnalysisResult, Finding, Timeline};

/// Growth-tracking analyzer over per-path collection sizes.
///
/// For every distinct collection path seen anywhere in the timeline, the
/// size series is extracted from the census enrichment and checked for
/// overall and single-step growth. Growth from an empty collection has no
/// meaningful multiplier and is reported as unbounded.
pub struct CollectionGrowthAnalyzer;

/// Overall growth multiplier that triggers a warning.
const WARNING_OVERALL_FACTOR: f64 = 3.0;
/// Single-step multiplier that triggers a critical finding.
const CRITICAL_STEP_FACTOR: f64 = 10.0;
/// Absolute size above which sustained growth suggests pagination.
const PAGINATION_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Multiplier {
    Bounded(f64),
    /// Growth from zero: no finite multiplier exists.
    Unbounded,
}

impl Multiplier {
    fn exceeds(self, factor: f64) -> bool {
        match self {
            Multiplier::Bounded(value) => value >= factor,
            Multiplier::Unbounded => true,
        }
    }

    fn as_value(self) -> Value {
        match self {
            Multiplier::Bounded(value) => Value::from(value),
            Multiplier::Unbounded => Value::String("unbounded".to_string()),
        }
    }
}

impl std::fmt::Display for Multiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Multiplier::Bounded(value) => write!(f, "{value:.1}x"),
            Multiplier::Unbounded => write!(f, "unbounded (from zero)"),
        }
    }
}

impl Analyzer for CollectionGrowthAnalyzer {
    fn name(&self) -> &'static str {
        "collection_growth"
    }

    fn requires_enrichers(&self) -> Vec<&'static str> {
        vec!["collection_census"]
    }

    fn analyze(&self, timeline: &Timeline, _ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        // Per-path size series: (sequence, size) at every entry where present.
        let mut series: BTreeMap<String, Vec<(usize, u64)>> = BTreeMap::new();
        for entry in &timeline.entries {
            let Some(sizes) = entry.enrichment("collection_sizes").and_then(Value::as_object) else {
                continue;
            };
            for (path, size) in sizes {
                if let Some(size) = size.as_u64() {
                    series.entry(path.clone()).or_default().push((entry.sequence, size));
                }
            }
        }
        if series.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let mut result = AnalysisResult::empty();
        let mut growing_paths = 0u64;
        for (path, samples) in &series {
            let Some(finding) = growth_finding(path, samples) else {
                continue;
            };
            growing_paths += 1;
            result.findings.push(finding);
        }

        result = result
            .stat("paths_tracked", series.len())
            .stat("growing_paths", growing_paths)
            .stat(
                "max_final_size",
                series
                    .values()
                    .filter_map(|samples| samples.last().map(|(_, size)| *size))
                    .max()
                    .unwrap_or(0),
            );
        Ok(result)
    }
}

fn growth_finding(path: &str, samples: &[(usize, u64)]) -> Option<Finding> {
    let (first_seq, first) = *samples.first()?;
    let (last_seq, last) = *samples.last()?;
    if samples.len() < 2 || last <= first {
        return None;
    }

    let overall = if first == 0 {
        Multiplier::Unbounded
    } else {
        Multiplier::Bounded(last as f64 / first as f64)
    };
    let max_step = samples
        .windows(2)
        .filter_map(|pair| {
            let (_, from) = pair[0];
            let (_, to) = pair[1];
            if to <= from {
                None
            } else if from == 0 {
                Some(Multiplier::Unbounded)
            } else {
                Some(Multiplier::Bounded(to as f64 / from as f64))
            }
        })
        .fold(None::<Multiplier>, |best, step| match (best, step) {
            (None, step) => Some(step),
            (Some(Multiplier::Unbounded), _) | (_, Multiplier::Unbounded) => {
                Some(Multiplier::Unbounded)
            }
            (Some(Multiplier::Bounded(a)), Multiplier::Bounded(b)) => {
                Some(Multiplier::Bounded(a.max(b)))
            }
        })?;

    let suggest_pagination = last > PAGINATION_SIZE && overall.exceeds(WARNING_OVERALL_FACTOR);
    let critical = max_step.exceeds(CRITICAL_STEP_FACTOR) || suggest_pagination;
    let warning = overall.exceeds(WARNING_OVERALL_FACTOR);
    if !critical && !warning {
        return None;
    }

    let mut message = format!(
        "collection '{path}' grew {first} -> {last} items over {} entries ({overall})",
        samples.len()
    );
    if suggest_pagination {
        message.push_str("; exceeds 100 items, consider pagination");
    }

    let finding = if critical {
        Finding::critical(message)
    } else {
        Finding::warning(message)
    };
    Some(
        finding
            .related([first_seq, last_seq])
            .fact("path", path)
            .fact("first_size", first)
            .fact("final_size", last)
            .fact("overall_multiplier", overall.as_value())
            .fact("max_step_multiplier", max_step.as_value()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::AnalysisContext;
    use crate::types::{Severity, State, TimelineEntry};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn make_timeline(per_entry_sizes: &[serde_json::Value]) -> Timeline {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entries = per_entry_sizes
            .iter()
            .enumerate()
            .map(|(index, sizes)| {
                let mut enrichments = State::new();
                enrichments.insert("collection_sizes".to_string(), sizes.clone());
                TimelineEntry {
                    sequence: index + 1,
                    event: "tick".to_string(),
                    timestamp: base,
                    key_state: State::new(),
                    changes: None,
                    duration_since_previous_ms: None,
                    enrichments,
                }
            })
            .collect();
        Timeline {
            test: "t".to_string(),
            duration_ms: 0,
            entries,
        }
    }

    fn analyze(per_entry_sizes: &[serde_json::Value]) -> AnalysisResult {
        let prior = std::collections::BTreeMap::new();
        CollectionGrowthAnalyzer
            .analyze(&make_timeline(per_entry_sizes), &AnalysisContext::new(&prior))
            .unwrap()
    }

    #[test]
    fn empty_timeline_is_tolerated() {
        let result = analyze(&[]);
        assert!(result.findings.is_empty());
        assert!(result.stats.is_empty());
    }

    #[test]
    fn stable_collections_produce_no_findings() {
        let result = analyze(&[json!({"items": 10}), json!({"items": 10})]);
        assert!(result.findings.is_empty());
        assert_eq!(result.stats["paths_tracked"], json!(1));
        assert_eq!(result.stats["growing_paths"], json!(0));
    }

    #[test]
    fn twentyfold_growth_past_hundred_items_is_critical() {
        let result = analyze(&[
            json!({"items": 10}),
            json!({"items": 50}),
            json!({"items": 200}),
        ]);

        assert_eq!(result.findings.len(), 1);
        let finding = &result.findings[0];
        assert_eq!(finding.severity, Severity::Critical);
        assert!(finding.message.contains("10 -> 200"));
        assert!(finding.message.contains("consider pagination"));
        assert_eq!(finding.metadata["overall_multiplier"], json!(20.0));
        assert_eq!(finding.metadata["max_step_multiplier"], json!(5.0));
        assert_eq!(finding.related_entries, vec![1, 3]);
    }

    #[test]
    fn threefold_growth_is_a_warning() {
        let result = analyze(&[json!({"rows": 10}), json!({"rows": 30})]);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Warning);
        assert_eq!(result.findings[0].metadata["overall_multiplier"], json!(3.0));
    }

    #[test]
    fn growth_from_zero_is_unbounded() {
        let result = analyze(&[json!({"queue": 0}), json!({"queue": 4})]);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(
            result.findings[0].metadata["overall_multiplier"],
            json!("unbounded")
        );
        assert!(result.findings[0].message.contains("unbounded (from zero)"));
    }

    #[test]
    fn tenfold_single_step_is_critical_even_when_small() {
        let result = analyze(&[json!({"jobs": 2}), json!({"jobs": 20})]);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Critical);
    }

    #[test]
    fn shrinking_collection_is_ignored() {
        let result = analyze(&[json!({"items": 50}), json!({"items": 5})]);
        assert!(result.findings.is_empty());
    }
}
