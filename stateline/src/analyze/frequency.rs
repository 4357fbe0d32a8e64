use std::collections::BTreeSet;

use crate::analyze::{AnalysisContext, Analyzer};
use crate::errors::EngineResult;
use crate::types::{AnalysisResult, Finding, Timeline, TimelineEntry};

/// Frequency / no-op analyzer over event labels.
///
/// Groups consecutive same-named events and flags runs whose repeats change
/// no state at all: work was done, nothing happened. Input-like events that
/// fire in long runs additionally get a debounce/throttle suggestion.
pub struct EventFrequencyAnalyzer;

/// Repeats at or above this count escalate a no-op run to a warning.
const WARNING_REPEATS: usize = 3;
/// Run length at which an input-like event counts as high-frequency.
const HIGH_FREQUENCY_RUN: usize = 5;

/// Event-name fragments typical of raw user input.
const INPUT_EVENT_HINTS: &[&str] = &[
    "input", "change", "keyup", "keydown", "scroll", "mousemove", "drag", "resize",
];

impl Analyzer for EventFrequencyAnalyzer {
    fn name(&self) -> &'static str {
        "event_frequency"
    }

    fn analyze(&self, timeline: &Timeline, _ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        if timeline.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let runs = consecutive_runs(&timeline.entries);
        let unique_events: BTreeSet<&str> =
            timeline.entries.iter().map(|entry| entry.event.as_str()).collect();
        let max_run = runs.iter().map(|run| run.len()).max().unwrap_or(0);

        let mut result = AnalysisResult::empty();
        let mut noop_runs = 0u64;
        for run in &runs {
            if run.len() < 2 {
                continue;
            }
            let event = run[0].event.as_str();
            let input_like = is_input_like(event);

            // Repeats whose diffs recorded no change at all.
            let repeats_are_noop = run[1..].iter().all(TimelineEntry::is_noop);
            if repeats_are_noop {
                noop_runs += 1;
                let mut message = format!(
                    "event '{event}' repeated {} times with no state change",
                    run.len()
                );
                let severity_warning = run.len() >= WARNING_REPEATS;
                if severity_warning && input_like {
                    message.push_str("; consider debouncing or throttling");
                }
                let finding = if severity_warning {
                    Finding::warning(message)
                } else {
                    Finding::info(message)
                };
                result.findings.push(
                    finding
                        .related(run.iter().map(|entry| entry.sequence))
                        .fact("event", event)
                        .fact("repeats", run.len()),
                );
            } else if input_like && run.len() >= HIGH_FREQUENCY_RUN {
                result.findings.push(
                    Finding::info(format!(
                        "high-frequency '{event}' events ({} in a row); \
                         consider debouncing or throttling",
                        run.len()
                    ))
                    .related(run.iter().map(|entry| entry.sequence))
                    .fact("event", event)
                    .fact("repeats", run.len()),
                );
            }
        }

        result = result
            .stat("total_events", timeline.len())
            .stat("unique_events", unique_events.len())
            .stat("max_run_length", max_run)
            .stat("noop_runs", noop_runs);
        Ok(result)
    }
}

fn consecutive_runs(entries: &[TimelineEntry]) -> Vec<&[TimelineEntry]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for index in 1..=entries.len() {
        if index == entries.len() || entries[index].event != entries[start].event {
            runs.push(&entries[start..index]);
            start = index;
        }
    }
    runs
}

fn is_input_like(event: &str) -> bool {
    let lower = event.to_ascii_lowercase();
    INPUT_EVENT_HINTS.iter().any(|hint| lower.contains(hint))
}
