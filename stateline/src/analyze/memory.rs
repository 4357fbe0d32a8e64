use crate::analyze::stats::{mean, median, median_step_delta, std_dev};
use crate::analyze::{AnalysisContext, Analyzer};
use crate::errors::EngineResult;
use crate::types::{AnalysisResult, Finding, Timeline};

/// Adaptive-threshold magnitude analyzer over the memory-size enrichment.
///
/// Baselines against the timeline's own statistics instead of hard-coded
/// units, so the same thresholds work for kilobyte- and megabyte-scale
/// timelines: a step is suspicious relative to the median step, an absolute
/// value relative to mean + 2 standard deviations.
pub struct MemoryGrowthAnalyzer;

/// Step growth beyond this multiple of the median step is a warning.
const WARNING_STEP_FACTOR: f64 = 3.0;
/// Step growth beyond this multiple of the median step is critical.
const CRITICAL_STEP_FACTOR: f64 = 10.0;
/// Consecutive increases required before flagging a leak.
const LEAK_RUN_LENGTH: usize = 3;

impl Analyzer for MemoryGrowthAnalyzer {
    fn name(&self) -> &'static str {
        "memory_growth"
    }

    fn requires_enrichers(&self) -> Vec<&'static str> {
        vec!["memory_footprint"]
    }

    fn analyze(&self, timeline: &Timeline, _ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        let samples: Vec<(usize, &str, f64)> = timeline
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .enrichment_u64("state_size_bytes")
                    .map(|size| (entry.sequence, entry.event.as_str(), size as f64))
            })
            .collect();
        if samples.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let sizes: Vec<f64> = samples.iter().map(|(_, _, size)| *size).collect();
        let mean_size = mean(&sizes);
        let median_size = median(&sizes);
        let deviation = std_dev(&sizes);
        let typical_step = median_step_delta(&sizes);
        let absolute_bound = mean_size + 2.0 * deviation;

        let mut result = AnalysisResult::empty()
            .stat("samples", sizes.len())
            .stat("min", sizes.iter().copied().fold(f64::INFINITY, f64::min))
            .stat("max", sizes.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .stat("mean", mean_size)
            .stat("median", median_size)
            .stat("std_dev", deviation)
            .stat("median_step_delta", typical_step);

        for window in samples.windows(2) {
            let (prev_seq, _, prev_size) = window[0];
            let (seq, event, size) = window[1];
            let step = size - prev_size;
            if step <= 0.0 {
                continue;
            }

            let finding = if step > CRITICAL_STEP_FACTOR * typical_step || size > absolute_bound {
                Finding::critical(format!(
                    "state size jumped {prev_size:.0} -> {size:.0} bytes at '{event}' \
                     (step +{step:.0}, typical step {typical_step:.0})"
                ))
            } else if step > WARNING_STEP_FACTOR * typical_step {
                Finding::warning(format!(
                    "state size grew {prev_size:.0} -> {size:.0} bytes at '{event}' \
                     (step +{step:.0}, typical step {typical_step:.0})"
                ))
            } else {
                continue;
            };
            result.findings.push(
                finding
                    .related([prev_seq, seq])
                    .fact("step_bytes", step)
                    .fact("median_step_delta", typical_step),
            );
        }

        result.findings.extend(leak_findings(&samples));
        Ok(result)
    }
}

/// Flag every maximal run of consecutive increases long enough to look like
/// a leak rather than a one-off allocation.
fn leak_findings(samples: &[(usize, &str, f64)]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut run_start = 0;
    for index in 1..=samples.len() {
        let increasing = index < samples.len() && samples[index].2 > samples[index - 1].2;
        if increasing {
            continue;
        }
        let increases = index - run_start - 1;
        if increases >= LEAK_RUN_LENGTH {
            let (first_seq, _, first_size) = samples[run_start];
            let (last_seq, _, last_size) = samples[index - 1];
            findings.push(
                Finding::critical(format!(
                    "state size increased for {increases} consecutive entries \
                     ({first_size:.0} -> {last_size:.0} bytes); possible leak"
                ))
                .related((first_seq..=last_seq).collect::<Vec<_>>())
                .fact("consecutive_increases", increases)
                .fact("growth_bytes", last_size - first_size),
            );
        }
        run_start = index;
    }
    findings
}
