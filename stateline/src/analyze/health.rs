use crate::analyze::{AnalysisContext, Analyzer};
use crate::errors::EngineResult;
use crate::types::{AnalysisResult, Finding, Severity, Timeline};

/// Cross-analyzer health summary.
///
/// Runs after the detectors and folds their results into severity counts
/// and a single verdict stat. Dependencies that were not selected for the
/// run are simply absent and skipped.
pub struct HealthSummaryAnalyzer;

const UPSTREAM: &[&str] = &[
    "memory_growth",
    "collection_growth",
    "event_frequency",
    "relation_churn",
];

impl Analyzer for HealthSummaryAnalyzer {
    fn name(&self) -> &'static str {
        "health_summary"
    }

    fn depends_on(&self) -> Vec<&'static str> {
        UPSTREAM.to_vec()
    }

    fn analyze(&self, timeline: &Timeline, ctx: &AnalysisContext<'_>) -> EngineResult<AnalysisResult> {
        if timeline.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let mut consulted = 0u64;
        let mut info = 0u64;
        let mut warning = 0u64;
        let mut critical = 0u64;
        let mut noisiest: Option<(&str, usize)> = None;

        for upstream in UPSTREAM {
            let Some(result) = ctx.result_of(upstream) else {
                continue;
            };
            consulted += 1;
            for finding in &result.findings {
                match finding.severity {
                    Severity::Info => info += 1,
                    Severity::Warning => warning += 1,
                    Severity::Critical => critical += 1,
                }
            }
            let count = result.findings.len();
            if count > 0 && noisiest.is_none_or(|(_, best)| count > best) {
                noisiest = Some((upstream, count));
            }
        }

        let verdict = if critical > 0 {
            "critical"
        } else if warning > 0 {
            "degraded"
        } else {
            "ok"
        };

        let mut result = AnalysisResult::empty()
            .stat("analyzers_consulted", consulted)
            .stat("info_count", info)
            .stat("warning_count", warning)
            .stat("critical_count", critical)
            .stat("health", verdict);

        if let Some((name, count)) = noisiest {
            result.findings.push(
                Finding::info(format!(
                    "overall health {verdict}: {warning} warning(s), {critical} critical(s) \
                     across {consulted} analyzer(s); noisiest: '{name}' ({count})"
                ))
                .fact("health", verdict)
                .fact("noisiest_analyzer", name),
            );
        }
        Ok(result)
    }
}
