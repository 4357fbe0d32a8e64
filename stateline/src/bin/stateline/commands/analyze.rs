use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;
use stateline::{
    AnalysisReport, AnalyzerSelection, PluginRegistry, Timeline, TimelineBuilder, run_analyzers,
};
use std::path::PathBuf;

use crate::commands::{load_config, load_snapshots};
use crate::output::{GlobalOptions, OutputManager, TableDisplay, severity_cell};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Snapshot capture file (JSON array of snapshots)
    pub snapshots: PathBuf,

    /// Test name recorded on the timeline
    #[arg(long, default_value = "ui-test")]
    pub test_name: String,

    /// Analyzers to run: 'all', 'none', or a comma-separated list of names.
    /// Defaults to the registry's default-enabled subset.
    #[arg(long)]
    pub analyzers: Option<String>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Findings and stats in report form, for table/JSON/compact rendering.
#[derive(Serialize)]
struct ReportView {
    test: String,
    entries: usize,
    duration_ms: i64,
    report: AnalysisReport,
}

pub fn handle_analyze(args: AnalyzeArgs, output: &OutputManager) -> Result<()> {
    let snapshots = load_snapshots(&args.snapshots)?;
    let config = load_config(args.config.as_deref())?;
    let registry = PluginRegistry::with_external();

    let builder = TimelineBuilder::new(config, registry.enrichers().to_vec());
    let timeline = builder.build(&snapshots, &args.test_name)?;

    let selection = args
        .analyzers
        .as_deref()
        .map(AnalyzerSelection::parse)
        .unwrap_or(AnalyzerSelection::Default);
    let analyzers = registry.select(&selection)?;
    let report = run_analyzers(&timeline, &analyzers)?;

    summarize(&timeline, &report, output);
    output.display(&ReportView {
        test: timeline.test.clone(),
        entries: timeline.len(),
        duration_ms: timeline.duration_ms,
        report,
    })
}

fn summarize(timeline: &Timeline, report: &AnalysisReport, output: &OutputManager) {
    output.info(&format!(
        "timeline '{}': {} entries over {}ms",
        timeline.test,
        timeline.len(),
        timeline.duration_ms
    ));
    match report.finding_count() {
        0 => output.success("no findings"),
        count => output.info(&format!(
            "{count} finding(s) from {} analyzer(s)",
            report.results.len()
        )),
    }
}

impl TableDisplay for ReportView {
    fn to_table(&self, _options: &GlobalOptions) -> Table {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
        table.set_header(vec!["Analyzer", "Severity", "Finding", "Entries"]);

        for run in &self.report.results {
            for finding in &run.result.findings {
                let entries = finding
                    .related_entries
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![
                    Cell::new(&run.analyzer),
                    severity_cell(finding.severity),
                    Cell::new(&finding.message),
                    Cell::new(entries),
                ]);
            }
        }
        table
    }

    fn to_compact(&self) -> String {
        let mut lines = Vec::new();
        for run in &self.report.results {
            for finding in &run.result.findings {
                lines.push(format!(
                    "{} [{}] {}",
                    run.analyzer, finding.severity, finding.message
                ));
            }
        }
        if lines.is_empty() {
            lines.push(format!("{}: no findings", self.test));
        }
        lines.join("\n")
    }
}
