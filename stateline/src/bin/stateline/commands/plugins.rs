use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use stateline::PluginRegistry;

use crate::output::OutputManager;

#[derive(Args)]
pub struct PluginsArgs {}

/// List every registered enricher and analyzer with its metadata.
pub fn handle_plugins(_args: PluginsArgs, output: &OutputManager) -> Result<()> {
    let registry = PluginRegistry::with_external();

    let mut enrichers = output.make_table(&["Enricher"]);
    for enricher in registry.enrichers() {
        enrichers.add_row(vec![Cell::new(enricher.name())]);
    }

    let mut analyzers = output.make_table(&["Analyzer", "Default", "Requires", "Depends on"]);
    for analyzer in registry.analyzers() {
        analyzers.add_row(vec![
            Cell::new(analyzer.name()),
            Cell::new(if analyzer.default_enabled() { "yes" } else { "no" }),
            Cell::new(analyzer.requires_enrichers().join(", ")),
            Cell::new(analyzer.depends_on().join(", ")),
        ]);
    }

    if !output.options.quiet {
        println!("{enrichers}");
        println!();
        println!("{analyzers}");
    }
    Ok(())
}
