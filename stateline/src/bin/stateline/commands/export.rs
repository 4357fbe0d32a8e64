use anyhow::{Context, Result};
use clap::Args;
use stateline::{PluginRegistry, TimelineBuilder, export};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use crate::commands::{load_config, load_snapshots};
use crate::output::OutputManager;

#[derive(Args)]
pub struct ExportArgs {
    /// Snapshot capture file (JSON array of snapshots)
    pub snapshots: PathBuf,

    /// Destination file; stdout when omitted
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Test name recorded on the timeline
    #[arg(long, default_value = "ui-test")]
    pub test_name: String,

    /// Engine configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn handle_export(args: ExportArgs, output: &OutputManager) -> Result<()> {
    let snapshots = load_snapshots(&args.snapshots)?;
    let config = load_config(args.config.as_deref())?;
    let registry = PluginRegistry::with_external();

    let builder = TimelineBuilder::new(config, registry.enrichers().to_vec());
    let timeline = builder.build(&snapshots, &args.test_name)?;

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?;
            export::write_timeline(&timeline, file)?;
            output.success(&format!(
                "wrote timeline with {} entries to '{}'",
                timeline.len(),
                path.display()
            ));
        }
        None => {
            export::write_timeline(&timeline, io::stdout().lock())?;
            println!();
        }
    }
    Ok(())
}
