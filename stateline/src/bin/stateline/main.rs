mod commands;
mod output;
mod theme;

use anyhow::Result;
use clap::{
    CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, Style},
    },
};

use commands::{
    analyze::{AnalyzeArgs, handle_analyze},
    export::{ExportArgs, handle_export},
    plugins::{PluginsArgs, handle_plugins},
};
use output::{GlobalOptions, OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "stateline")]
#[command(version = "0.1.0")]
#[command(
    about = "Timeline and analysis engine for UI-test state captures",
    long_about = r#"Turns a pre-captured sequence of per-event state snapshots into a
structured, diffed, enriched timeline, then runs pattern detectors over it:

• Adaptive memory-growth and leak detection
• Collection growth tracking with pagination hints
• No-op event and debounce analysis
• Relation churn (N+1 query patterns)

Commands:
  analyze   Build a timeline and run analyzers over it
  export    Serialize the timeline JSON document
  plugins   List registered enrichers and analyzers
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a timeline from a snapshot capture and run analyzers over it
    Analyze(AnalyzeArgs),

    /// Serialize the timeline JSON document for external tooling
    Export(ExportArgs),

    /// List registered enrichers and analyzers
    Plugins(PluginsArgs),
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(ansi(AnsiColor::BrightBlue).bold())
        .header(ansi(AnsiColor::Cyan).bold())
        .literal(ansi(AnsiColor::Magenta))
        .placeholder(ansi(AnsiColor::BrightBlack))
        .valid(ansi(AnsiColor::Green))
        .invalid(ansi(AnsiColor::Yellow))
        .error(ansi(AnsiColor::Red).bold())
}

fn ansi(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(ClapColor::Ansi(color)))
}

fn main() {
    env_logger::init();

    let matches = Cli::command().styles(help_styles()).get_matches();
    let cli = Cli::from_arg_matches(&matches).expect("failed to parse CLI arguments");

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, &output),
        Commands::Export(args) => handle_export(args, &output),
        Commands::Plugins(args) => handle_plugins(args, &output),
    }
}
