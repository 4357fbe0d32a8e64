use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;
use stateline::Severity;

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    #[allow(dead_code)]
    pub no_color: bool,
}

/// Trait for data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if self.options.quiet {
            return;
        }
        println!("{} {}", ICONS.success.color(THEME.success), message);
    }

    pub fn info(&self, message: &str) {
        if self.options.quiet {
            return;
        }
        println!("{} {}", ICONS.info.color(THEME.info), message);
    }

    #[allow(dead_code)]
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", ICONS.error.color(THEME.error), message);
    }

    /// Base table with the shared preset and a styled header row.
    pub fn make_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(
            headers
                .iter()
                .map(|header| Cell::new(header).add_attribute(Attribute::Bold)),
        );
        table
    }
}

/// Severity rendered with its conventional color.
pub fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.to_string());
    match severity {
        Severity::Info => cell.fg(TableColor::Blue),
        Severity::Warning => cell.fg(TableColor::Yellow),
        Severity::Critical => cell.fg(TableColor::Red),
    }
}
