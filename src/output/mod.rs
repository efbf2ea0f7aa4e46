//! Output formatting for analysis results
//!
//! This module provides:
//! - Text output for terminal display
//! - JSON output for machine processing
//! - Markdown output for sharing as a report file

mod json;
mod markdown;
mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

use crate::engine::Analysis;
use crate::rewrite::ReplaceSummary;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Markdown report file written by `--output-dir`
pub const MARKDOWN_REPORT_FILE: &str = "conflict_report.md";
/// JSON report file written by `--output-dir`
pub const JSON_REPORT_FILE: &str = "conflict_report.json";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
    /// Markdown report
    Markdown,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Issues and a one-line summary only
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with additional information
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Also list OK and UNCONSTRAINED packages
    pub show_all: bool,
    /// Whether to use colors (text only)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            show_all: false,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(format: OutputFormat, verbosity: Verbosity, show_all: bool) -> Self {
        Self {
            format,
            verbosity,
            show_all,
            color: true,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, markdown: bool, verbose: bool, quiet: bool, show_all: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else if markdown {
            OutputFormat::Markdown
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self::new(format, verbosity, show_all)
    }

    /// Set whether to use colors
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write a full analysis: report plus diagnostics
    fn format(&self, analysis: &Analysis, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write the result of a `replace` run
    fn format_replacements(
        &self,
        summary: &ReplaceSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(
            config.verbosity,
            config.show_all,
            config.color,
        )),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.show_all)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new(config.show_all)),
    }
}

/// Write `conflict_report.md` and `conflict_report.json` into a directory
pub fn write_report_files(analysis: &Analysis, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let markdown_path = dir.join(MARKDOWN_REPORT_FILE);
    let mut markdown = Vec::new();
    MarkdownFormatter::new(false).format(analysis, &mut markdown)?;
    fs::write(&markdown_path, markdown)?;

    let json_path = dir.join(JSON_REPORT_FILE);
    let mut json = Vec::new();
    JsonFormatter::new(true).format(analysis, &mut json)?;
    fs::write(&json_path, json)?;

    Ok(vec![markdown_path, json_path])
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(!config.show_all);
        assert!(config.color);
    }

    #[test]
    fn test_output_config_from_cli_json() {
        let config = OutputConfig::from_cli(true, false, false, false, false);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_output_config_from_cli_markdown() {
        let config = OutputConfig::from_cli(false, true, false, false, true);
        assert_eq!(config.format, OutputFormat::Markdown);
        assert!(config.show_all);
    }

    #[test]
    fn test_output_config_from_cli_verbosity() {
        let verbose = OutputConfig::from_cli(false, false, true, false, false);
        assert_eq!(verbose.verbosity, Verbosity::Verbose);
        let quiet = OutputConfig::from_cli(false, false, true, true, false);
        assert_eq!(quiet.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_create_formatter_writes_something_for_each_format() {
        let analysis = test_support::sample_analysis();
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            let formatter =
                create_formatter(OutputConfig::new(format, Verbosity::Normal, false).with_color(false));
            let mut output = Vec::new();
            formatter.format(&analysis, &mut output).unwrap();
            let output = String::from_utf8(output).unwrap();
            assert!(output.contains("pillow"), "{:?} output lacks pillow", format);
        }
    }

    #[test]
    fn test_write_report_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output");
        let written = write_report_files(&test_support::sample_analysis(), &out).unwrap();
        assert_eq!(written.len(), 2);

        let markdown = fs::read_to_string(out.join(MARKDOWN_REPORT_FILE)).unwrap();
        assert!(markdown.starts_with("# Dependency Conflict Report"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(JSON_REPORT_FILE)).unwrap()).unwrap();
        assert_eq!(json["has_blocking_conflict"], true);
    }
}
