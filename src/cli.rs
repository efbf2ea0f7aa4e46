//! CLI argument parsing module for depclash

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dependency conflict detector for side-by-side installed plugins
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depclash",
    version,
    about = "Detect dependency version conflicts between plugins sharing one environment"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output and debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check plugin requirements for conflicts and violations
    Check(CheckArgs),
    /// Replace a dependency in every plugin's requirements.txt
    Replace(ReplaceArgs),
}

/// Options for `depclash check`
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Plugins directory; each subdirectory is one plugin
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // Environment snapshot
    /// Installed packages file (`pip freeze` output or `pip list --format=json`)
    #[arg(long, conflicts_with = "python")]
    pub installed: Option<PathBuf>,

    /// Python interpreter to query with `pip list`
    #[arg(long)]
    pub python: Option<PathBuf>,

    // Engine options
    /// Treat `pkg[extra]` as a package distinct from `pkg`
    #[arg(long)]
    pub strict_extras: bool,

    /// Do not fold package name case when grouping
    #[arg(long)]
    pub case_sensitive: bool,

    /// Ignore a package (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Config file (default: depclash.toml in the plugins directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    // Output options
    /// Output results in JSON format
    #[arg(long, conflicts_with = "markdown")]
    pub json: bool,

    /// Output results as a Markdown report
    #[arg(long)]
    pub markdown: bool,

    /// Also list packages without problems
    #[arg(short, long)]
    pub all: bool,

    /// Write conflict_report.md and conflict_report.json into this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Options for `depclash replace`
#[derive(Args, Debug, Clone)]
pub struct ReplaceArgs {
    /// Plugins directory; each subdirectory is one plugin
    pub path: PathBuf,

    /// Dependency to replace, e.g. `opencv-python` or `numpy<2`
    pub old: String,

    /// Replacement line, e.g. `opencv-python-headless>=4.8`
    pub new: String,

    /// Show what would be replaced without changing files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,
}
