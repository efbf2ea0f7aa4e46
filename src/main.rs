//! depclash - Dependency conflict detector CLI tool
//!
//! Reads the requirements of every plugin installed side by side in one
//! Python environment and reports:
//! - Conflicts: no version satisfies every plugin at once
//! - Violations: the installed version falls outside the allowed range
//! - Malformed manifest lines

use clap::Parser;
use depclash::cli::{CheckArgs, CliArgs, Command, ReplaceArgs};
use depclash::config::FileConfig;
use depclash::engine::analyze;
use depclash::output::{create_formatter, write_report_files, OutputConfig};
use depclash::progress::Progress;
use depclash::rewrite::Replacer;
use depclash::scanner::scan_plugins;
use depclash::snapshot::{capture_installed, EnvironmentSnapshot, SystemRunner};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for a blocking conflict
const EXIT_CONFLICT: u8 = 1;
/// Exit code for violations, diagnostics or unreadable plugins without a conflict
const EXIT_WARNINGS: u8 = 2;
/// Exit code for runtime failures (missing directory, unreadable snapshot, ...)
const EXIT_ERROR: u8 = 3;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `--verbose`
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Main application logic
fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("depclash v{}", env!("CARGO_PKG_VERSION"));
    }

    match &args.command {
        Command::Check(check) => run_check(check, args.verbose, args.quiet),
        Command::Replace(replace) => run_replace(replace, args.verbose, args.quiet),
    }
}

fn run_check(args: &CheckArgs, verbose: bool, quiet: bool) -> anyhow::Result<ExitCode> {
    let file_config = FileConfig::discover(args.config.as_deref(), &args.path)?;
    let engine_config =
        file_config.to_engine_config(args.strict_extras, args.case_sensitive, &args.ignore);
    debug!("Engine configuration: {:?}", engine_config);

    let mut progress = Progress::new(!quiet && !args.json && io::stderr().is_terminal());
    let scan = scan_plugins(&args.path, &mut progress)?;

    // A snapshot source on the command line replaces the one from the config file
    let (installed, python) = if args.installed.is_some() || args.python.is_some() {
        (args.installed.clone(), args.python.clone())
    } else {
        (file_config.installed.clone(), file_config.python.clone())
    };
    let snapshot = match (installed, python) {
        (Some(path), _) => EnvironmentSnapshot::load(&path)?,
        (None, Some(python)) => {
            progress.begin_query(&python);
            let snapshot = capture_installed(&SystemRunner, &python);
            progress.clear();
            snapshot?
        }
        (None, None) => {
            debug!("No snapshot source given, installed versions are unknown");
            EnvironmentSnapshot::new()
        }
    };
    if verbose {
        eprintln!(
            "Plugins: {} ({} manifests), installed packages: {}",
            scan.plugin_count,
            scan.manifest_count(),
            snapshot.len()
        );
    }

    let analysis = analyze(&scan.manifests, &snapshot, &engine_config);

    let output_config = OutputConfig::from_cli(args.json, args.markdown, verbose, quiet, args.all)
        .with_color(io::stdout().is_terminal());
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&analysis, &mut stdout)?;
    stdout.flush()?;

    if let Some(dir) = &args.output_dir {
        for path in write_report_files(&analysis, dir)? {
            if !quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }

    if !scan.errors.is_empty() {
        eprintln!();
        eprintln!("Plugins that could not be read:");
        for error in &scan.errors {
            eprintln!("  - {}", error);
        }
    }

    let report = &analysis.report;
    if report.has_blocking_conflict {
        Ok(ExitCode::from(EXIT_CONFLICT))
    } else if report.counts.violations > 0
        || analysis.has_diagnostics()
        || !scan.errors.is_empty()
    {
        Ok(ExitCode::from(EXIT_WARNINGS))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_replace(args: &ReplaceArgs, verbose: bool, quiet: bool) -> anyhow::Result<ExitCode> {
    if verbose && args.dry_run {
        eprintln!("Mode: dry-run");
    }

    let summary = Replacer::new(args.dry_run).replace_all(&args.path, &args.old, &args.new)?;

    let output_config = OutputConfig::from_cli(args.json, false, verbose, quiet, false)
        .with_color(io::stdout().is_terminal());
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format_replacements(&summary, &mut stdout)?;
    stdout.flush()?;

    if summary.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_WARNINGS))
    }
}
