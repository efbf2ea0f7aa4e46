//! Text output formatter for terminal display
//!
//! This module provides:
//! - Per-package issue blocks with contributing sources
//! - Optional listing of OK and UNCONSTRAINED packages
//! - Manifest diagnostics
//! - Summary line

use crate::domain::Classification;
use crate::engine::Analysis;
use crate::output::{OutputFormatter, Verbosity};
use crate::parser::Diagnostic;
use crate::report::{ReportCounts, ReportEntry};
use crate::rewrite::ReplaceSummary;
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    /// Also list OK and UNCONSTRAINED packages
    show_all: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, show_all: bool, color: bool) -> Self {
        Self {
            verbosity,
            show_all,
            color,
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn label(&self, classification: Classification) -> String {
        let label = format!("{:<13}", classification.label());
        match classification {
            Classification::Conflict => self.paint(&label, |s| s.red().bold()),
            Classification::Violation => self.paint(&label, |s| s.yellow().bold()),
            Classification::Ok => self.paint(&label, |s| s.green()),
            Classification::Unconstrained => self.paint(&label, |s| s.dimmed()),
        }
    }

    fn format_issue(&self, entry: &ReportEntry, writer: &mut dyn Write) -> std::io::Result<()> {
        let installed = entry
            .installed
            .as_deref()
            .map(|v| format!("  installed {}", v))
            .unwrap_or_default();
        writeln!(
            writer,
            "{} {}  {}{}",
            self.label(entry.classification),
            self.paint(&entry.package, |s| s.bold()),
            entry.range,
            installed
        )?;

        if let Some(pair) = &entry.conflict_pair {
            let explanation = if pair.first == pair.second {
                format!("{} contradicts itself", pair.first)
            } else {
                format!("{} and {} cannot both be satisfied", pair.first, pair.second)
            };
            writeln!(writer, "    {}", self.paint(&explanation, |s| s.red()))?;
        }

        let source_width = entry
            .contributions
            .iter()
            .map(|c| c.source.len())
            .max()
            .unwrap_or(0);
        for contribution in &entry.contributions {
            let clause = if contribution.clause.is_empty() {
                "(any)"
            } else {
                contribution.clause.as_str()
            };
            let verdict = match contribution.admits_installed {
                Some(true) => self.paint("ok", |s| s.green()),
                Some(false) => self.paint("rejects installed", |s| s.yellow()),
                None => String::new(),
            };
            write!(
                writer,
                "    {:width$}  {}",
                contribution.source,
                clause,
                width = source_width
            )?;
            if self.verbosity == Verbosity::Verbose {
                write!(
                    writer,
                    "  {}",
                    self.paint(
                        &format!("{}:{}", contribution.origin.display(), contribution.line),
                        |s| s.dimmed()
                    )
                )?;
            }
            if verdict.is_empty() {
                writeln!(writer)?;
            } else {
                writeln!(writer, "  {}", verdict)?;
            }
        }
        writeln!(writer)
    }

    fn format_other(&self, entry: &ReportEntry, writer: &mut dyn Write) -> std::io::Result<()> {
        let detail = match &entry.installed {
            Some(v) => format!("{}  installed {}", entry.range, v),
            None => entry.range.clone(),
        };
        writeln!(
            writer,
            "{} {}  {}",
            self.label(entry.classification),
            entry.package,
            self.paint(&detail, |s| s.dimmed())
        )
    }

    fn format_diagnostics(
        &self,
        diagnostics: &[Diagnostic],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if diagnostics.is_empty() {
            return Ok(());
        }
        writeln!(
            writer,
            "{}",
            self.paint(
                &format!("{} manifest line(s) could not be parsed:", diagnostics.len()),
                |s| s.yellow().bold()
            )
        )?;
        for diagnostic in diagnostics {
            writeln!(writer, "  {}", diagnostic)?;
        }
        writeln!(writer)
    }

    fn format_summary(
        &self,
        counts: &ReportCounts,
        diagnostics: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let conflicts = format!("{} conflict(s)", counts.conflicts);
        let violations = format!("{} violation(s)", counts.violations);
        let conflicts = if counts.conflicts > 0 {
            self.paint(&conflicts, |s| s.red().bold())
        } else {
            conflicts
        };
        let violations = if counts.violations > 0 {
            self.paint(&violations, |s| s.yellow())
        } else {
            violations
        };

        write!(
            writer,
            "Summary: {} package(s), {}, {}, {} ok, {} unconstrained",
            counts.total(),
            conflicts,
            violations,
            counts.ok,
            counts.unconstrained
        )?;
        if diagnostics > 0 {
            write!(writer, ", {} unparsed line(s)", diagnostics)?;
        }
        writeln!(writer)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, analysis: &Analysis, writer: &mut dyn Write) -> std::io::Result<()> {
        let report = &analysis.report;

        if self.verbosity != Verbosity::Quiet && report.is_clean() {
            writeln!(
                writer,
                "{}",
                self.paint("No dependency conflicts found.", |s| s.green())
            )?;
            writeln!(writer)?;
        }

        for entry in report.issues() {
            self.format_issue(entry, writer)?;
        }

        if self.show_all && self.verbosity != Verbosity::Quiet {
            let others: Vec<&ReportEntry> =
                report.entries.iter().filter(|e| !e.is_issue()).collect();
            for entry in &others {
                self.format_other(entry, writer)?;
            }
            if !others.is_empty() {
                writeln!(writer)?;
            }
        }

        self.format_diagnostics(&analysis.diagnostics, writer)?;
        self.format_summary(&report.counts, analysis.diagnostics.len(), writer)
    }

    fn format_replacements(
        &self,
        summary: &ReplaceSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = if summary.dry_run {
            self.paint("(dry-run) ", |s| s.cyan())
        } else {
            String::new()
        };

        if summary.files.is_empty() {
            writeln!(writer, "{}No matching dependency found.", prefix)?;
        }
        if self.verbosity != Verbosity::Quiet {
            for file in &summary.files {
                writeln!(
                    writer,
                    "{}{}  {} line(s)  {}",
                    prefix,
                    self.paint(&file.plugin, |s| s.bold()),
                    file.replaced,
                    self.paint(&file.path.display().to_string(), |s| s.dimmed())
                )?;
            }
        }
        for error in &summary.errors {
            writeln!(writer, "{}", self.paint(&error.to_string(), |s| s.red()))?;
        }

        let verb = if summary.dry_run { "Would replace" } else { "Replaced" };
        writeln!(
            writer,
            "{}{} {} line(s) in {} file(s)",
            prefix,
            verb,
            summary.total_replacements(),
            summary.files_changed()
        )
    }
}
