//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the report, counters and diagnostics
//! - A `conflicts` list of `{dependency_name, conflicting_plugins}` records
//! - JSON serialization of replace results

use crate::engine::Analysis;
use crate::output::OutputFormatter;
use crate::parser::Diagnostic;
use crate::report::{ReportCounts, ReportEntry};
use crate::rewrite::ReplaceSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Include OK and UNCONSTRAINED packages
    show_all: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(show_all: bool) -> Self {
        Self { show_all }
    }
}

/// JSON representation of an analysis
#[derive(Serialize)]
struct JsonOutput<'a> {
    generated_at: DateTime<Utc>,
    has_blocking_conflict: bool,
    summary: &'a ReportCounts,
    packages: Vec<&'a ReportEntry>,
    conflicts: Vec<JsonConflict<'a>>,
    diagnostics: &'a [Diagnostic],
}

/// One conflicting dependency with the plugins that constrain it
#[derive(Serialize)]
struct JsonConflict<'a> {
    dependency_name: &'a str,
    conflicting_plugins: Vec<JsonPluginRequirement<'a>>,
}

#[derive(Serialize)]
struct JsonPluginRequirement<'a> {
    plugin: &'a str,
    version_requirement: &'a str,
}

/// JSON representation of a replace run
#[derive(Serialize)]
struct JsonReplaceOutput<'a> {
    dry_run: bool,
    files_changed: usize,
    replacements: usize,
    files: Vec<JsonReplacedFile<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct JsonReplacedFile<'a> {
    plugin: &'a str,
    path: &'a Path,
    replaced: usize,
    modified: bool,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, analysis: &Analysis, writer: &mut dyn Write) -> std::io::Result<()> {
        let report = &analysis.report;
        let output = JsonOutput {
            generated_at: Utc::now(),
            has_blocking_conflict: report.has_blocking_conflict,
            summary: &report.counts,
            packages: report
                .entries
                .iter()
                .filter(|e| self.show_all || e.is_issue())
                .collect(),
            conflicts: report
                .issues()
                .filter(|e| e.conflict_pair.is_some())
                .map(|e| JsonConflict {
                    dependency_name: &e.package,
                    conflicting_plugins: e
                        .contributions
                        .iter()
                        .map(|c| JsonPluginRequirement {
                            plugin: &c.source,
                            version_requirement: &c.clause,
                        })
                        .collect(),
                })
                .collect(),
            diagnostics: &analysis.diagnostics,
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
        Ok(())
    }

    fn format_replacements(
        &self,
        summary: &ReplaceSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonReplaceOutput {
            dry_run: summary.dry_run,
            files_changed: summary.files_changed(),
            replacements: summary.total_replacements(),
            files: summary
                .files
                .iter()
                .map(|f| JsonReplacedFile {
                    plugin: &f.plugin,
                    path: &f.path,
                    replaced: f.replaced,
                    modified: f.file_modified,
                })
                .collect(),
            errors: summary.errors.iter().map(|e| e.to_string()).collect(),
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
        Ok(())
    }
}
