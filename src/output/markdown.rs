//! Markdown output formatter
//!
//! Produces the `conflict_report.md` document: one section per problem
//! package with a table of the plugins constraining it.

use crate::engine::Analysis;
use crate::output::OutputFormatter;
use crate::report::ReportEntry;
use crate::rewrite::ReplaceSummary;
use chrono::Utc;
use std::io::Write;

/// Markdown formatter for report files
pub struct MarkdownFormatter {
    /// Include OK and UNCONSTRAINED packages
    show_all: bool,
}

impl MarkdownFormatter {
    /// Create a new Markdown formatter
    pub fn new(show_all: bool) -> Self {
        Self { show_all }
    }
}

/// Escape characters that would break a table cell
fn cell(text: &str) -> String {
    if text.is_empty() {
        return "*(any)*".to_string();
    }
    text.replace('|', "\\|")
}

fn format_entry(entry: &ReportEntry, writer: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "## {} ({})\n",
        entry.package,
        entry.classification.label()
    )?;
    writeln!(writer, "- Allowed range: `{}`", entry.range)?;
    if let Some(installed) = &entry.installed {
        writeln!(writer, "- Installed: `{}`", installed)?;
    }
    if let Some(pair) = &entry.conflict_pair {
        if pair.first == pair.second {
            writeln!(writer, "- `{}` contradicts itself", pair.first)?;
        } else {
            writeln!(
                writer,
                "- First incompatible pair: `{}` and `{}`",
                pair.first, pair.second
            )?;
        }
    }
    writeln!(writer)?;

    writeln!(writer, "| Plugin | Requirement | Line | Admits installed |")?;
    writeln!(writer, "|--------|-------------|------|------------------|")?;
    for contribution in &entry.contributions {
        let admits = match contribution.admits_installed {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        writeln!(
            writer,
            "| {} | {} | {} | {} |",
            cell(&contribution.source),
            cell(&contribution.clause),
            contribution.line,
            admits
        )?;
    }
    writeln!(writer)
}

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, analysis: &Analysis, writer: &mut dyn Write) -> std::io::Result<()> {
        let report = &analysis.report;
        let counts = &report.counts;

        writeln!(writer, "# Dependency Conflict Report\n")?;
        writeln!(
            writer,
            "Generated at {}.\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        writeln!(writer, "| Conflicts | Violations | OK | Unconstrained |")?;
        writeln!(writer, "|-----------|------------|----|---------------|")?;
        writeln!(
            writer,
            "| {} | {} | {} | {} |\n",
            counts.conflicts, counts.violations, counts.ok, counts.unconstrained
        )?;

        if report.is_clean() {
            writeln!(writer, "No dependency conflicts detected.\n")?;
        }

        for entry in report.issues() {
            format_entry(entry, writer)?;
        }

        if self.show_all {
            let others: Vec<&ReportEntry> =
                report.entries.iter().filter(|e| !e.is_issue()).collect();
            if !others.is_empty() {
                writeln!(writer, "## Other packages\n")?;
                writeln!(writer, "| Package | Status | Range | Installed |")?;
                writeln!(writer, "|---------|--------|-------|-----------|")?;
                for entry in others {
                    writeln!(
                        writer,
                        "| {} | {} | `{}` | {} |",
                        entry.package,
                        entry.classification.label(),
                        entry.range,
                        entry.installed.as_deref().unwrap_or("-")
                    )?;
                }
                writeln!(writer)?;
            }
        }

        if !analysis.diagnostics.is_empty() {
            writeln!(writer, "## Manifest problems\n")?;
            for diagnostic in &analysis.diagnostics {
                writeln!(
                    writer,
                    "- `{}` line {}: `{}` ({})",
                    diagnostic.source.name,
                    diagnostic.line_number,
                    diagnostic.line,
                    diagnostic.error.kind()
                )?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    fn format_replacements(
        &self,
        summary: &ReplaceSummary,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let title = if summary.dry_run {
            "# Dependency Replacement (dry run)"
        } else {
            "# Dependency Replacement"
        };
        writeln!(writer, "{}\n", title)?;

        if summary.files.is_empty() {
            writeln!(writer, "No matching dependency found.")?;
            return Ok(());
        }

        writeln!(writer, "| Plugin | File | Lines replaced |")?;
        writeln!(writer, "|--------|------|----------------|")?;
        for file in &summary.files {
            writeln!(
                writer,
                "| {} | `{}` | {} |",
                cell(&file.plugin),
                file.path.display(),
                file.replaced
            )?;
        }
        Ok(())
    }
}
