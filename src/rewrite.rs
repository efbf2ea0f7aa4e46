//! Dependency replacement across plugin requirements files
//!
//! This module provides:
//! - Replacer for swapping one dependency line for another in every plugin
//! - Dry-run mode support (no actual file modifications)
//! - Preservation of comments, blank lines, malformed lines and line endings

use crate::domain::{Requirement, Source};
use crate::error::{AppError, ParseError, RewriteError};
use crate::parser::{logical_lines, parse_requirement};
use crate::scanner::{plugin_dirs, REQUIREMENTS_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The dependency being looked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceTarget {
    /// Normalized package name
    pub name: String,
    /// Sorted clause strings; empty matches any specifier
    clauses: Vec<String>,
}

impl ReplaceTarget {
    /// Parse the dependency to look for, e.g. `opencv-python` or `numpy<2`
    pub fn parse(text: &str) -> Result<Self, RewriteError> {
        let requirement = parse_cli_requirement(text)?;
        Ok(Self {
            name: requirement.name.clone(),
            clauses: sorted_clauses(&requirement),
        })
    }

    /// Returns true if a parsed manifest line matches this target
    pub fn matches(&self, requirement: &Requirement) -> bool {
        requirement.name == self.name
            && (self.clauses.is_empty() || sorted_clauses(requirement) == self.clauses)
    }
}

fn parse_cli_requirement(text: &str) -> Result<Requirement, RewriteError> {
    let source = Source::new("command line", "");
    match parse_requirement(text, &source, 1) {
        Ok(Some(requirement)) => Ok(requirement),
        Ok(None) => Err(RewriteError::InvalidDependency {
            text: text.to_string(),
            source: ParseError::malformed_requirement(text, "not a requirement"),
        }),
        Err(e) => Err(RewriteError::InvalidDependency {
            text: text.to_string(),
            source: e,
        }),
    }
}

fn sorted_clauses(requirement: &Requirement) -> Vec<String> {
    let mut clauses: Vec<String> = requirement.clauses.iter().map(|c| c.to_string()).collect();
    clauses.sort();
    clauses
}

/// Replacements made in one requirements file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReplacement {
    pub path: PathBuf,
    /// Plugin directory name
    pub plugin: String,
    /// Number of lines replaced
    pub replaced: usize,
    /// Whether the file was written
    pub file_modified: bool,
}

/// Result of a replacement run over a plugins directory
#[derive(Debug, Default)]
pub struct ReplaceSummary {
    /// Files with at least one matching line
    pub files: Vec<FileReplacement>,
    /// Files that could not be read or written
    pub errors: Vec<RewriteError>,
    pub dry_run: bool,
}

impl ReplaceSummary {
    /// Number of files that contained the dependency
    pub fn files_changed(&self) -> usize {
        self.files.len()
    }

    /// Total number of lines replaced
    pub fn total_replacements(&self) -> usize {
        self.files.iter().map(|f| f.replaced).sum()
    }
}

/// Rewrites requirements files, replacing one dependency with another
pub struct Replacer {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

impl Replacer {
    /// Create a new Replacer
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create a Replacer in dry-run mode
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Check if this replacer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Replace matching lines in file content; returns the new content and the count.
    ///
    /// Lines continued with `\` are matched as one requirement and replaced
    /// as a whole, keeping the line ending of their last physical line.
    pub fn replace_in_content(
        &self,
        content: &str,
        source: &Source,
        target: &ReplaceTarget,
        replacement: &str,
    ) -> (String, usize) {
        let physical: Vec<&str> = content.split_inclusive('\n').collect();
        let bodies: Vec<&str> = physical
            .iter()
            .map(|line| line.trim_end_matches(['\n', '\r']))
            .collect();

        let mut output = String::with_capacity(content.len());
        let mut replaced = 0;
        let mut next = 0;

        for line in logical_lines(&bodies) {
            let span = &physical[next..next + line.span];
            next += line.span;

            match parse_requirement(&line.text, source, line.number) {
                Ok(Some(requirement)) if target.matches(&requirement) => {
                    debug!(
                        "{}:{}: '{}' -> '{}'",
                        source.name,
                        line.number,
                        line.text.trim(),
                        replacement
                    );
                    let last = span.last().copied().unwrap_or_default();
                    let ending = &last[last.trim_end_matches(['\n', '\r']).len()..];
                    output.push_str(replacement);
                    output.push_str(ending);
                    replaced += 1;
                }
                _ => span.iter().for_each(|l| output.push_str(l)),
            }
        }

        (output, replaced)
    }

    /// Apply the replacement to one requirements file
    pub fn replace_in_file(
        &self,
        path: &Path,
        source: &Source,
        target: &ReplaceTarget,
        replacement: &str,
    ) -> Result<FileReplacement, RewriteError> {
        let content = fs::read_to_string(path).map_err(|e| RewriteError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let (updated, replaced) = self.replace_in_content(&content, source, target, replacement);

        let mut result = FileReplacement {
            path: path.to_path_buf(),
            plugin: source.name.clone(),
            replaced,
            file_modified: false,
        };

        if replaced > 0 && !self.dry_run {
            fs::write(path, &updated).map_err(|e| RewriteError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
            result.file_modified = true;
        }

        Ok(result)
    }

    /// Replace `old` with `new` in every plugin's requirements.txt
    pub fn replace_all(
        &self,
        plugins_dir: &Path,
        old: &str,
        new: &str,
    ) -> Result<ReplaceSummary, AppError> {
        let target = ReplaceTarget::parse(old)?;
        let replacement = parse_cli_requirement(new)?;
        let replacement_text = new.trim();
        info!(
            "Replacing {} with {} in {}",
            old.trim(),
            replacement,
            plugins_dir.display()
        );

        let mut summary = ReplaceSummary {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for dir in plugin_dirs(plugins_dir)? {
            let path = dir.join(REQUIREMENTS_FILE);
            if !path.is_file() {
                continue;
            }
            let plugin = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = Source::new(plugin, &path);

            match self.replace_in_file(&path, &source, &target, replacement_text) {
                Ok(file) if file.replaced > 0 => summary.files.push(file),
                Ok(_) => {}
                Err(e) => {
                    warn!("{}", e);
                    summary.errors.push(e);
                }
            }
        }

        info!(
            "Replaced {} lines in {} files",
            summary.total_replacements(),
            summary.files_changed()
        );
        Ok(summary)
    }
}
