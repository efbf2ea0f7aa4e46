//! Report builder
//!
//! Turns detector output into an ordered, serializable report. Entries are
//! sorted by severity (CONFLICT, VIOLATION, OK, UNCONSTRAINED), then by name.

use crate::domain::{Classification, ConflictPair, PackageStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One source line that contributed to a package's constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContribution {
    /// Source (plugin) name
    pub source: String,
    /// Manifest path
    pub origin: PathBuf,
    /// Raw clause text
    pub clause: String,
    pub line: usize,
    /// Whether this source's own constraints admit the installed version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admits_installed: Option<bool>,
}

/// Report record for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub package: String,
    pub classification: Classification,
    /// Aggregated range in interval notation, e.g. `[1.5, 2.0)`
    pub range: String,
    /// Aggregated range as a requirement specifier, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_pair: Option<ConflictPair>,
    /// Contributing lines; only filled for CONFLICT and VIOLATION
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<ReportContribution>,
}

impl ReportEntry {
    fn from_status(status: &PackageStatus) -> Self {
        let contributions = if status.classification.is_issue() {
            status
                .contributions
                .iter()
                .map(|c| ReportContribution {
                    source: c.source.name.clone(),
                    origin: c.source.origin.clone(),
                    clause: c.clause.clone(),
                    line: c.line_number,
                    admits_installed: status.source_admits_installed(&c.source.name),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            package: status.name.clone(),
            classification: status.classification,
            range: status.aggregate.to_string(),
            specifier: status.aggregate.to_specifier(),
            installed: status.installed.as_ref().map(|v| v.to_string()),
            conflict_pair: status.conflict_pair.clone(),
            contributions,
        }
    }

    /// Returns true for CONFLICT and VIOLATION entries
    pub fn is_issue(&self) -> bool {
        self.classification.is_issue()
    }
}

/// Number of entries per classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub conflicts: usize,
    pub violations: usize,
    pub ok: usize,
    pub unconstrained: usize,
}

impl ReportCounts {
    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Conflict => self.conflicts += 1,
            Classification::Violation => self.violations += 1,
            Classification::Ok => self.ok += 1,
            Classification::Unconstrained => self.unconstrained += 1,
        }
    }

    /// Total number of packages
    pub fn total(&self) -> usize {
        self.conflicts + self.violations + self.ok + self.unconstrained
    }
}

/// Ordered per-package report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub counts: ReportCounts,
    /// True iff any entry is a CONFLICT
    pub has_blocking_conflict: bool,
}

impl Report {
    /// Entries classified as CONFLICT or VIOLATION
    pub fn issues(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.is_issue())
    }

    /// Returns true if there are neither conflicts nor violations
    pub fn is_clean(&self) -> bool {
        self.counts.conflicts == 0 && self.counts.violations == 0
    }

    /// Look up an entry by package key
    pub fn entry(&self, package: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.package == package)
    }
}

/// Build a report from detector output; never mutates the statuses
pub fn build(statuses: &BTreeMap<String, PackageStatus>) -> Report {
    let mut entries: Vec<ReportEntry> = statuses.values().map(ReportEntry::from_status).collect();
    entries.sort_by(|a, b| {
        a.classification
            .cmp(&b.classification)
            .then_with(|| a.package.cmp(&b.package))
    });

    let mut counts = ReportCounts::default();
    for entry in &entries {
        counts.record(entry.classification);
    }

    Report {
        has_blocking_conflict: counts.conflicts > 0,
        entries,
        counts,
    }
}
