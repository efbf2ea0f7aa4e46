//! Per-package classification produced by the conflict detector

use super::{Source, Version};
use crate::constraint::ConstraintSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome for one package, declared in severity order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No version satisfies every source
    Conflict,
    /// Sources agree, but the installed version is outside their intersection
    Violation,
    /// Sources agree and the installed version (if known) satisfies them
    Ok,
    /// Installed, but no scanned source mentions it
    Unconstrained,
}

impl Classification {
    /// Returns true if this classification should be presented as a problem
    pub fn is_issue(&self) -> bool {
        matches!(self, Classification::Conflict | Classification::Violation)
    }

    /// Upper-case label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Conflict => "CONFLICT",
            Classification::Violation => "VIOLATION",
            Classification::Ok => "OK",
            Classification::Unconstrained => "UNCONSTRAINED",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One requirement line as it contributed to a package's constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub source: Source,
    /// Clause text as parsed, e.g. `>=1.0,<2.0`; empty when unconstrained
    pub clause: String,
    pub line_number: usize,
}

/// The first pair of sources found mutually unsatisfiable.
///
/// `first == second` when a single source contradicts itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub first: String,
    pub second: String,
}

/// Everything known about one package after detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStatus {
    /// Grouping key (normalized name, or `name[extras]` with strict extras)
    pub name: String,
    /// Intersection across every source
    pub aggregate: ConstraintSet,
    /// Each source's own intersection, keyed by source name
    pub per_source: BTreeMap<String, ConstraintSet>,
    /// Contributing lines, in source order then line order
    pub contributions: Vec<Contribution>,
    pub installed: Option<Version>,
    pub classification: Classification,
    pub conflict_pair: Option<ConflictPair>,
}

impl PackageStatus {
    /// Number of distinct sources that mention this package
    pub fn source_count(&self) -> usize {
        self.per_source.len()
    }

    /// Returns whether the named source's own constraints admit the installed version
    pub fn source_admits_installed(&self, source: &str) -> Option<bool> {
        let installed = self.installed.as_ref()?;
        self.per_source.get(source).map(|set| set.contains(installed))
    }
}
