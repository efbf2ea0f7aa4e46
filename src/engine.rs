//! Analysis pipeline
//!
//! manifests + snapshot + config → report and diagnostics. No filesystem or
//! process access happens here; inputs arrive already loaded.

use crate::config::EngineConfig;
use crate::detector::detect;
use crate::domain::PackageStatus;
use crate::parser::{parse_manifests, Diagnostic, ManifestInput};
use crate::report::{build, Report};
use crate::snapshot::EnvironmentSnapshot;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything produced by one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub report: Report,
    /// One entry per malformed manifest line, in manifest order
    pub diagnostics: Vec<Diagnostic>,
    pub statuses: BTreeMap<String, PackageStatus>,
}

impl Analysis {
    /// Returns true if any manifest line could not be parsed
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse every manifest, detect conflicts and build the report
pub fn analyze(
    manifests: &[ManifestInput],
    snapshot: &EnvironmentSnapshot,
    config: &EngineConfig,
) -> Analysis {
    let parsed = parse_manifests(manifests);
    debug!(
        "Parsed {} requirements from {} manifests ({} diagnostics)",
        parsed.requirements.len(),
        manifests.len(),
        parsed.diagnostics.len()
    );

    let statuses = detect(&parsed.requirements, snapshot, config);
    let report = build(&statuses);
    debug!(
        "Classified {} packages: {} conflicts, {} violations",
        report.counts.total(),
        report.counts.conflicts,
        report.counts.violations
    );

    Analysis {
        report,
        diagnostics: parsed.diagnostics,
        statuses,
    }
}
