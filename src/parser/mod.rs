//! Constraint parser for plugin manifests
//!
//! This module turns manifest text into typed requirements:
//! - `requirement`: one line → Requirement (name, extras, clauses, marker, url)
//! - `manifest`: all lines of a source → requirements + diagnostics
//! - `pyproject`: requirement strings from pyproject.toml

mod manifest;
mod pyproject;
mod requirement;

pub(crate) use manifest::{logical_lines, LogicalLine};
pub use manifest::{parse_manifest, parse_manifests, Diagnostic, ManifestInput, ParsedManifest};
pub use pyproject::extract_dependencies;
pub use requirement::{is_directive, parse_clauses, parse_requirement, strip_comment};
