//! pyproject.toml dependency extraction
//!
//! Handles:
//! - project.dependencies (PEP 621)
//! - project.optional-dependencies (PEP 621), every group
//!
//! Each returned string is one requirement line; its position in the returned
//! list (1-based) serves as the line number in diagnostics. Entries that are
//! not strings are kept as `<type value>` lines so they are reported as
//! malformed instead of vanishing.

use crate::error::ScanError;
use std::path::Path;
use toml::{Table, Value};

/// Collect requirement strings declared in a pyproject.toml
pub fn extract_dependencies(content: &str, path: &Path) -> Result<Vec<String>, ScanError> {
    let document: Table = toml::from_str(content)
        .map_err(|e: toml::de::Error| ScanError::toml_parse(path, e.to_string()))?;

    let Some(project) = document.get("project") else {
        return Ok(Vec::new());
    };

    let mut dependencies = Vec::new();

    if let Some(deps) = project.get("dependencies") {
        push_entries(&mut dependencies, deps);
    }

    if let Some(optional) = project
        .get("optional-dependencies")
        .and_then(|d| d.as_table())
    {
        for deps in optional.values() {
            push_entries(&mut dependencies, deps);
        }
    }

    Ok(dependencies)
}

fn push_entries(dependencies: &mut Vec<String>, value: &Value) {
    match value {
        Value::Array(entries) => dependencies.extend(entries.iter().map(entry_line)),
        other => dependencies.push(entry_line(other)),
    }
}

fn entry_line(entry: &Value) -> String {
    match entry.as_str() {
        Some(text) => text.to_string(),
        None => format!("<{} {}>", entry.type_str(), entry),
    }
}
