//! Environment snapshot: installed package → version
//!
//! Supplied to the detector as a plain value. It can be built from:
//! - `pip freeze` output (`name==version` lines)
//! - `pip list --format=json` output, or a `{"name": "version"}` object
//! - a live `<python> -m pip list --format=json` query through a [`CommandRunner`]

use crate::domain::{normalize_name, normalize_separators, Version};
use crate::error::SnapshotError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// One installed distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Name as reported by the environment
    pub name: String,
    pub version: Version,
}

/// Installed packages keyed by normalized name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    packages: BTreeMap<String, InstalledPackage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    List(Vec<PackageEntry>),
    Map(BTreeMap<String, String>),
}

#[derive(Deserialize)]
struct PackageEntry {
    name: String,
    version: String,
}

impl EnvironmentSnapshot {
    /// Creates an empty snapshot (nothing known to be installed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an installed package, replacing any previous entry with the same name
    pub fn insert(&mut self, name: impl Into<String>, version: Version) {
        let name = name.into();
        self.packages
            .insert(normalize_name(&name), InstalledPackage { name, version });
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, version: Version) -> Self {
        self.insert(name, version);
        self
    }

    fn insert_raw(&mut self, name: &str, version: &str) {
        match Version::parse(version) {
            Ok(version) => self.insert(name.trim(), version),
            Err(e) => warn!("Skipping installed package '{}': {}", name.trim(), e),
        }
    }

    /// Parse `pip freeze` output
    pub fn from_freeze(text: &str) -> Self {
        let mut snapshot = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                continue;
            }
            let pinned = line
                .split_once("===")
                .or_else(|| line.split_once("=="));
            match pinned {
                Some((name, version)) => snapshot.insert_raw(name, version),
                None => debug!("Ignoring unpinned freeze line '{}'", line),
            }
        }
        snapshot
    }

    /// Parse a JSON list of `{"name", "version"}` objects or a name → version map
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let document: SnapshotDocument =
            serde_json::from_str(text).map_err(|e| SnapshotError::InvalidJson {
                message: e.to_string(),
            })?;

        let mut snapshot = Self::new();
        match document {
            SnapshotDocument::List(entries) => {
                for entry in entries {
                    snapshot.insert_raw(&entry.name, &entry.version);
                }
            }
            SnapshotDocument::Map(entries) => {
                for (name, version) in entries {
                    snapshot.insert_raw(&name, &version);
                }
            }
        }
        Ok(snapshot)
    }

    /// Parse snapshot file content, choosing JSON or freeze format by its first character
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        match text.trim_start().chars().next() {
            Some('[') | Some('{') => Self::from_json(text),
            _ => Ok(Self::from_freeze(text)),
        }
    }

    /// Read a snapshot file
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path).map_err(|e| SnapshotError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot = Self::parse(&content)?;
        debug!(
            "Loaded {} installed packages from {}",
            snapshot.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Installed version of a package.
    ///
    /// With `case_sensitive` the name must also match the reported name's case.
    pub fn installed(&self, name: &str, case_sensitive: bool) -> Option<&Version> {
        let package = self.packages.get(&normalize_name(name))?;
        if case_sensitive && normalize_separators(&package.name) != normalize_separators(name) {
            return None;
        }
        Some(&package.version)
    }

    /// Iterate over installed packages in normalized-name order
    pub fn iter(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Captured output of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for running external commands
pub trait CommandRunner {
    /// Run a program with arguments and capture its output
    fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// Default runner that spawns real processes
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

const PIP_LIST_ARGS: [&str; 4] = ["-m", "pip", "list", "--format=json"];

/// Query an interpreter for its installed packages
pub fn capture_installed(
    runner: &dyn CommandRunner,
    python: &Path,
) -> Result<EnvironmentSnapshot, SnapshotError> {
    let command = format!("{} {}", python.display(), PIP_LIST_ARGS.join(" "));
    debug!("Running {}", command);

    let output = runner
        .run(python, &PIP_LIST_ARGS)
        .map_err(|e| SnapshotError::command_failed(&command, e.to_string()))?;

    if !output.success {
        return Err(SnapshotError::command_failed(
            &command,
            output.stderr.trim().to_string(),
        ));
    }

    EnvironmentSnapshot::from_json(&output.stdout)
}
