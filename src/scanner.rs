//! Plugin directory scanner
//!
//! Every immediate subdirectory of the plugins directory is one source. Its
//! manifest is `requirements.txt`, or `pyproject.toml` when no
//! requirements.txt exists.

use crate::domain::Source;
use crate::error::ScanError;
use crate::parser::{extract_dependencies, ManifestInput};
use crate::progress::Progress;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Requirements file name
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
/// pyproject file name
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Outcome of scanning a plugins directory
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Manifests found, in plugin-name order
    pub manifests: Vec<ManifestInput>,
    /// Number of plugin directories visited
    pub plugin_count: usize,
    /// Manifests that could not be read; scanning continued past them
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    /// Number of manifests successfully loaded
    pub fn manifest_count(&self) -> usize {
        self.manifests.len()
    }
}

/// List plugin directories, sorted by name; hidden and cache directories are skipped
pub fn plugin_dirs(plugins_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !plugins_dir.is_dir() {
        return Err(ScanError::directory_not_found(plugins_dir));
    }

    let entries = fs::read_dir(plugins_dir).map_err(|e| ScanError::ReadDir {
        path: plugins_dir.to_path_buf(),
        source: e,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| !name.starts_with('.') && name != "__pycache__")
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn plugin_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_manifest(path: &Path) -> Result<String, ScanError> {
    fs::read_to_string(path).map_err(|e| ScanError::read_manifest(path, e))
}

/// Load the manifest of one plugin directory, if it has one
pub fn load_plugin(dir: &Path) -> Result<Option<ManifestInput>, ScanError> {
    let name = plugin_name(dir);

    let requirements = dir.join(REQUIREMENTS_FILE);
    if requirements.is_file() {
        let content = read_manifest(&requirements)?;
        return Ok(Some(ManifestInput::from_content(
            Source::new(name, requirements),
            &content,
        )));
    }

    let pyproject = dir.join(PYPROJECT_FILE);
    if pyproject.is_file() {
        let content = read_manifest(&pyproject)?;
        let dependencies = extract_dependencies(&content, &pyproject)?;
        return Ok(Some(ManifestInput::new(
            Source::new(name, pyproject),
            dependencies,
        )));
    }

    Ok(None)
}

/// Scan a plugins directory for manifests
pub fn scan_plugins(plugins_dir: &Path, progress: &mut Progress) -> Result<ScanResult, ScanError> {
    info!("Scanning plugins directory {}", plugins_dir.display());
    let dirs = plugin_dirs(plugins_dir)?;

    let mut result = ScanResult {
        plugin_count: dirs.len(),
        ..Default::default()
    };

    progress.begin_scan(dirs.len());
    for dir in &dirs {
        progress.reading(&plugin_name(dir));
        match load_plugin(dir) {
            Ok(Some(manifest)) => {
                debug!(
                    "Loaded {} lines from {}",
                    manifest.lines.len(),
                    manifest.source.origin.display()
                );
                result.manifests.push(manifest);
            }
            Ok(None) => debug!("No manifest in {}, skipping", dir.display()),
            Err(e) => {
                warn!("{}", e);
                result.errors.push(e);
            }
        }
        progress.done();
    }
    progress.clear();

    if result.plugin_count == 0 {
        warn!("No plugin directories found in {}", plugins_dir.display());
    } else if result.manifests.is_empty() {
        warn!(
            "Found {} plugin directories but no manifests",
            result.plugin_count
        );
    } else {
        info!(
            "Scanned {} plugin directories, found {} manifests",
            result.plugin_count,
            result.manifest_count()
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plugin(root: &TempDir, name: &str, file: &str, content: &str) {
        let dir = root.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = scan_plugins(Path::new("/nonexistent/custom_nodes"), &mut Progress::disabled())
            .unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_scan_sorted_sources_and_manifest_choice() {
        let root = TempDir::new().unwrap();
        plugin(&root, "zeta", REQUIREMENTS_FILE, "numpy\n");
        plugin(&root, "alpha", PYPROJECT_FILE, "[project]\ndependencies = [\"torch>=2\"]\n");
        plugin(&root, "both", REQUIREMENTS_FILE, "scipy\n");
        plugin(&root, "both", PYPROJECT_FILE, "[project]\ndependencies = [\"ignored\"]\n");
        fs::create_dir(root.path().join("empty")).unwrap();
        fs::create_dir(root.path().join(".git")).unwrap();
        fs::write(root.path().join("README.md"), "not a plugin").unwrap();

        let result = scan_plugins(root.path(), &mut Progress::disabled()).unwrap();
        assert_eq!(result.plugin_count, 4);
        assert_eq!(result.manifest_count(), 3);
        assert!(result.errors.is_empty());

        let names: Vec<&str> = result
            .manifests
            .iter()
            .map(|m| m.source.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "both", "zeta"]);
        assert_eq!(result.manifests[0].lines, vec!["torch>=2"]);
        assert_eq!(result.manifests[1].lines, vec!["scipy"]);
        assert!(result.manifests[1].source.origin.ends_with("both/requirements.txt"));
    }

    #[test]
    fn test_scan_collects_errors_and_continues() {
        let root = TempDir::new().unwrap();
        plugin(&root, "broken", PYPROJECT_FILE, "[project\n");
        plugin(&root, "fine", REQUIREMENTS_FILE, "numpy\n");

        let result = scan_plugins(root.path(), &mut Progress::disabled()).unwrap();
        assert_eq!(result.manifest_count(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], ScanError::TomlParse { .. }));
    }

    #[test]
    fn test_load_plugin_without_manifest() {
        let root = TempDir::new().unwrap();
        assert!(load_plugin(root.path()).unwrap().is_none());
    }
}
