//! Engine configuration
//!
//! The core only ever sees an [`EngineConfig`] value. The optional
//! `depclash.toml` file and CLI flags are merged into one before the run.

use crate::domain::normalize_name;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the plugins directory
pub const CONFIG_FILE_NAME: &str = "depclash.toml";

/// Options recognized by the conflict detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Treat `pkg[extra]` as a package distinct from `pkg`
    pub strict_extras: bool,
    /// Keep the case of package names when grouping
    pub case_sensitive_names: bool,
    /// Packages dropped before detection
    pub ignore: Vec<String>,
}

impl EngineConfig {
    /// Enable or disable strict extras handling
    pub fn with_strict_extras(mut self, strict: bool) -> Self {
        self.strict_extras = strict;
        self
    }

    /// Enable or disable case-sensitive names
    pub fn with_case_sensitive_names(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_names = case_sensitive;
        self
    }

    /// Add packages to the ignore list
    pub fn with_ignore<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Returns true if the package (by its normalized name) is ignored
    pub fn is_ignored(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.ignore.iter().any(|i| normalize_name(i) == name)
    }
}

/// Contents of a `depclash.toml` file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub strict_extras: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub ignore: Vec<String>,
    /// Installed-package snapshot file, relative to the config file
    pub installed: Option<PathBuf>,
    /// Interpreter to query for installed packages
    pub python: Option<PathBuf>,
}

impl FileConfig {
    /// Parse config file contents
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: FileConfig =
            toml::from_str(content).map_err(|e: toml::de::Error| ConfigError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if config.installed.is_some() && config.python.is_some() {
            return Err(ConfigError::ConflictingOptions {
                message: format!(
                    "{} sets both 'installed' and 'python'",
                    path.display()
                ),
            });
        }

        if let (Some(installed), Some(dir)) = (config.installed.as_mut(), path.parent()) {
            if installed.is_relative() {
                *installed = dir.join(&*installed);
            }
        }
        Ok(config)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Load an explicit config file, or `depclash.toml` from the plugins directory if present
    pub fn discover(explicit: Option<&Path>, plugins_dir: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = plugins_dir.join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Build the engine configuration; `true` CLI flags win over file values
    pub fn to_engine_config(
        &self,
        strict_extras: bool,
        case_sensitive: bool,
        ignore: &[String],
    ) -> EngineConfig {
        EngineConfig::default()
            .with_strict_extras(strict_extras || self.strict_extras.unwrap_or(false))
            .with_case_sensitive_names(case_sensitive || self.case_sensitive.unwrap_or(false))
            .with_ignore(self.ignore.iter().cloned())
            .with_ignore(ignore.iter().cloned())
    }
}
