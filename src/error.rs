//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ParseError: a single manifest line or version token could not be understood
//! - ScanError: plugin directory or manifest file could not be read
//! - SnapshotError: the installed-package snapshot could not be obtained
//! - ConfigError: configuration file or option problems
//! - RewriteError: dependency replacement failed

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Plugin directory scanning errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Dependency replacement errors
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Errors produced while parsing version tokens and requirement lines.
///
/// These never abort a run: the manifest parser wraps each one in a
/// [`Diagnostic`](crate::parser::Diagnostic) carrying the source and line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Version token that does not follow the version grammar
    #[error("malformed version '{text}'")]
    MalformedVersion { text: String },

    /// Requirement line whose syntax could not be parsed
    #[error("malformed requirement '{text}': {message}")]
    MalformedRequirement { text: String, message: String },

    /// Known operator used in a context it does not support
    #[error("operator '{operator}' cannot be used in '{text}': {message}")]
    UnknownOperator {
        operator: String,
        text: String,
        message: String,
    },
}

/// Errors related to scanning plugin directories
#[derive(Error, Debug)]
pub enum ScanError {
    /// Plugins directory not found
    #[error("plugins directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to list a directory
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error (for pyproject.toml)
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParse { path: PathBuf, message: String },
}

/// Errors related to obtaining the installed-package snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Failed to read a snapshot file
    #[error("failed to read snapshot file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot JSON could not be decoded
    #[error("invalid snapshot JSON: {message}")]
    InvalidJson { message: String },

    /// The interpreter command could not be run or failed
    #[error("failed to query installed packages with '{command}': {message}")]
    CommandFailed { command: String, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to dependency replacement
#[derive(Error, Debug)]
pub enum RewriteError {
    /// The dependency to look for could not be parsed
    #[error("invalid dependency '{text}': {source}")]
    InvalidDependency {
        text: String,
        #[source]
        source: ParseError,
    },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Creates a new MalformedVersion error
    pub fn malformed_version(text: impl Into<String>) -> Self {
        ParseError::MalformedVersion { text: text.into() }
    }

    /// Creates a new MalformedRequirement error
    pub fn malformed_requirement(text: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::MalformedRequirement {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnknownOperator error
    pub fn unknown_operator(
        operator: impl Into<String>,
        text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ParseError::UnknownOperator {
            operator: operator.into(),
            text: text.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case name of the error kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedVersion { .. } => "malformed_version",
            ParseError::MalformedRequirement { .. } => "malformed_requirement",
            ParseError::UnknownOperator { .. } => "unknown_operator",
        }
    }
}

impl ScanError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        ScanError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new ReadManifest error
    pub fn read_manifest(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::ReadManifest {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParse error
    pub fn toml_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ScanError::TomlParse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl SnapshotError {
    /// Creates a new CommandFailed error
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        SnapshotError::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}
