//! Core domain models for depclash
//!
//! This module contains the fundamental types used throughout the application:
//! - Version model with pre-release, post/dev and local tag semantics
//! - Operators, clauses, sources and parsed requirements
//! - Per-package classification results

mod requirement;
mod status;
mod version;

pub use requirement::{
    normalize_name, normalize_separators, package_key, Clause, Operator, Requirement, Source,
};
pub use status::{Classification, ConflictPair, Contribution, PackageStatus};
pub use version::{PreRelease, PreReleaseKind, Version};
