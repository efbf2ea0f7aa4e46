//! Constraint set algebra
//!
//! Converts requirement clauses into canonical interval sets and provides the
//! operations the conflict detector folds with:
//! - `to_set`: clauses of one requirement → ConstraintSet
//! - `intersect`: associative, commutative, idempotent; universal set is the identity
//! - `is_empty` / `contains`

mod interval;
mod set;

pub use interval::Interval;
pub use set::ConstraintSet;

use crate::domain::{Requirement, Version};

/// Versions satisfying every clause of a requirement
pub fn to_set(requirement: &Requirement) -> ConstraintSet {
    ConstraintSet::from_clauses(&requirement.clauses)
}

/// Versions satisfying both sets
pub fn intersect(a: &ConstraintSet, b: &ConstraintSet) -> ConstraintSet {
    a.intersect(b)
}

/// Returns true if no version satisfies the set
pub fn is_empty(set: &ConstraintSet) -> bool {
    set.is_empty()
}

/// Returns true if the version satisfies the set
pub fn contains(set: &ConstraintSet, version: &Version) -> bool {
    set.contains(version)
}
