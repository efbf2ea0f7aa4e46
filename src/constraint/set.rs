//! Canonical sets of versions satisfying a conjunction of clauses

use super::interval::{cmp_lower, cmp_upper, Interval, Junction};
use crate::domain::{Clause, Operator, Version};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Bound;

/// Sorted, disjoint intervals plus the single versions removed from inside them.
///
/// Invariants kept by every constructor:
/// - intervals are non-empty, sorted and separated by more than one version
/// - every excluded point lies strictly inside one interval
///
/// Two sets holding the same versions therefore compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSet {
    intervals: Vec<Interval>,
    excluded: BTreeSet<Version>,
}

impl ConstraintSet {
    /// The set admitting every version
    pub fn universal() -> Self {
        Self {
            intervals: vec![Interval::universal()],
            excluded: BTreeSet::new(),
        }
    }

    /// The set admitting no version
    pub fn empty() -> Self {
        Self {
            intervals: Vec::new(),
            excluded: BTreeSet::new(),
        }
    }

    /// Build the canonical set covering the union of the given intervals
    pub fn from_intervals(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut pieces: Vec<Interval> = intervals.into_iter().filter(|i| !i.is_empty()).collect();
        pieces.sort_by(|a, b| {
            cmp_lower(a.lower(), b.lower()).then_with(|| cmp_upper(a.upper(), b.upper()))
        });

        let mut merged: Vec<Interval> = Vec::with_capacity(pieces.len());
        let mut excluded = BTreeSet::new();
        for piece in pieces {
            match merged.last_mut() {
                Some(current) => match current.junction(&piece) {
                    Junction::Connected => *current = current.hull(&piece),
                    Junction::PointGap(point) => {
                        *current = current.hull(&piece);
                        excluded.insert(point);
                    }
                    Junction::Disjoint => merged.push(piece),
                },
                None => merged.push(piece),
            }
        }

        Self {
            intervals: merged,
            excluded,
        }
    }

    /// Versions satisfying a single clause
    pub fn from_clause(clause: &Clause) -> Self {
        let version = clause.version.clone();
        match (clause.operator, clause.wildcard) {
            (Operator::Equal, true) => Self::from_intervals([prefix_range(&version)]),
            (Operator::NotEqual, true) => {
                let range = prefix_range(&version);
                Self::from_intervals([
                    Interval::new(Bound::Unbounded, flip(range.lower())),
                    Interval::new(flip(range.upper()), Bound::Unbounded),
                ])
            }
            (Operator::Equal, false) | (Operator::Arbitrary, _) => {
                Self::from_intervals([Interval::point(version)])
            }
            (Operator::NotEqual, false) => Self::from_intervals([
                Interval::less_than(version.clone()),
                Interval::greater_than(version),
            ]),
            (Operator::GreaterOrEqual, _) => Self::from_intervals([Interval::at_least(version)]),
            (Operator::Greater, _) => Self::from_intervals([Interval::greater_than(version)]),
            (Operator::LessOrEqual, _) => Self::from_intervals([Interval::at_most(version)]),
            (Operator::Less, _) => Self::from_intervals([Interval::less_than(version)]),
            (Operator::Compatible, _) => {
                let upper = version.next_incompatible();
                Self::from_intervals([Interval::half_open(version, upper)])
            }
        }
    }

    /// Versions satisfying every clause; no clauses means every version
    pub fn from_clauses(clauses: &[Clause]) -> Self {
        clauses
            .iter()
            .fold(Self::universal(), |acc, clause| {
                acc.intersect(&Self::from_clause(clause))
            })
    }

    /// Versions in both sets
    pub fn intersect(&self, other: &ConstraintSet) -> ConstraintSet {
        let left = self.split_intervals();
        let right = other.split_intervals();
        let overlaps = left
            .iter()
            .flat_map(|a| right.iter().filter_map(move |b| a.intersect(b)));
        Self::from_intervals(overlaps)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn is_universal(&self) -> bool {
        self.excluded.is_empty()
            && self.intervals.len() == 1
            && self.intervals[0].is_universal()
    }

    pub fn contains(&self, version: &Version) -> bool {
        !self.excluded.contains(version) && self.intervals.iter().any(|i| i.contains(version))
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn excluded(&self) -> &BTreeSet<Version> {
        &self.excluded
    }

    /// Render as a conjunction of clauses that parses back to this set.
    ///
    /// Returns `None` for the empty set and for sets made of several
    /// intervals, which no conjunction of plain clauses can describe.
    pub fn to_specifier(&self) -> Option<String> {
        if self.intervals.len() != 1 {
            return None;
        }
        let interval = &self.intervals[0];
        if let Some(point) = interval.as_point() {
            return Some(format!("=={}", point));
        }

        let mut clauses = Vec::new();
        match interval.lower() {
            Bound::Included(v) => clauses.push(format!(">={}", v)),
            Bound::Excluded(v) => clauses.push(format!(">{}", v)),
            Bound::Unbounded => {}
        }
        match interval.upper() {
            Bound::Included(v) => clauses.push(format!("<={}", v)),
            Bound::Excluded(v) => clauses.push(format!("<{}", v)),
            Bound::Unbounded => {}
        }
        clauses.extend(self.excluded.iter().map(|v| format!("!={}", v)));
        Some(clauses.join(","))
    }

    /// Pure interval form with excluded points cut out
    fn split_intervals(&self) -> Vec<Interval> {
        let mut result = Vec::with_capacity(self.intervals.len() + self.excluded.len());
        for interval in &self.intervals {
            let mut lower = interval.lower().clone();
            for point in self.excluded.iter().filter(|p| interval.contains_interior(p)) {
                result.push(Interval::new(lower, Bound::Excluded(point.clone())));
                lower = Bound::Excluded(point.clone());
            }
            result.push(Interval::new(lower, interval.upper().clone()));
        }
        result
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::universal()
    }
}

/// Versions matched by a `V.*` prefix: `[V.dev0, bump(V).dev0)`
fn prefix_range(prefix: &Version) -> Interval {
    let release = prefix.release().to_vec();
    let mut next = release.clone();
    if let Some(last) = next.last_mut() {
        *last = last.saturating_add(1);
    }
    Interval::half_open(
        Version::lowest_of_release(prefix.epoch(), release),
        Version::lowest_of_release(prefix.epoch(), next),
    )
}

/// The complementary bound at the same version
fn flip(bound: &Bound<Version>) -> Bound<Version> {
    match bound {
        Bound::Included(v) => Bound::Excluded(v.clone()),
        Bound::Excluded(v) => Bound::Included(v.clone()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        let parts: Vec<String> = self.intervals.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join(" ∪ "))?;
        if !self.excluded.is_empty() {
            let points: Vec<String> = self.excluded.iter().map(|v| v.to_string()).collect();
            write!(f, " \\ {{{}}}", points.join(", "))?;
        }
        Ok(())
    }
}
