//! Version intervals with inclusive, exclusive or unbounded ends

use crate::domain::Version;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// A contiguous range of versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    lower: Bound<Version>,
    upper: Bound<Version>,
}

/// How the upper end of one interval meets the lower end of the next
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Junction {
    /// The intervals share at least one version, or touch with the shared end included
    Connected,
    /// The intervals touch at a version that neither includes
    PointGap(Version),
    /// A real gap separates the intervals
    Disjoint,
}

impl Interval {
    /// Creates an interval from raw bounds
    pub fn new(lower: Bound<Version>, upper: Bound<Version>) -> Self {
        Self { lower, upper }
    }

    /// Every version
    pub fn universal() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// Exactly one version
    pub fn point(version: Version) -> Self {
        Self::new(Bound::Included(version.clone()), Bound::Included(version))
    }

    /// `[version, +∞)`
    pub fn at_least(version: Version) -> Self {
        Self::new(Bound::Included(version), Bound::Unbounded)
    }

    /// `(version, +∞)`
    pub fn greater_than(version: Version) -> Self {
        Self::new(Bound::Excluded(version), Bound::Unbounded)
    }

    /// `(-∞, version]`
    pub fn at_most(version: Version) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(version))
    }

    /// `(-∞, version)`
    pub fn less_than(version: Version) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(version))
    }

    /// `[lower, upper)`
    pub fn half_open(lower: Version, upper: Version) -> Self {
        Self::new(Bound::Included(lower), Bound::Excluded(upper))
    }

    pub fn lower(&self) -> &Bound<Version> {
        &self.lower
    }

    pub fn upper(&self) -> &Bound<Version> {
        &self.upper
    }

    /// Returns the version if this interval holds exactly one
    pub fn as_point(&self) -> Option<&Version> {
        match (&self.lower, &self.upper) {
            (Bound::Included(a), Bound::Included(b)) if a == b => Some(a),
            _ => None,
        }
    }

    /// Returns true if no version lies inside the bounds
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(a), Bound::Included(b)) => a > b,
            (Bound::Included(a), Bound::Excluded(b))
            | (Bound::Excluded(a), Bound::Included(b))
            | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(
            (&self.lower, &self.upper),
            (Bound::Unbounded, Bound::Unbounded)
        )
    }

    /// Returns true if the version lies inside the bounds
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(v) => version >= v,
            Bound::Excluded(v) => version > v,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(v) => version <= v,
            Bound::Excluded(v) => version < v,
        };
        above_lower && below_upper
    }

    /// Returns true if the version lies strictly between the bounds
    pub(crate) fn contains_interior(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(v) | Bound::Excluded(v) => version > v,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(v) | Bound::Excluded(v) => version < v,
        };
        above_lower && below_upper
    }

    /// Overlap of two intervals, or `None` when they share no version
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lower = match cmp_lower(&self.lower, &other.lower) {
            Ordering::Less => other.lower.clone(),
            _ => self.lower.clone(),
        };
        let upper = match cmp_upper(&self.upper, &other.upper) {
            Ordering::Greater => other.upper.clone(),
            _ => self.upper.clone(),
        };
        let result = Interval::new(lower, upper);
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Smallest interval covering both, assuming they are connected
    pub(crate) fn hull(&self, other: &Interval) -> Interval {
        let lower = match cmp_lower(&self.lower, &other.lower) {
            Ordering::Greater => other.lower.clone(),
            _ => self.lower.clone(),
        };
        let upper = match cmp_upper(&self.upper, &other.upper) {
            Ordering::Less => other.upper.clone(),
            _ => self.upper.clone(),
        };
        Interval::new(lower, upper)
    }

    /// Classify how `self` (earlier) meets `next` (later lower bound)
    pub(crate) fn junction(&self, next: &Interval) -> Junction {
        match (&self.upper, &next.lower) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => Junction::Connected,
            (upper, lower) => {
                let (u, u_inclusive) = bound_parts(upper);
                let (l, l_inclusive) = bound_parts(lower);
                match u.cmp(l) {
                    Ordering::Greater => Junction::Connected,
                    Ordering::Less => Junction::Disjoint,
                    Ordering::Equal if u_inclusive || l_inclusive => Junction::Connected,
                    Ordering::Equal => Junction::PointGap(u.clone()),
                }
            }
        }
    }
}

fn bound_parts(bound: &Bound<Version>) -> (&Version, bool) {
    match bound {
        Bound::Included(v) => (v, true),
        Bound::Excluded(v) => (v, false),
        Bound::Unbounded => unreachable!("unbounded ends are handled by the caller"),
    }
}

/// Order lower bounds from least to most restrictive
pub(crate) fn cmp_lower(a: &Bound<Version>, b: &Bound<Version>) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

/// Order upper bounds from most to least restrictive
pub(crate) fn cmp_upper(a: &Bound<Version>, b: &Bound<Version>) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Greater),
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Less),
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(point) = self.as_point() {
            return write!(f, "{{{}}}", point);
        }
        match &self.lower {
            Bound::Unbounded => write!(f, "(-∞")?,
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Bound::Unbounded => write!(f, "+∞)"),
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
        }
    }
}
