//! Version model for Python-style package versions
//!
//! Handles version strings like:
//! - Release: `1`, `1.2`, `1.2.3.4`, `v2.0`
//! - Epoch: `1!2.0`
//! - Pre-release: `1.0a1`, `1.0b2`, `1.0rc1`, `1.0-alpha.3`
//! - Post/dev: `1.0.post1`, `1.0-1`, `1.0.dev3`
//! - Local: `2.1.0+cu121`
//!
//! Ordering pads release segments with zeros (`1.0 == 1.0.0`), places
//! pre-releases before the final release, and ignores local tags.

use crate::error::ParseError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>\d+)?)?
        (?:-(?P<post_n1>\d+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>\d+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>\d+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .unwrap()
});

/// The kind of a pre-release tag, in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreReleaseKind {
    /// `a`, `alpha`
    Alpha,
    /// `b`, `beta`
    Beta,
    /// `rc`, `c`, `pre`, `preview`
    Rc,
}

impl PreReleaseKind {
    /// Normalized spelling used when displaying a version
    pub fn tag(&self) -> &'static str {
        match self {
            PreReleaseKind::Alpha => "a",
            PreReleaseKind::Beta => "b",
            PreReleaseKind::Rc => "rc",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Some(PreReleaseKind::Alpha),
            "b" | "beta" => Some(PreReleaseKind::Beta),
            "rc" | "c" | "pre" | "preview" => Some(PreReleaseKind::Rc),
            _ => None,
        }
    }
}

/// A pre-release tag: kind plus number (`rc2`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PreRelease {
    pub kind: PreReleaseKind,
    pub number: u64,
}

/// A parsed package version.
///
/// Equality and ordering follow the comparison rules only, so `1.0`,
/// `1.0.0` and `1.0+local` are all equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

impl Version {
    /// Parse a version string, rejecting anything outside the grammar
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| ParseError::malformed_version(trimmed))?;

        let number = |s: &str| -> Result<u64, ParseError> {
            s.parse::<u64>()
                .map_err(|_| ParseError::malformed_version(trimmed))
        };
        let optional_number = |m: Option<regex::Match<'_>>| -> Result<u64, ParseError> {
            m.map(|m| number(m.as_str())).transpose().map(|n| n.unwrap_or(0))
        };

        let epoch = optional_number(caps.name("epoch"))?;

        let release = caps
            .name("release")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split('.')
            .map(|segment| number(segment))
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let kind = PreReleaseKind::from_label(label.as_str())
                    .ok_or_else(|| ParseError::malformed_version(trimmed))?;
                Some(PreRelease {
                    kind,
                    number: optional_number(caps.name("pre_n"))?,
                })
            }
            None => None,
        };

        let post = if let Some(n) = caps.name("post_n1") {
            Some(number(n.as_str())?)
        } else if caps.name("post_l").is_some() {
            Some(optional_number(caps.name("post_n2"))?)
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(optional_number(caps.name("dev_n"))?)
        } else {
            None
        };

        let local = caps.name("local").map(|m| m.as_str().to_ascii_lowercase());

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Create a final release from its segments
    pub fn from_release(release: Vec<u64>) -> Self {
        let release = if release.is_empty() { vec![0] } else { release };
        Self {
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// The lowest version carrying exactly this epoch and release (`X.dev0`)
    pub(crate) fn lowest_of_release(epoch: u64, release: Vec<u64>) -> Self {
        let mut version = Self::from_release(release);
        version.epoch = epoch;
        version.dev = Some(0);
        version
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Returns true for pre-releases and development releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Exclusive upper bound of the compatible-release range starting at this version.
    ///
    /// Drops the last release segment, increments the new last one and pads
    /// with zeros back to the original length: `1.4` → `2.0`, `1.4.2` → `1.5.0`.
    /// A single-segment version increments that segment: `3` → `4`.
    pub fn next_incompatible(&self) -> Version {
        let len = self.release.len();
        let keep = if len > 1 { len - 1 } else { 1 };
        let mut release: Vec<u64> = self.release[..keep].to_vec();
        if let Some(last) = release.last_mut() {
            *last = last.saturating_add(1);
        }
        release.resize(len, 0);

        let mut next = Self::from_release(release);
        next.epoch = self.epoch;
        next
    }

    /// Total ordering comparison
    pub fn compare(&self, other: &Version) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
    }

    /// Phase rank: dev-only releases sort before every pre-release,
    /// which sort before the final release.
    fn pre_key(&self) -> (u8, u64) {
        match (self.pre, self.post, self.dev) {
            (Some(pre), _, _) => (1 + pre.kind as u8, pre.number),
            (None, None, Some(_)) => (0, 0),
            _ => (u8::MAX, 0),
        }
    }

    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }

    fn significant_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&segment| segment != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.significant_release().hash(state);
        self.pre_key().hash(state);
        self.post.hash(state);
        self.dev_key().hash(state);
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some(pre) = self.pre {
            write!(f, "{}{}", pre.kind.tag(), pre.number)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{}", dev)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}
