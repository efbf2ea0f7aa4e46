//! Requirement structures produced by the constraint parser

use super::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Comparison operator of a single constraint clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `~=` compatible release, sugar for `>=V, <next_incompatible(V)`
    Compatible,
    /// `===` arbitrary equality, admits exactly the given version
    Arbitrary,
}

impl Operator {
    /// Returns the operator symbol as written in manifests
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Compatible => "~=",
            Operator::Arbitrary => "===",
        }
    }

    /// Returns true if the operator accepts a trailing `.*` wildcard
    pub fn allows_wildcard(&self) -> bool {
        matches!(self, Operator::Equal | Operator::NotEqual)
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            ">=" => Ok(Operator::GreaterOrEqual),
            "<=" => Ok(Operator::LessOrEqual),
            ">" => Ok(Operator::Greater),
            "<" => Ok(Operator::Less),
            "~=" => Ok(Operator::Compatible),
            "===" => Ok(Operator::Arbitrary),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One `(operator, version)` pair; immutable once parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub operator: Operator,
    pub version: Version,
    /// Prefix match (`==1.4.*`); only valid with `==` and `!=`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub wildcard: bool,
}

impl Clause {
    /// Creates a new exact-operand clause
    pub fn new(operator: Operator, version: Version) -> Self {
        Self {
            operator,
            version,
            wildcard: false,
        }
    }

    /// Creates a new prefix-match clause
    pub fn wildcard(operator: Operator, version: Version) -> Self {
        Self {
            operator,
            version,
            wildcard: true,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

/// The manifest/plugin that produced a requirement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Plugin name (usually its directory name)
    pub name: String,
    /// Path of the manifest the requirement was read from
    pub origin: PathBuf,
}

impl Source {
    /// Creates a new Source
    pub fn new(name: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A parsed manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Package name, lowercased with separator runs collapsed to `-`
    pub name: String,
    /// Package name as written in the manifest
    pub display_name: String,
    /// Normalized extras, sorted
    pub extras: BTreeSet<String>,
    /// Clauses, conjoined
    pub clauses: Vec<Clause>,
    /// Clause text exactly as written, e.g. `>= 1.0, <2`
    pub raw_specifier: String,
    /// Environment marker after `;`, kept verbatim and not evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Direct reference after `@`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Where this requirement came from
    pub source: Source,
    /// 1-based line number within the manifest
    pub line_number: usize,
}

impl Requirement {
    /// Clause list as text, e.g. `>=1.0,<2.0`; empty when unconstrained
    pub fn specifier(&self) -> String {
        self.clauses
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Key this requirement is grouped under.
    ///
    /// With `strict_extras` a requirement with extras becomes its own virtual
    /// package `name[a,b]`; otherwise extras fold into the base package.
    pub fn package_key(&self, strict_extras: bool, case_sensitive: bool) -> String {
        let base = package_key(&self.display_name, case_sensitive);
        if strict_extras && !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(|e| e.as_str()).collect();
            format!("{}[{}]", base, extras.join(","))
        } else {
            base
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(|e| e.as_str()).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        write!(f, "{}", self.specifier())
    }
}

/// Collapse runs of `-`, `_` and `.` into a single `-`
pub fn normalize_separators(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c);
            in_separator = false;
        }
    }
    out
}

/// Normalize a package name for grouping: `Pillow_SIMD` → `pillow-simd`
pub fn normalize_name(name: &str) -> String {
    normalize_separators(name).to_lowercase()
}

/// Normalize a name honoring the case sensitivity setting
pub fn package_key(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        normalize_separators(name)
    } else {
        normalize_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_requirement(extras: &[&str]) -> Requirement {
        Requirement {
            name: "opencv-python".to_string(),
            display_name: "OpenCV_Python".to_string(),
            extras: extras.iter().map(|e| e.to_string()).collect(),
            clauses: vec![
                Clause::new(Operator::GreaterOrEqual, Version::parse("4.0").unwrap()),
                Clause::new(Operator::Less, Version::parse("5").unwrap()),
            ],
            raw_specifier: ">= 4.0, <5".to_string(),
            marker: None,
            url: None,
            source: Source::new("ComfyUI-Impact-Pack", "custom_nodes/ComfyUI-Impact-Pack/requirements.txt"),
            line_number: 3,
        }
    }

    #[test]
    fn test_operator_roundtrip_symbols() {
        for op in [
            Operator::Equal,
            Operator::NotEqual,
            Operator::GreaterOrEqual,
            Operator::LessOrEqual,
            Operator::Greater,
            Operator::Less,
            Operator::Compatible,
            Operator::Arbitrary,
        ] {
            assert_eq!(op.symbol().parse::<Operator>(), Ok(op));
        }
        assert!(">>".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_allows_wildcard() {
        assert!(Operator::Equal.allows_wildcard());
        assert!(Operator::NotEqual.allows_wildcard());
        assert!(!Operator::Compatible.allows_wildcard());
        assert!(!Operator::GreaterOrEqual.allows_wildcard());
    }

    #[test]
    fn test_clause_display() {
        let clause = Clause::wildcard(Operator::Equal, Version::parse("1.4").unwrap());
        assert_eq!(clause.to_string(), "==1.4.*");
        let clause = Clause::new(Operator::Compatible, Version::parse("1.4").unwrap());
        assert_eq!(clause.to_string(), "~=1.4");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Pillow_SIMD"), "pillow-simd");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a__-.b"), "a-b");
        assert_eq!(package_key("Pillow_SIMD", true), "Pillow-SIMD");
    }

    #[test]
    fn test_requirement_specifier_and_display() {
        let req = sample_requirement(&[]);
        assert_eq!(req.specifier(), ">=4.0,<5");
        assert_eq!(req.to_string(), "opencv-python>=4.0,<5");
    }

    #[test]
    fn test_package_key_extras() {
        let req = sample_requirement(&["contrib", "headless"]);
        assert_eq!(req.package_key(false, false), "opencv-python");
        assert_eq!(req.package_key(true, false), "opencv-python[contrib,headless]");
        assert_eq!(req.package_key(false, true), "OpenCV-Python");
    }

    #[test]
    fn test_source_ordering_by_name() {
        let a = Source::new("alpha", "z/requirements.txt");
        let b = Source::new("beta", "a/requirements.txt");
        assert!(a < b);
    }

    #[test]
    fn test_serde_requirement() {
        let req = sample_requirement(&["contrib"]);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: Requirement = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }
}
