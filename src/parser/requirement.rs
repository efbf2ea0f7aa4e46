//! Requirement line parser
//!
//! Handles lines like:
//! - Plain: `numpy`
//! - Clauses: `torch>=2.0, <3`, `opencv-python~=4.8`, `pillow!=10.0.*`
//! - Extras: `diffusers[torch]>=0.20`
//! - Parenthesized: `requests (>=2.28, <3)`
//! - Markers: `onnxruntime-gpu>=1.16; sys_platform != "darwin"`
//! - Direct references: `segment-anything @ git+https://github.com/facebookresearch/segment-anything`
//!
//! Malformed lines are rejected as a whole; no clause is ever partially accepted.

use crate::domain::{normalize_name, Clause, Operator, Requirement, Source, Version};
use crate::error::ParseError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?\s*(.*)$")
        .unwrap()
});
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").unwrap());
static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([<>=!~]*)\s*(.*)$").unwrap());

/// Returns true for pip option lines (`-r other.txt`, `--index-url ...`, `-e .`)
pub fn is_directive(line: &str) -> bool {
    line.trim_start().starts_with('-')
}

/// Remove a trailing `# comment`; `#` only starts a comment at line start or after whitespace
pub fn strip_comment(line: &str) -> &str {
    let mut previous_is_space = true;
    for (i, c) in line.char_indices() {
        if c == '#' && previous_is_space {
            return &line[..i];
        }
        previous_is_space = c.is_whitespace();
    }
    line
}

/// Parse one manifest line into a requirement.
///
/// Returns `Ok(None)` for blank lines, comments and pip directives.
pub fn parse_requirement(
    line: &str,
    source: &Source,
    line_number: usize,
) -> Result<Option<Requirement>, ParseError> {
    let text = strip_comment(line).trim();
    if text.is_empty() || is_directive(text) {
        return Ok(None);
    }

    let (body, marker) = match marker_start(text) {
        Some(index) => {
            let (body, marker) = (&text[..index], text[index + 1..].trim());
            if marker.is_empty() {
                return Err(ParseError::malformed_requirement(
                    text,
                    "empty environment marker after ';'",
                ));
            }
            (body.trim(), Some(marker.to_string()))
        }
        None => (text, None),
    };

    let caps = NAME_RE
        .captures(body)
        .ok_or_else(|| ParseError::malformed_requirement(text, "missing package name"))?;
    let display_name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let extras = parse_extras(caps.get(2).map(|m| m.as_str()), text)?;
    let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();

    let mut requirement = Requirement {
        name: normalize_name(display_name),
        display_name: display_name.to_string(),
        extras,
        clauses: Vec::new(),
        raw_specifier: String::new(),
        marker,
        url: None,
        source: source.clone(),
        line_number,
    };

    if let Some(url) = rest.strip_prefix('@') {
        let url = url.trim();
        if url.is_empty() {
            return Err(ParseError::malformed_requirement(
                text,
                "missing URL after '@'",
            ));
        }
        requirement.url = Some(url.to_string());
        return Ok(Some(requirement));
    }

    let specifier = unwrap_parentheses(rest, text)?;
    requirement.raw_specifier = specifier.to_string();
    requirement.clauses = parse_clauses(specifier, text)?;
    Ok(Some(requirement))
}

/// Byte offset of the `;` that starts the environment marker.
///
/// After a direct reference the `;` must follow whitespace, since URLs may
/// contain `;` themselves.
fn marker_start(text: &str) -> Option<usize> {
    let direct_reference = text.split(';').next().is_some_and(|head| head.contains('@'));
    text.match_indices(';')
        .map(|(index, _)| index)
        .find(|&index| !direct_reference || text[..index].ends_with(char::is_whitespace))
}

fn parse_extras(raw: Option<&str>, text: &str) -> Result<BTreeSet<String>, ParseError> {
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };
    if raw.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    raw.split(',')
        .map(|extra| {
            let extra = extra.trim();
            if IDENTIFIER_RE.is_match(extra) {
                Ok(normalize_name(extra))
            } else {
                Err(ParseError::malformed_requirement(
                    text,
                    format!("invalid extra '{}'", extra),
                ))
            }
        })
        .collect()
}

fn unwrap_parentheses<'a>(rest: &'a str, text: &str) -> Result<&'a str, ParseError> {
    match (rest.starts_with('('), rest.ends_with(')')) {
        (true, true) => Ok(rest[1..rest.len() - 1].trim()),
        (false, false) => Ok(rest),
        _ => Err(ParseError::malformed_requirement(
            text,
            "unbalanced parentheses",
        )),
    }
}

/// Parse a comma-separated clause list such as `>=1.0, <2.0`
pub fn parse_clauses(specifier: &str, text: &str) -> Result<Vec<Clause>, ParseError> {
    if specifier.trim().is_empty() {
        return Ok(Vec::new());
    }
    specifier
        .split(',')
        .map(|clause| parse_clause(clause.trim(), text))
        .collect()
}

fn parse_clause(clause: &str, text: &str) -> Result<Clause, ParseError> {
    if clause.is_empty() {
        return Err(ParseError::malformed_requirement(text, "empty clause"));
    }

    let caps = CLAUSE_RE
        .captures(clause)
        .ok_or_else(|| ParseError::malformed_requirement(text, "unreadable clause"))?;
    let symbol = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let operand = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    if symbol.is_empty() {
        return Err(ParseError::malformed_requirement(
            text,
            format!("expected a comparison operator before '{}'", operand),
        ));
    }
    let operator: Operator = symbol.parse().map_err(|_| {
        ParseError::malformed_requirement(text, format!("unknown operator '{}'", symbol))
    })?;
    if operand.is_empty() {
        return Err(ParseError::malformed_requirement(
            text,
            format!("missing version after '{}'", symbol),
        ));
    }

    if let Some(prefix) = operand.strip_suffix(".*") {
        if !operator.allows_wildcard() {
            return Err(ParseError::unknown_operator(
                symbol,
                text,
                "wildcard versions are only allowed with '==' and '!='",
            ));
        }
        let version = Version::parse(prefix)?;
        if version.is_prerelease() || version.post().is_some() || version.local().is_some() {
            return Err(ParseError::unknown_operator(
                symbol,
                text,
                "wildcard prefix must be a plain release",
            ));
        }
        return Ok(Clause::wildcard(operator, version));
    }

    let version = Version::parse(operand)?;
    if operator == Operator::Compatible && version.local().is_some() {
        return Err(ParseError::unknown_operator(
            symbol,
            text,
            "compatible release cannot use a local version",
        ));
    }
    Ok(Clause::new(operator, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        Source::new("ComfyUI-Manager", "custom_nodes/ComfyUI-Manager/requirements.txt")
    }

    fn parse(line: &str) -> Result<Option<Requirement>, ParseError> {
        parse_requirement(line, &source(), 7)
    }

    fn parse_ok(line: &str) -> Requirement {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_plain_name() {
        let req = parse_ok("numpy");
        assert_eq!(req.name, "numpy");
        assert!(req.clauses.is_empty());
        assert_eq!(req.line_number, 7);
        assert_eq!(req.source, source());
    }

    #[test]
    fn test_parse_clause_list() {
        let req = parse_ok("  Torch_Vision >= 0.15 , <1.0  ");
        assert_eq!(req.name, "torch-vision");
        assert_eq!(req.display_name, "Torch_Vision");
        assert_eq!(req.clauses.len(), 2);
        assert_eq!(req.clauses[0].operator, Operator::GreaterOrEqual);
        assert_eq!(req.clauses[1].operator, Operator::Less);
        assert_eq!(req.specifier(), ">=0.15,<1.0");
        assert_eq!(req.raw_specifier, ">= 0.15 , <1.0");
    }

    #[test]
    fn test_parse_extras_normalized_and_sorted() {
        let req = parse_ok("diffusers[Torch, flax]>=0.20");
        let extras: Vec<&str> = req.extras.iter().map(|e| e.as_str()).collect();
        assert_eq!(extras, vec!["flax", "torch"]);
    }

    #[test]
    fn test_parse_parenthesized() {
        let req = parse_ok("requests (>=2.28, <3)");
        assert_eq!(req.specifier(), ">=2.28,<3");
    }

    #[test]
    fn test_parse_marker_and_comment() {
        let req = parse_ok("onnxruntime-gpu>=1.16; sys_platform != \"darwin\"  # gpu only");
        assert_eq!(req.marker.as_deref(), Some("sys_platform != \"darwin\""));
        assert_eq!(req.clauses.len(), 1);
    }

    #[test]
    fn test_parse_url_requirement() {
        let req = parse_ok("segment-anything @ git+https://github.com/facebookresearch/segment-anything#egg=sam");
        assert!(req.clauses.is_empty());
        assert_eq!(
            req.url.as_deref(),
            Some("git+https://github.com/facebookresearch/segment-anything#egg=sam")
        );
    }

    #[test]
    fn test_parse_url_with_semicolon() {
        let req = parse_ok("pkg @ https://host/a;b");
        assert_eq!(req.url.as_deref(), Some("https://host/a;b"));
        assert_eq!(req.marker, None);

        let req = parse_ok("pkg @ https://host/a;b ; python_version >= \"3.10\"");
        assert_eq!(req.url.as_deref(), Some("https://host/a;b"));
        assert_eq!(req.marker.as_deref(), Some("python_version >= \"3.10\""));
    }

    #[test]
    fn test_parse_wildcard() {
        let req = parse_ok("pillow!=10.0.*");
        assert!(req.clauses[0].wildcard);
        assert_eq!(req.clauses[0].to_string(), "!=10.0.*");
    }

    #[test]
    fn test_blank_comment_and_directive_lines_yield_nothing() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("    ").unwrap(), None);
        assert_eq!(parse("# pinned for CUDA 12").unwrap(), None);
        assert_eq!(parse("-r base.txt").unwrap(), None);
        assert_eq!(parse("--extra-index-url https://download.pytorch.org/whl/cu121").unwrap(), None);
    }

    #[test]
    fn test_unknown_operator_is_malformed_requirement() {
        let err = parse("pkg>>1.0").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequirement { .. }));
        assert!(err.to_string().contains(">>"));
    }

    #[test]
    fn test_missing_operator_is_malformed_requirement() {
        let err = parse("pkg 1.0").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequirement { .. }));
    }

    #[test]
    fn test_malformed_version_operand() {
        let err = parse("pkg>=1.0,<two").unwrap_err();
        assert_eq!(err, ParseError::malformed_version("two"));
    }

    #[test]
    fn test_wildcard_with_compatible_is_unknown_operator() {
        let err = parse("pkg~=1.*").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { ref operator, .. } if operator == "~="));
        let err = parse("pkg>=1.*").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { .. }));
    }

    #[test]
    fn test_compatible_with_local_is_unknown_operator() {
        let err = parse("torch~=2.1+cu121").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { .. }));
    }

    #[test]
    fn test_compatible_with_single_segment() {
        let req = parse_ok("pkg~=3");
        assert_eq!(req.clauses.len(), 1);
        assert_eq!(req.clauses[0].operator, Operator::Compatible);
        assert_eq!(crate::constraint::to_set(&req).to_string(), "[3, 4)");
    }

    #[test]
    fn test_structural_errors() {
        for line in ["pkg>=1.0,", "pkg[bad extra]>=1", "pkg (>=1.0", "pkg @ ", "pkg>=1;", ">=1.0", "pkg=="] {
            let err = parse(line).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedRequirement { .. }),
                "{} should be a malformed requirement, got {:?}",
                line,
                err
            );
        }
    }

    #[test]
    fn test_strip_comment_keeps_url_fragments() {
        assert_eq!(strip_comment("pkg @ https://x/y#egg=pkg"), "pkg @ https://x/y#egg=pkg");
        assert_eq!(strip_comment("pkg>=1 # note"), "pkg>=1 ");
        assert_eq!(strip_comment("#"), "");
    }
}
