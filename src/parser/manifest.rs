//! Manifest parsing: raw lines of one source → requirements + diagnostics

use super::requirement::{is_directive, parse_requirement, strip_comment};
use crate::domain::{Requirement, Source};
use crate::error::ParseError;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Raw manifest content as supplied by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInput {
    pub source: Source,
    pub lines: Vec<String>,
}

impl ManifestInput {
    /// Creates a new ManifestInput
    pub fn new(source: Source, lines: Vec<String>) -> Self {
        Self { source, lines }
    }

    /// Creates a ManifestInput by splitting file content into lines
    pub fn from_content(source: Source, content: &str) -> Self {
        Self::new(source, content.lines().map(String::from).collect())
    }
}

/// A manifest line that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub source: Source,
    /// 1-based line number of the (first physical) offending line
    pub line_number: usize,
    /// The offending text, continuation lines joined
    pub line: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: ParseError,
}

fn serialize_error<S: serde::Serializer>(error: &ParseError, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut state = serializer.serialize_struct("ParseError", 2)?;
    state.serialize_field("kind", error.kind())?;
    state.serialize_field("message", &error.to_string())?;
    state.end()
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{}): {}",
            self.source.name,
            self.source.origin.display(),
            self.line_number,
            self.error
        )
    }
}

/// Result of parsing one or more manifests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    pub requirements: Vec<Requirement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedManifest {
    /// Append another parse result
    pub fn extend(&mut self, other: ParsedManifest) {
        self.requirements.extend(other.requirements);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// One requirement line after `\` continuations are joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// 1-based number of the first physical line
    pub number: usize,
    /// Number of physical lines joined into this one
    pub span: usize,
    pub text: String,
}

/// Join physical lines ending in `\` into logical lines, keeping the first line number
pub(crate) fn logical_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (index, raw) in lines.iter().enumerate() {
        let raw = raw.as_ref();
        let mut line = match pending.take() {
            Some(mut line) => {
                line.text.push(' ');
                line.text.push_str(raw.trim_start());
                line.span += 1;
                line
            }
            None => LogicalLine {
                number: index + 1,
                span: 1,
                text: raw.to_string(),
            },
        };

        let body = strip_comment(&line.text).trim_end();
        if let Some(joined) = body.strip_suffix('\\') {
            line.text = joined.to_string();
            pending = Some(line);
        } else {
            out.push(line);
        }
    }

    if let Some(last) = pending {
        out.push(last);
    }
    out
}

/// Parse every line of one manifest.
///
/// Each malformed logical line yields exactly one diagnostic; all other lines
/// are still parsed.
pub fn parse_manifest(input: &ManifestInput) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();

    for LogicalLine {
        number: line_number,
        text: line,
        ..
    } in logical_lines(&input.lines)
    {
        if is_directive(strip_comment(&line)) {
            debug!(
                "{}:{}: skipping pip directive '{}'",
                input.source.name,
                line_number,
                line.trim()
            );
            continue;
        }

        match parse_requirement(&line, &input.source, line_number) {
            Ok(Some(requirement)) => parsed.requirements.push(requirement),
            Ok(None) => {}
            Err(error) => {
                debug!("{}:{}: {}", input.source.name, line_number, error);
                parsed.diagnostics.push(Diagnostic {
                    source: input.source.clone(),
                    line_number,
                    line: line.trim().to_string(),
                    error,
                });
            }
        }
    }

    parsed
}

/// Parse a batch of manifests, in the order given
pub fn parse_manifests(inputs: &[ManifestInput]) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();
    for input in inputs {
        parsed.extend(parse_manifest(input));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, content: &str) -> ManifestInput {
        ManifestInput::from_content(
            Source::new(name, format!("custom_nodes/{}/requirements.txt", name)),
            content,
        )
    }

    #[test]
    fn test_parse_manifest_mixed_lines() {
        let manifest = input(
            "was-node-suite",
            "# core\n\nnumpy>=1.24\n-r extra.txt\nopencv-python>>4.0\ntorch\n",
        );
        let parsed = parse_manifest(&manifest);

        let names: Vec<&str> = parsed.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["numpy", "torch"]);
        assert_eq!(parsed.requirements[0].line_number, 3);
        assert_eq!(parsed.requirements[1].line_number, 6);

        assert_eq!(parsed.diagnostics.len(), 1);
        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(diagnostic.line_number, 5);
        assert_eq!(diagnostic.line, "opencv-python>>4.0");
        assert_eq!(diagnostic.source.name, "was-node-suite");
        assert!(matches!(
            diagnostic.error,
            ParseError::MalformedRequirement { .. }
        ));
    }

    #[test]
    fn test_one_diagnostic_per_malformed_line() {
        let manifest = input("a", "x>=1.0,<bad\ny~=1.*\nz>>2\n");
        let parsed = parse_manifest(&manifest);
        assert!(parsed.requirements.is_empty());
        let kinds: Vec<&str> = parsed.diagnostics.iter().map(|d| d.error.kind()).collect();
        assert_eq!(
            kinds,
            vec!["malformed_version", "unknown_operator", "malformed_requirement"]
        );
    }

    #[test]
    fn test_line_continuation() {
        let manifest = input("a", "torch>=2.0, \\\n    <3.0\nnumpy\n");
        let parsed = parse_manifest(&manifest);
        assert_eq!(parsed.requirements.len(), 2);
        assert_eq!(parsed.requirements[0].specifier(), ">=2.0,<3.0");
        assert_eq!(parsed.requirements[0].line_number, 1);
        assert_eq!(parsed.requirements[1].line_number, 3);
    }

    #[test]
    fn test_trailing_continuation_at_end_of_file() {
        let manifest = input("a", "numpy>=1.0 \\");
        let parsed = parse_manifest(&manifest);
        assert_eq!(parsed.requirements.len(), 1);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_manifests_preserves_order() {
        let parsed = parse_manifests(&[input("b", "pkg==2.0"), input("a", "pkg==1.0")]);
        let sources: Vec<&str> = parsed
            .requirements
            .iter()
            .map(|r| r.source.name.as_str())
            .collect();
        assert_eq!(sources, vec!["b", "a"]);
    }

    #[test]
    fn test_diagnostic_display_and_json() {
        let parsed = parse_manifest(&input("S1", "pkg>>1.0"));
        let diagnostic = &parsed.diagnostics[0];
        let text = diagnostic.to_string();
        assert!(text.starts_with("S1 (custom_nodes/S1/requirements.txt:1)"));
        assert!(text.contains("pkg>>1.0"));

        let json = serde_json::to_value(diagnostic).unwrap();
        assert_eq!(json["line_number"], 1);
        assert_eq!(json["error"]["kind"], "malformed_requirement");
    }
}
