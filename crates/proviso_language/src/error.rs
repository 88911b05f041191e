//! Structured parse errors with source-context display.
//!
//! Parsing a ProViso program either yields an AST or exactly one
//! [`ParseError`]: the parser stops at the first failure and reports it
//! with a span, a de-duplicated list of the token descriptions it would
//! have accepted, and the single character it found instead. No partial
//! AST is produced.

use proviso_base::{LineMap, Location, Span};
use serde::Serialize;

use crate::suggest::{find_similar, KNOWN_FUNCTIONS};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// Human descriptions of acceptable next tokens, de-duplicated, in
    /// first-tried order.
    pub expected: Vec<String>,
    /// The first character at the error position, `None` at end of input.
    pub found: Option<char>,
}

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// A character the lexer has no rule for.
    UnexpectedChar { c: char },
    /// A numeric literal that does not scan (e.g. `1,00`).
    MalformedNumber { text: String },
    /// The parser wanted one of `expected` and saw something else.
    UnexpectedToken { found_desc: String },
    /// An identifier applied like a function, outside the fixed set.
    UnknownFunction { name: String },
    /// `EXPECT`-style keyword requirement (e.g. `AS` after a define name).
    ExpectedKeyword { keyword: String },
    ExpectedStatement,
    ExpectedExpression,
    ExpectedIdentifier,
    ExpectedComparison,
    /// A comma with nothing after it in an argument or name list.
    TrailingComma,
    /// `TESTED` followed by something other than a frequency word.
    UnknownFrequency { word: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError {
            kind,
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = dedup_preserving_order(expected);
        self
    }

    pub fn with_found(mut self, source: &str) -> Self {
        self.found = self.span.first_char(source);
        self
    }

    /// Short, end-user-safe message. Hosts render richer context from the
    /// structured fields.
    pub fn message(&self) -> String {
        match &self.kind {
            ParseErrorKind::UnexpectedChar { c } => {
                format!("unexpected character '{}'", c)
            }
            ParseErrorKind::MalformedNumber { text } => {
                format!("malformed numeric literal '{}'", text)
            }
            ParseErrorKind::UnexpectedToken { found_desc } => {
                if self.expected.is_empty() {
                    format!("unexpected {}", found_desc)
                } else {
                    format!("expected {}, found {}", self.expected.join(" or "), found_desc)
                }
            }
            ParseErrorKind::UnknownFunction { name } => {
                match find_similar(name, KNOWN_FUNCTIONS, 2) {
                    Some(s) => format!("unknown function '{}' (did you mean '{}'?)", name, s),
                    None => format!("unknown function '{}'", name),
                }
            }
            ParseErrorKind::ExpectedKeyword { keyword } => {
                format!("expected keyword '{}'", keyword)
            }
            ParseErrorKind::ExpectedStatement => {
                "expected a statement (DEFINE, COVENANT, BASKET, CONDITION, PROHIBIT, or EVENT)"
                    .to_string()
            }
            ParseErrorKind::ExpectedExpression => "expected an expression".to_string(),
            ParseErrorKind::ExpectedIdentifier => "expected an identifier".to_string(),
            ParseErrorKind::ExpectedComparison => {
                "expected a comparison operator (<=, >=, <, >, =, !=)".to_string()
            }
            ParseErrorKind::TrailingComma => "trailing comma is not allowed".to_string(),
            ParseErrorKind::UnknownFrequency { word } => format!(
                "unknown testing frequency '{}' (expected QUARTERLY, MONTHLY, ANNUALLY, or SEMI_ANNUALLY)",
                word
            ),
        }
    }

    /// Resolves the error span to line/column positions.
    pub fn location(&self, map: &LineMap) -> Location {
        map.location(self.span)
    }

    /// The wire-shaped error record hosts consume.
    pub fn to_report(&self, source: &str) -> ErrorReport {
        let map = LineMap::new(source);
        ErrorReport {
            message: self.message(),
            location: Some(self.location(&map)).map(|loc| LocationReport {
                start: PositionReport {
                    line: loc.start.line,
                    col: loc.start.col,
                    offset: loc.start.offset,
                },
                end: PositionReport {
                    line: loc.end.line,
                    col: loc.end.col,
                    offset: loc.end.offset,
                },
            }),
            expected: self.expected.clone(),
            found: self.found.map(|c| c.to_string()),
        }
    }

    /// Renders the error with the offending source line and a caret
    /// underline, `rustc` style.
    pub fn display_with_source(&self, source: &str) -> String {
        let map = LineMap::new(source);
        let loc = map.location(self.span);
        let (line_start, line_end) = map.line_bounds(self.span.start);
        let line_content = &source[line_start..line_end];

        let col = loc.start.col.saturating_sub(1);
        let len = self.span.len().max(1).min(line_content.len().saturating_sub(col).max(1));
        let underline = format!("{}{}", " ".repeat(col), "^".repeat(len));

        let mut out = format!(
            "error: {}\n\n{:4} | {}\n     | {}",
            self.message(),
            loc.start.line,
            line_content,
            underline
        );
        if !self.expected.is_empty() {
            out.push_str(&format!("\n     | expected: {}", self.expected.join(", ")));
        }
        out
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ParseError {}

/// Serializable error shape: message, resolved location, expected items,
/// found snippet.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<String>,
    pub found: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    pub start: PositionReport,
    pub end: PositionReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_source_underlines_the_span() {
        let source = "COVENANT MaxLeverage REQUIRES Leverage ?? 4.50";
        let err = ParseError::new(
            ParseErrorKind::UnexpectedChar { c: '?' },
            Span::new(39, 40),
        )
        .with_found(source);
        let display = err.display_with_source(source);
        assert!(display.contains("Leverage ??"), "quotes the line: {}", display);
        assert!(display.contains('^'), "has an underline: {}", display);
        assert_eq!(err.found, Some('?'));
    }

    #[test]
    fn unknown_function_suggests_a_fix() {
        let err = ParseError::new(
            ParseErrorKind::UnknownFunction {
                name: "GreatorOf".to_string(),
            },
            Span::new(0, 9),
        );
        assert!(err.message().contains("did you mean 'GreaterOf'"));
    }

    #[test]
    fn expected_list_is_deduplicated() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found_desc: "','".to_string(),
            },
            Span::new(0, 1),
        )
        .with_expected(vec![
            "an identifier".to_string(),
            "a number".to_string(),
            "an identifier".to_string(),
        ]);
        assert_eq!(err.expected.len(), 2);
    }

    #[test]
    fn found_is_none_at_end_of_input() {
        let source = "DEFINE X AS";
        let err = ParseError::new(ParseErrorKind::ExpectedExpression, Span::new(11, 11))
            .with_found(source);
        assert_eq!(err.found, None);
    }

    #[test]
    fn report_resolves_line_and_column() {
        let source = "DEFINE X AS Y\nCOVENANT ??";
        let err = ParseError::new(
            ParseErrorKind::ExpectedIdentifier,
            Span::new(23, 24),
        )
        .with_found(source);
        let report = err.to_report(source);
        let loc = report.location.unwrap();
        assert_eq!(loc.start.line, 2);
        assert_eq!(loc.start.col, 10);
        assert_eq!(report.found.as_deref(), Some("?"));
    }
}
