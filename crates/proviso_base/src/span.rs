//! Source positions for tokens, AST nodes, and diagnostics.
//!
//! ProViso reports everything against the original agreement text: a
//! covenant's span, a validation finding, a parse failure. Internally the
//! pipeline tracks only byte offsets ([`Span`]); the line/column shape
//! hosts display ([`Position`], [`Location`]) is resolved on demand
//! through a [`LineMap`] built once per source text.
//!
//! Offsets are bytes, not characters, matching Rust's string slicing:
//! `span.snippet(source)` is `&source[span.start..span.end]`.
//!
//! ```
//! use proviso_base::{LineMap, Span};
//!
//! let source = "DEFINE Leverage AS\nTotalDebt / EBITDA";
//! let span = Span::new(19, 28);
//! assert_eq!(span.snippet(source), "TotalDebt");
//!
//! let map = LineMap::new(source);
//! let loc = span.resolve(&map);
//! assert_eq!((loc.start.line, loc.start.col), (2, 1));
//! ```

/// A resolved source position: 1-based line and column plus the raw byte
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

/// A resolved span: start and end [`Position`]s. This is the shape the
/// error-report contract exposes to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

/// A byte-offset range in source text. `Copy`, two words, carried by
/// every token and AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset past the last character (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both operands; the span of `a + b` is
    /// `a.span.merge(b.span)`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// `true` when the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The spanned source text, clamped to the source's bounds.
    pub fn snippet<'s>(&self, source: &'s str) -> &'s str {
        let start = self.start.min(source.len());
        let end = self.end.clamp(start, source.len());
        &source[start..end]
    }

    /// The first character at the span's start, `None` at end of input.
    /// This is the single-character `found` snippet of the parse-error
    /// contract.
    pub fn first_char(&self, source: &str) -> Option<char> {
        source[self.start.min(source.len())..].chars().next()
    }

    /// Resolves both ends to line/column positions.
    pub fn resolve(&self, map: &LineMap) -> Location {
        Location {
            start: map.position(self.start),
            end: map.position(self.end),
        }
    }
}

/// Precomputed line-start table resolving byte offsets to line/column.
///
/// Built once per source text; `position` is a binary search over the
/// line starts. Handles both LF and CRLF line endings (the `\r` simply
/// counts as a column on its line).
pub struct LineMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineMap {
            line_starts,
            len: source.len(),
        }
    }

    /// Resolves a byte offset to a 1-based line/column position.
    ///
    /// Offsets past the end of the source clamp to the final position.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            line: line_idx + 1,
            col: offset - self.line_starts[line_idx] + 1,
            offset,
        }
    }

    /// Resolves a span to start and end positions.
    pub fn location(&self, span: Span) -> Location {
        span.resolve(self)
    }

    /// Returns the byte range of the line containing `offset`, excluding
    /// the trailing newline. Error display uses this to quote the
    /// offending line.
    pub fn line_bounds(&self, offset: usize) -> (usize, usize) {
        let pos = self.position(offset);
        let start = self.line_starts[pos.line - 1];
        let end = self
            .line_starts
            .get(pos.line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both_operands() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.merge(b), Span::new(5, 15));
        assert_eq!(b.merge(a), Span::new(5, 15));
    }

    #[test]
    fn snippet_extracts_and_clamps() {
        let source = "BASKET Inv CAPACITY $25,000,000";
        assert_eq!(Span::new(7, 10).snippet(source), "Inv");
        assert_eq!(Span::new(7, 999).snippet(source), &source[7..]);
        assert_eq!(Span::new(999, 1000).snippet(source), "");
    }

    #[test]
    fn first_char_is_none_at_end_of_input() {
        let source = "DEFINE X AS";
        assert_eq!(Span::new(0, 6).first_char(source), Some('D'));
        assert_eq!(Span::new(11, 11).first_char(source), None);
    }

    #[test]
    fn position_on_first_line() {
        let map = LineMap::new("BASKET Inv CAPACITY $25,000,000");
        let pos = map.position(7);
        assert_eq!((pos.line, pos.col, pos.offset), (1, 8, 7));
    }

    #[test]
    fn position_after_newlines() {
        let map = LineMap::new("a\nbb\nccc");
        assert_eq!(map.position(0).line, 1);
        assert_eq!(map.position(2).line, 2);
        let pos = map.position(6);
        assert_eq!((pos.line, pos.col), (3, 2));
    }

    #[test]
    fn position_clamps_past_end() {
        let map = LineMap::new("abc");
        let pos = map.position(99);
        assert_eq!(pos.offset, 3);
        assert_eq!((pos.line, pos.col), (1, 4));
    }

    #[test]
    fn resolve_reaches_both_ends() {
        let map = LineMap::new("x\ny z");
        let loc = Span::new(2, 5).resolve(&map);
        assert_eq!((loc.start.line, loc.start.col), (2, 1));
        assert_eq!((loc.end.line, loc.end.col), (2, 4));
    }

    #[test]
    fn line_bounds_excludes_newline() {
        let source = "one\ntwo\nthree";
        let map = LineMap::new(source);
        let (start, end) = map.line_bounds(5);
        assert_eq!(&source[start..end], "two");
        let (start, end) = map.line_bounds(9);
        assert_eq!(&source[start..end], "three");
    }

    #[test]
    fn crlf_counts_carriage_return_as_column() {
        let map = LineMap::new("ab\r\ncd");
        assert_eq!(map.position(4).line, 2);
        assert_eq!(map.position(4).col, 1);
    }
}
