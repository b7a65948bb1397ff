//! Source text with a line index for span to location mapping

use crate::diagnostic::Location;
use std::path::Path;

/// Byte range into a source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Verbatim source text of one file
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    /// Byte offset of the first character of every line
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line and character column of a byte offset
    pub fn line_col(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.text[line_start..offset].chars().count() + 1;
        Some((line, column))
    }

    /// Text covered by a span, if it lies on character boundaries
    pub fn slice(&self, span: Span) -> Option<&str> {
        if span.start > span.end {
            return None;
        }
        self.text.get(span.start..span.end)
    }

    /// Line text without its terminator (1-based)
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len());
        self.text
            .get(start..end)
            .map(|l| l.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Map a non-empty span onto a reportable location
    pub fn location(&self, file: &Path, span: Span) -> Option<Location> {
        if span.is_empty() {
            return None;
        }
        let text = self.slice(span)?;
        let (line, column) = self.line_col(span.start)?;
        Some(Location::new(file.to_path_buf(), line, column).with_length(text.chars().count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_line_col() {
        let src = SourceText::new("ab\ncd\r\nef");
        assert_eq!(src.line_col(0), Some((1, 1)));
        assert_eq!(src.line_col(1), Some((1, 2)));
        assert_eq!(src.line_col(3), Some((2, 1)));
        assert_eq!(src.line_col(7), Some((3, 1)));
        assert_eq!(src.line_col(100), None);
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn test_columns_count_characters() {
        let src = SourceText::new("s = \"é\"; x");
        let offset = src.as_str().find('x').unwrap();
        assert_eq!(src.line_col(offset), Some((1, 10)));
        // inside the two-byte 'é'
        assert_eq!(src.line_col(6), None);
    }

    #[test]
    fn test_line() {
        let src = SourceText::new("first\r\nsecond\nthird");
        assert_eq!(src.line(1), Some("first"));
        assert_eq!(src.line(2), Some("second"));
        assert_eq!(src.line(3), Some("third"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
    }

    #[test]
    fn test_location() {
        let src = SourceText::new("if (intField < 42);");
        let loc = src
            .location(Path::new("a.cs"), Span::new(4, 12))
            .unwrap();
        assert_eq!(loc.file, PathBuf::from("a.cs"));
        assert_eq!((loc.line, loc.column, loc.length), (1, 5, 8));
    }

    #[test]
    fn test_location_rejects_unmapped_spans() {
        let src = SourceText::new("abc");
        assert!(src.location(Path::new("a.cs"), Span::new(2, 2)).is_none());
        assert!(src.location(Path::new("a.cs"), Span::new(1, 40)).is_none());
    }

    #[test]
    fn test_span_to() {
        assert_eq!(Span::new(4, 8).to(Span::new(2, 5)), Span::new(2, 8));
        assert_eq!(Span::new(3, 9).len(), 6);
    }
}
