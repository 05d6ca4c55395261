//! Phase 1: Scanner
//!
//! The scanner is a character cursor over the source text. It tracks:
//! - the byte offset of the next character
//! - the 1-based line, advanced by `\n`, `\r\n`, `\r`, U+2028 and U+2029
//! - the 1-based column, counted in code points

use std::fmt;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Location {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, in code points.
    pub column: usize,
}

impl Location {
    /// The location of the first character of any input.
    pub const START: Location = Location {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// An empty span at a single location.
    pub fn point(at: Location) -> Self {
        Self { start: at, end: at }
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

/// Whether `c` ends a line.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Character cursor with position tracking.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// The location of the next character.
    pub fn location(&self) -> Location {
        Location {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Look `n` characters past the next one.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consume one character, updating line and column.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        match c {
            // The '\n' of a "\r\n" pair does the line advance.
            '\r' if self.peek() == Some('\n') => self.column += 1,
            c if is_line_terminator(c) => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Consume the next character if it is `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    /// Source text from byte offset `start` up to the cursor.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.offset]
    }

    /// Span from `start` up to the cursor.
    pub fn span_from(&self, start: Location) -> Span {
        Span::new(start, self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_to_end(source: &str) -> Location {
        let mut scanner = Scanner::new(source);
        while scanner.bump().is_some() {}
        scanner.location()
    }

    #[test]
    fn test_columns_count_code_points() {
        let end = scan_to_end("héllo");
        assert_eq!(end.line, 1);
        assert_eq!(end.column, 6);
        assert_eq!(end.offset, 6);
    }

    #[test]
    fn test_line_terminators() {
        assert_eq!(scan_to_end("a\nb").line, 2);
        assert_eq!(scan_to_end("a\rb").line, 2);
        assert_eq!(scan_to_end("a\u{2028}b").line, 2);
        assert_eq!(scan_to_end("a\u{2029}b").line, 2);
        let end = scan_to_end("a\r\nbc");
        assert_eq!(end.line, 2);
        assert_eq!(end.column, 3);
    }

    #[test]
    fn test_peek_and_eat() {
        let mut scanner = Scanner::new("ab");
        assert_eq!(scanner.peek(), Some('a'));
        assert_eq!(scanner.peek_nth(1), Some('b'));
        assert!(!scanner.eat('b'));
        assert!(scanner.eat('a'));
        assert_eq!(scanner.rest(), "b");
        assert_eq!(scanner.slice_from(0), "a");
    }
}
