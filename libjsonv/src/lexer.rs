//! Phase 2: Lexer
//!
//! The lexer converts source text into a lazy stream of tokens. It:
//! - skips whitespace and produces comment tokens
//! - decodes string, template and number literals
//! - consults the dialect gate table for every optional form
//!
//! Gate violations are reported only after the offending token has been
//! consumed completely, so a tolerant caller can keep lexing from a sane
//! position.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::dialect::{DialectConfig, Feature};
use crate::error::{Error, LexErrorKind};
use crate::node::{is_identifier_part, is_identifier_start, Path, Segment, TemplatePiece};
use crate::scanner::{is_line_terminator, Location, Scanner, Span};

/// Largest integer a float holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Punctuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Colon => ":",
            Punct::Comma => ",",
            Punct::Dot => ".",
        }
    }
}

/// Token type with decoded literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Punct(Punct),
    String(String),
    Number(f64),
    /// Integer outside the safe range, or any integer with an `n` suffix.
    BigInt { value: BigInt, suffixed: bool },
    Identifier(String),
    Template(Vec<TemplatePiece>),
    Comment,
    Eof,
}

/// A single token in the token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text of the token.
    pub raw: &'a str,
    pub span: Span,
}

impl Token<'_> {
    /// Human-readable name for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Punct(p) => format!("\"{}\"", p.as_str()),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Number(_) | TokenKind::BigInt { .. } => format!("number {}", self.raw),
            TokenKind::Identifier(name) => format!("identifier \"{}\"", name),
            TokenKind::Template(_) => "template".to_string(),
            TokenKind::Comment => "comment".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// Start lexing `text`. The stream ends with an [`TokenKind::Eof`] token.
pub fn tokenize<'a>(text: &'a str, dialect: &DialectConfig) -> Lexer<'a> {
    Lexer::new(text, *dialect)
}

/// Lazy token stream.
///
/// In non-tolerant mode the stream ends after the first error. In tolerant
/// mode errors are yielded in place and lexing resumes after them; a token
/// that violates a gate follows its error.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    dialect: DialectConfig,
    /// First gate violation inside the current token.
    pending: Option<Error>,
    /// Item held back behind its gate violation in tolerant mode.
    queued: Option<Result<Token<'a>, Error>>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, dialect: DialectConfig) -> Self {
        Self {
            scanner: Scanner::new(text),
            dialect,
            pending: None,
            queued: None,
            finished: false,
        }
    }

    fn lex_token(&mut self) -> Result<Token<'a>, Error> {
        self.skip_whitespace()?;
        let start = self.scanner.location();
        let Some(c) = self.scanner.peek() else {
            return Ok(self.token(TokenKind::Eof, start));
        };
        let kind = match c {
            '{' => self.punct(Punct::LBrace),
            '}' => self.punct(Punct::RBrace),
            '[' => self.punct(Punct::LBracket),
            ']' => self.punct(Punct::RBracket),
            ':' => self.punct(Punct::Colon),
            ',' => self.punct(Punct::Comma),
            '.' if self.scanner.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.lex_number(start)?
            }
            '.' => self.punct(Punct::Dot),
            '+' | '-' | '0'..='9' => self.lex_number(start)?,
            '"' | '\'' => TokenKind::String(self.lex_string(c, start)?),
            '`' => self.lex_template(start)?,
            '/' => self.lex_comment(start)?,
            c if is_identifier_start(c) => self.lex_identifier(),
            c => {
                self.scanner.bump();
                return Err(Error::lex(
                    LexErrorKind::UnexpectedChar(c),
                    self.scanner.span_from(start),
                ));
            }
        };
        Ok(self.token(kind, start))
    }

    fn token(&self, kind: TokenKind, start: Location) -> Token<'a> {
        Token {
            kind,
            raw: self.scanner.slice_from(start.offset),
            span: self.scanner.span_from(start),
        }
    }

    fn punct(&mut self, punct: Punct) -> TokenKind {
        self.scanner.bump();
        TokenKind::Punct(punct)
    }

    /// Record a gate violation for the current token.
    fn gate(&mut self, feature: Feature, span: Span) {
        if self.pending.is_none() {
            if let Err(err) = self.dialect.check(feature, span) {
                self.pending = Some(err);
            }
        }
    }

    fn skip_whitespace(&mut self) -> Result<(), Error> {
        while let Some(c) = self.scanner.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.scanner.bump();
                continue;
            }
            if !is_extended_whitespace(c) {
                break;
            }
            let start = self.scanner.location();
            self.scanner.bump();
            self.dialect
                .check(Feature::ExtendedWhitespace, self.scanner.span_from(start))?;
        }
        Ok(())
    }

    // ========================================================================
    // Comments and identifiers
    // ========================================================================

    fn lex_comment(&mut self, start: Location) -> Result<TokenKind, Error> {
        self.scanner.bump();
        match self.scanner.peek() {
            Some('/') => self.scanner.eat_while(|c| !is_line_terminator(c)),
            Some('*') => {
                self.scanner.bump();
                loop {
                    match self.scanner.bump() {
                        Some('*') if self.scanner.eat('/') => break,
                        Some(_) => {}
                        None => {
                            return Err(Error::lex(
                                LexErrorKind::UnterminatedComment,
                                self.scanner.span_from(start),
                            ))
                        }
                    }
                }
            }
            _ => {
                return Err(Error::lex(
                    LexErrorKind::UnexpectedChar('/'),
                    self.scanner.span_from(start),
                ))
            }
        }
        let span = self.scanner.span_from(start);
        self.gate(Feature::Comments, span);
        Ok(TokenKind::Comment)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        TokenKind::Identifier(self.lex_name().unwrap_or_default())
    }

    /// Consume an identifier if one starts here.
    fn lex_name(&mut self) -> Option<String> {
        let start = self.scanner.location().offset;
        match self.scanner.peek() {
            Some(c) if is_identifier_start(c) => {
                self.scanner.bump();
                self.scanner.eat_while(is_identifier_part);
                Some(self.scanner.slice_from(start).to_string())
            }
            _ => None,
        }
    }

    // ========================================================================
    // Strings
    // ========================================================================

    fn lex_string(&mut self, quote: char, start: Location) -> Result<String, Error> {
        self.scanner.bump();
        if quote == '\'' {
            let span = self.scanner.span_from(start);
            self.gate(Feature::SingleQuotedString, span);
        }
        let mut value = String::new();
        loop {
            let at = self.scanner.location();
            match self.scanner.peek() {
                None => {
                    return Err(Error::lex(
                        LexErrorKind::UnterminatedString,
                        self.scanner.span_from(start),
                    ))
                }
                Some(c) if c == quote => {
                    self.scanner.bump();
                    break;
                }
                Some('\\') => {
                    self.scanner.bump();
                    self.lex_escape(&mut value, at, false)?;
                }
                Some('\n' | '\r') => {
                    return Err(Error::lex(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, at),
                    ))
                }
                Some(c) => {
                    self.scanner.bump();
                    if c < '\u{20}' {
                        let span = self.scanner.span_from(at);
                        self.gate(Feature::ControlCharacter, span);
                    }
                    value.push(c);
                }
            }
        }
        Ok(value)
    }

    /// Decode one escape sequence; `at` is the location of the backslash.
    fn lex_escape(&mut self, out: &mut String, at: Location, in_template: bool) -> Result<(), Error> {
        let Some(c) = self.scanner.bump() else {
            let kind = if in_template {
                LexErrorKind::UnterminatedTemplate
            } else {
                LexErrorKind::UnterminatedString
            };
            return Err(Error::lex(kind, self.scanner.span_from(at)));
        };
        match c {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => self.lex_unicode_escape(out, at)?,
            '`' | '$' if in_template => out.push(c),
            '0' if !self.scanner.peek().is_some_and(|d| d.is_ascii_digit()) => {
                self.extended_escape(at);
                out.push('\0');
            }
            '0'..='7' => self.lex_legacy_octal(out, c, at),
            '8' | '9' => {
                return Err(Error::lex(
                    LexErrorKind::BadEscapedChar(c),
                    self.scanner.span_from(at),
                ))
            }
            'v' => {
                self.extended_escape(at);
                out.push('\u{0B}');
            }
            'x' => {
                let code = self.lex_hex_digits(2).ok_or_else(|| {
                    Error::lex(LexErrorKind::BadEscapedChar('x'), self.scanner.span_from(at))
                })?;
                self.extended_escape(at);
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            // Line continuation.
            '\r' => {
                self.scanner.eat('\n');
                self.extended_escape(at);
            }
            '\n' | '\u{2028}' | '\u{2029}' => self.extended_escape(at),
            c => {
                self.extended_escape(at);
                out.push(c);
            }
        }
        Ok(())
    }

    fn extended_escape(&mut self, at: Location) {
        let span = self.scanner.span_from(at);
        self.gate(Feature::ExtendedEscape, span);
    }

    fn lex_legacy_octal(&mut self, out: &mut String, first: char, at: Location) {
        let mut value = first.to_digit(8).unwrap_or(0);
        let max_more = if first <= '3' { 2 } else { 1 };
        for _ in 0..max_more {
            match self.scanner.peek().and_then(|d| d.to_digit(8)) {
                Some(d) => {
                    self.scanner.bump();
                    value = value * 8 + d;
                }
                None => break,
            }
        }
        let span = self.scanner.span_from(at);
        self.gate(Feature::LegacyOctalEscape, span);
        out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
    }

    fn lex_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.scanner.peek().and_then(|c| c.to_digit(16))?;
            self.scanner.bump();
            value = value * 16 + digit;
        }
        Some(value)
    }

    fn lex_unicode_escape(&mut self, out: &mut String, at: Location) -> Result<(), Error> {
        let bad = |scanner: &Scanner<'a>| {
            Error::lex(LexErrorKind::BadUnicodeEscape, scanner.span_from(at))
        };

        if self.scanner.eat('{') {
            let digits_start = self.scanner.location().offset;
            self.scanner.eat_while(|c| c.is_ascii_hexdigit());
            let digits = self.scanner.slice_from(digits_start);
            if digits.is_empty() || !self.scanner.eat('}') {
                return Err(bad(&self.scanner));
            }
            let span = self.scanner.span_from(at);
            self.gate(Feature::CodePointEscape, span);
            let code = u32::from_str_radix(digits, 16)
                .ok()
                .filter(|&code| code <= 0x10FFFF)
                .ok_or_else(|| bad(&self.scanner))?;
            out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            return Ok(());
        }

        let high = self.lex_hex_digits(4).ok_or_else(|| bad(&self.scanner))?;
        if (0xD800..0xDC00).contains(&high) && self.scanner.rest().starts_with("\\u") {
            let saved = self.scanner.clone();
            self.scanner.bump();
            self.scanner.bump();
            match self.lex_hex_digits(4) {
                Some(low) if (0xDC00..0xE000).contains(&low) => {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    return Ok(());
                }
                // Not a pair; the second escape is decoded on its own.
                _ => self.scanner = saved,
            }
        }
        // Lone surrogates have no `char`; they decode to U+FFFD.
        out.push(char::from_u32(high).unwrap_or('\u{FFFD}'));
        Ok(())
    }

    // ========================================================================
    // Templates
    // ========================================================================

    fn lex_template(&mut self, start: Location) -> Result<TokenKind, Error> {
        self.scanner.bump();
        let span = self.scanner.span_from(start);
        self.gate(Feature::TemplateLiteral, span);

        let mut pieces = Vec::new();
        let mut text = String::new();
        loop {
            let at = self.scanner.location();
            match self.scanner.peek() {
                None => {
                    return Err(Error::lex(
                        LexErrorKind::UnterminatedTemplate,
                        self.scanner.span_from(start),
                    ))
                }
                Some('`') => {
                    self.scanner.bump();
                    break;
                }
                Some('\\') => {
                    self.scanner.bump();
                    self.lex_escape(&mut text, at, true)?;
                }
                Some('$') if self.scanner.peek_nth(1) == Some('{') => {
                    self.scanner.bump();
                    self.scanner.bump();
                    if !text.is_empty() {
                        pieces.push(TemplatePiece::Text(std::mem::take(&mut text)));
                    }
                    let path = self.lex_template_path(at)?;
                    pieces.push(TemplatePiece::Expr {
                        path,
                        span: self.scanner.span_from(at),
                    });
                }
                Some('\r') => {
                    self.scanner.bump();
                    self.scanner.eat('\n');
                    text.push('\n');
                }
                Some(c) => {
                    self.scanner.bump();
                    text.push(c);
                }
            }
        }
        if !text.is_empty() || pieces.is_empty() {
            pieces.push(TemplatePiece::Text(text));
        }
        Ok(TokenKind::Template(pieces))
    }

    /// Parse the path inside `${ ... }`; `at` is the location of the `$`.
    fn lex_template_path(&mut self, at: Location) -> Result<Path, Error> {
        let invalid = |scanner: &Scanner<'a>| {
            Error::lex(
                LexErrorKind::InvalidTemplateExpression,
                scanner.span_from(at),
            )
        };

        self.skip_template_space();
        let head = self.lex_name().ok_or_else(|| invalid(&self.scanner))?;
        let mut segments = vec![Segment::Key(head)];
        loop {
            if self.scanner.eat('.') {
                let key = self.lex_name().ok_or_else(|| invalid(&self.scanner))?;
                segments.push(Segment::Key(key));
            } else if self.scanner.eat('[') {
                self.skip_template_space();
                let segment = match self.scanner.peek() {
                    Some(c) if c.is_ascii_digit() => {
                        let digits_start = self.scanner.location().offset;
                        self.scanner.eat_while(|c| c.is_ascii_digit());
                        let index = self
                            .scanner
                            .slice_from(digits_start)
                            .parse::<usize>()
                            .map_err(|_| invalid(&self.scanner))?;
                        Segment::Index(index)
                    }
                    Some(quote @ ('"' | '\'')) => {
                        let string_start = self.scanner.location();
                        Segment::Key(self.lex_string(quote, string_start)?)
                    }
                    _ => return Err(invalid(&self.scanner)),
                };
                self.skip_template_space();
                if !self.scanner.eat(']') {
                    return Err(invalid(&self.scanner));
                }
                segments.push(segment);
            } else {
                break;
            }
        }
        self.skip_template_space();
        if !self.scanner.eat('}') {
            return Err(invalid(&self.scanner));
        }
        Ok(Path::new(segments))
    }

    fn skip_template_space(&mut self) {
        self.scanner
            .eat_while(|c| c == ' ' || c == '\t' || is_line_terminator(c));
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn lex_number(&mut self, start: Location) -> Result<TokenKind, Error> {
        let negative = match self.scanner.peek() {
            Some('-') => {
                self.scanner.bump();
                true
            }
            Some('+') => {
                self.scanner.bump();
                let span = self.scanner.span_from(start);
                self.gate(Feature::PlusSign, span);
                false
            }
            _ => false,
        };

        // Signed Infinity and NaN; the bare words are identifiers.
        if self.scanner.peek().is_some_and(is_identifier_start) {
            let word_start = self.scanner.location().offset;
            self.scanner.eat_while(is_identifier_part);
            let value = match self.scanner.slice_from(word_start) {
                "Infinity" => f64::INFINITY,
                "NaN" => f64::NAN,
                _ => return Err(self.invalid_number(start)),
            };
            let span = self.scanner.span_from(start);
            self.gate(Feature::NonFiniteNumber, span);
            return Ok(TokenKind::Number(if negative { -value } else { value }));
        }

        if self.scanner.peek() == Some('0') {
            let prefixed = match self.scanner.peek_nth(1) {
                Some('x' | 'X') => Some((16, Feature::HexLiteral)),
                Some('b' | 'B') => Some((2, Feature::BinaryLiteral)),
                Some('o' | 'O') => Some((8, Feature::OctalLiteral)),
                _ => None,
            };
            if let Some((radix, feature)) = prefixed {
                self.scanner.bump();
                self.scanner.bump();
                let span = self.scanner.span_from(start);
                self.gate(feature, span);
                let digits = self.lex_digits(radix)?;
                if digits.is_empty() {
                    return Err(self.invalid_number(start));
                }
                let suffixed = self.lex_big_int_suffix(start);
                self.expect_number_end(start)?;
                let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)
                    .ok_or_else(|| self.invalid_number(start))?;
                return Ok(integer_token(negative, magnitude, suffixed));
            }
        }

        let integer = self.lex_digits(10)?;
        if integer.len() > 1 && integer.starts_with('0') {
            return Err(self.invalid_number(start));
        }
        let mut literal = if integer.is_empty() {
            "0".to_string()
        } else {
            integer.clone()
        };
        let mut is_float = false;

        if self.scanner.peek() == Some('.') {
            self.scanner.bump();
            is_float = true;
            let fraction = self.lex_digits(10)?;
            if integer.is_empty() && fraction.is_empty() {
                return Err(self.invalid_number(start));
            }
            if integer.is_empty() || fraction.is_empty() {
                let span = self.scanner.span_from(start);
                self.gate(Feature::LooseDecimalPoint, span);
            }
            literal.push('.');
            literal.push_str(if fraction.is_empty() { "0" } else { &fraction });
        } else if integer.is_empty() {
            return Err(self.invalid_number(start));
        }

        if matches!(self.scanner.peek(), Some('e' | 'E')) {
            self.scanner.bump();
            is_float = true;
            literal.push('e');
            if let Some(sign @ ('+' | '-')) = self.scanner.peek() {
                self.scanner.bump();
                literal.push(sign);
            }
            let exponent = self.lex_digits(10)?;
            if exponent.is_empty() {
                return Err(self.invalid_number(start));
            }
            literal.push_str(&exponent);
        }

        let suffixed = !is_float && self.lex_big_int_suffix(start);
        self.expect_number_end(start)?;

        if is_float {
            let value: f64 = literal.parse().map_err(|_| self.invalid_number(start))?;
            return Ok(TokenKind::Number(if negative { -value } else { value }));
        }
        let magnitude: BigInt = literal.parse().map_err(|_| self.invalid_number(start))?;
        Ok(integer_token(negative, magnitude, suffixed))
    }

    /// Consume digits in `radix` with `_` separators, returning the digits
    /// without separators.
    fn lex_digits(&mut self, radix: u32) -> Result<String, Error> {
        let mut digits = String::new();
        loop {
            match self.scanner.peek() {
                Some(c) if c.is_digit(radix) => {
                    self.scanner.bump();
                    digits.push(c);
                }
                Some('_') => {
                    let at = self.scanner.location();
                    self.scanner.bump();
                    let followed_by_digit = self.scanner.peek().is_some_and(|c| c.is_digit(radix));
                    let span = self.scanner.span_from(at);
                    if digits.is_empty() || !followed_by_digit {
                        return Err(Error::lex(LexErrorKind::InvalidNumber, span));
                    }
                    self.gate(Feature::NumericSeparator, span);
                }
                _ => break,
            }
        }
        Ok(digits)
    }

    fn lex_big_int_suffix(&mut self, start: Location) -> bool {
        if !self.scanner.eat('n') {
            return false;
        }
        let span = self.scanner.span_from(start);
        self.gate(Feature::BigIntLiteral, span);
        true
    }

    fn expect_number_end(&mut self, start: Location) -> Result<(), Error> {
        match self.scanner.peek() {
            Some(c) if is_identifier_part(c) => {
                self.scanner.eat_while(is_identifier_part);
                Err(self.invalid_number(start))
            }
            _ => Ok(()),
        }
    }

    fn invalid_number(&self, start: Location) -> Error {
        Error::lex(LexErrorKind::InvalidNumber, self.scanner.span_from(start))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(item) = self.queued.take() {
            self.finished = matches!(&item, Ok(token) if token.kind == TokenKind::Eof);
            return Some(item);
        }
        let item = match (self.lex_token(), self.pending.take()) {
            (item, Some(err)) if self.dialect.tolerant => {
                self.queued = Some(item);
                return Some(Err(err));
            }
            (_, Some(err)) => Err(err),
            (item, None) => item,
        };
        match &item {
            Ok(token) if token.kind == TokenKind::Eof => self.finished = true,
            Err(_) if !self.dialect.tolerant => self.finished = true,
            _ => {}
        }
        Some(item)
    }
}

fn is_extended_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0B}' | '\u{0C}' | '\u{A0}' | '\u{FEFF}' | '\u{2028}' | '\u{2029}'
    ) || (!c.is_ascii() && c.is_whitespace())
}

fn integer_token(negative: bool, magnitude: BigInt, suffixed: bool) -> TokenKind {
    if !suffixed {
        if let Some(n) = magnitude.to_i64().filter(|n| *n <= MAX_SAFE_INTEGER) {
            let value = n as f64;
            return TokenKind::Number(if negative { -value } else { value });
        }
    }
    let value = if negative { -magnitude } else { magnitude };
    TokenKind::BigInt { value, suffixed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Mode, Year};
    use crate::error::SyntaxErrorKind;

    fn dialect(mode: Mode, year: Year) -> DialectConfig {
        DialectConfig {
            mode,
            year,
            ..DialectConfig::default()
        }
    }

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, &DialectConfig::default())
            .map(|t| t.unwrap().kind)
            .collect()
    }

    fn single(text: &str) -> TokenKind {
        kinds(text).remove(0)
    }

    fn first_error(text: &str, dialect: DialectConfig) -> Error {
        tokenize(text, &dialect)
            .find_map(|t| t.err())
            .expect("expected an error")
    }

    #[test]
    fn test_punctuation_and_identifiers() {
        assert_eq!(
            kinds("{ a: [b.c] }"),
            vec![
                TokenKind::Punct(Punct::LBrace),
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Colon),
                TokenKind::Punct(Punct::LBracket),
                TokenKind::Identifier("b".into()),
                TokenKind::Punct(Punct::Dot),
                TokenKind::Identifier("c".into()),
                TokenKind::Punct(Punct::RBracket),
                TokenKind::Punct(Punct::RBrace),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_positions() {
        let tokens: Vec<Token> = tokenize("{\r\n  key: 1\n}", &DialectConfig::default())
            .map(|t| t.unwrap())
            .collect();
        let key = &tokens[1];
        assert_eq!(key.raw, "key");
        assert_eq!((key.span.start.line, key.span.start.column), (2, 3));
        assert_eq!(key.span.start.offset, 5);
        let close = &tokens[4];
        assert_eq!((close.span.start.line, close.span.start.column), (3, 1));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single("42"), TokenKind::Number(42.0));
        assert_eq!(single("-1.5e3"), TokenKind::Number(-1500.0));
        assert_eq!(single(".5"), TokenKind::Number(0.5));
        assert_eq!(single("5."), TokenKind::Number(5.0));
        assert_eq!(single("+7"), TokenKind::Number(7.0));
        assert_eq!(single("-0x1F"), TokenKind::Number(-31.0));
        assert_eq!(single("0b101"), TokenKind::Number(5.0));
        assert_eq!(single("0o17"), TokenKind::Number(15.0));
        assert_eq!(single("1_000_000"), TokenKind::Number(1_000_000.0));
        assert_eq!(single("-Infinity"), TokenKind::Number(f64::NEG_INFINITY));
        match single("NaN") {
            TokenKind::Identifier(name) => assert_eq!(name, "NaN"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_zero_keeps_sign() {
        match single("-0") {
            TokenKind::Number(n) => assert!(n == 0.0 && n.is_sign_negative()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_big_integers() {
        assert_eq!(
            single("9007199254740991"),
            TokenKind::Number(9_007_199_254_740_991.0)
        );
        assert_eq!(
            single("9007199254740993"),
            TokenKind::BigInt {
                value: "9007199254740993".parse().unwrap(),
                suffixed: false
            }
        );
        assert_eq!(
            single("-10n"),
            TokenKind::BigInt {
                value: BigInt::from(-10),
                suffixed: true
            }
        );
        assert_eq!(
            single("0xFFn"),
            TokenKind::BigInt {
                value: BigInt::from(255),
                suffixed: true
            }
        );
    }

    #[test]
    fn test_malformed_numbers() {
        for text in ["01", "1.5n", "1e", "1_", "1__0", "0x", "12abc", "-", "0b102"] {
            let err = first_error(text, DialectConfig::default());
            assert!(
                matches!(
                    err,
                    Error::Lex {
                        kind: LexErrorKind::InvalidNumber,
                        ..
                    }
                ),
                "{}: {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_separator_gate_points_at_separator() {
        let err = first_error("1_000", dialect(Mode::Jsonv, Year::Es2020));
        assert_eq!(
            err,
            Error::syntax(
                SyntaxErrorKind::FeatureDisabled(Feature::NumericSeparator),
                Span::new(
                    Location {
                        offset: 1,
                        line: 1,
                        column: 2
                    },
                    Location {
                        offset: 2,
                        line: 1,
                        column: 3
                    }
                )
            )
        );
    }

    #[test]
    fn test_strict_json_gates() {
        let strict = dialect(Mode::StrictJson, Year::LATEST);
        let cases = [
            ("+1", Feature::PlusSign),
            ("0x10", Feature::HexLiteral),
            (".5", Feature::LooseDecimalPoint),
            ("'a'", Feature::SingleQuotedString),
            ("// note", Feature::Comments),
            ("\"\\v\"", Feature::ExtendedEscape),
            ("\"a\tb\"", Feature::ControlCharacter),
            ("\u{A0}1", Feature::ExtendedWhitespace),
            ("-Infinity", Feature::NonFiniteNumber),
        ];
        for (text, feature) in cases {
            match first_error(text, strict) {
                Error::Syntax {
                    kind: SyntaxErrorKind::FeatureDisabled(found),
                    ..
                } => assert_eq!(found, feature, "{}", text),
                other => panic!("{}: unexpected {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            single(r#""a\nb\u0041\/""#),
            TokenKind::String("a\nbA/".into())
        );
        assert_eq!(
            single(r#""\u{1F600}\uD83D\uDE00""#),
            TokenKind::String("\u{1F600}\u{1F600}".into())
        );
        assert_eq!(single(r#""\uD800""#), TokenKind::String("\u{FFFD}".into()));
        assert_eq!(
            single("'it\\'s \\x41\\0'"),
            TokenKind::String("it's A\0".into())
        );
        assert_eq!(single("\"a\\\nb\""), TokenKind::String("ab".into()));
    }

    #[test]
    fn test_legacy_octal_escapes() {
        let es5 = dialect(Mode::Json5, Year::Es5);
        let tokens: Vec<TokenKind> = tokenize(r#""\101\7""#, &es5)
            .map(|t| t.unwrap().kind)
            .collect();
        assert_eq!(tokens[0], TokenKind::String("A\u{7}".into()));

        match first_error(r#""\101""#, DialectConfig::default()) {
            Error::Syntax {
                kind: SyntaxErrorKind::FeatureDisabled(Feature::LegacyOctalEscape),
                ..
            } => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            first_error(r#""\8""#, es5),
            Error::Lex {
                kind: LexErrorKind::BadEscapedChar('8'),
                ..
            }
        ));
    }

    #[test]
    fn test_template_pieces() {
        match single("`http://${ host }:${ports[0]}/${a[\"b c\"]}`") {
            TokenKind::Template(pieces) => {
                assert_eq!(pieces.len(), 6);
                assert_eq!(pieces[0], TemplatePiece::Text("http://".into()));
                match &pieces[1] {
                    TemplatePiece::Expr { path, span } => {
                        assert_eq!(path.to_string(), "host");
                        assert_eq!(span.start.column, 9);
                    }
                    other => panic!("unexpected {:?}", other),
                }
                match &pieces[3] {
                    TemplatePiece::Expr { path, .. } => assert_eq!(path.to_string(), "ports[0]"),
                    other => panic!("unexpected {:?}", other),
                }
                match &pieces[5] {
                    TemplatePiece::Expr { path, .. } => {
                        assert_eq!(path.to_string(), "a[\"b c\"]")
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            single("``"),
            TokenKind::Template(vec![TemplatePiece::Text(String::new())])
        );
    }

    #[test]
    fn test_templates_need_jsonv() {
        match first_error("`x`", dialect(Mode::Json5, Year::LATEST)) {
            Error::Syntax {
                kind: SyntaxErrorKind::FeatureDisabled(Feature::TemplateLiteral),
                ..
            } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_forms() {
        let default = DialectConfig::default();
        assert!(matches!(
            first_error("\"abc", default),
            Error::Lex {
                kind: LexErrorKind::UnterminatedString,
                ..
            }
        ));
        assert!(matches!(
            first_error("\"abc\ndef\"", default),
            Error::Lex {
                kind: LexErrorKind::UnterminatedString,
                ..
            }
        ));
        assert!(matches!(
            first_error("/* abc", default),
            Error::Lex {
                kind: LexErrorKind::UnterminatedComment,
                ..
            }
        ));
        assert!(matches!(
            first_error("`abc", default),
            Error::Lex {
                kind: LexErrorKind::UnterminatedTemplate,
                ..
            }
        ));
        assert!(matches!(
            first_error("`${1}`", default),
            Error::Lex {
                kind: LexErrorKind::InvalidTemplateExpression,
                ..
            }
        ));
    }

    #[test]
    fn test_comments_are_tokens() {
        assert_eq!(
            kinds("// one\n1 /* two */"),
            vec![
                TokenKind::Comment,
                TokenKind::Number(1.0),
                TokenKind::Comment,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_stream_stops_after_error_unless_tolerant() {
        let strict: Vec<_> = tokenize("@ 1", &DialectConfig::default()).collect();
        assert_eq!(strict.len(), 1);
        assert!(strict[0].is_err());

        let tolerant = DialectConfig {
            tolerant: true,
            ..DialectConfig::default()
        };
        let items: Vec<_> = tokenize("@ 1", &tolerant).collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_err());
        assert_eq!(items[1].as_ref().unwrap().kind, TokenKind::Number(1.0));
        assert_eq!(items[2].as_ref().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_tolerant_keeps_gated_token() {
        let tolerant = DialectConfig {
            tolerant: true,
            year: Year::Es2020,
            ..DialectConfig::default()
        };
        let items: Vec<_> = tokenize("1_000", &tolerant).collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_err());
        assert_eq!(items[1].as_ref().unwrap().kind, TokenKind::Number(1000.0));
    }

    #[test]
    fn test_tolerant_keeps_lex_error_after_gate() {
        let tolerant = DialectConfig {
            tolerant: true,
            mode: Mode::StrictJson,
            ..DialectConfig::default()
        };
        let items: Vec<_> = tokenize("'abc", &tolerant).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].as_ref().unwrap_err(),
            &Error::syntax(
                SyntaxErrorKind::FeatureDisabled(Feature::SingleQuotedString),
                items[0].as_ref().unwrap_err().span()
            )
        );
        assert!(matches!(
            &items[1],
            Err(Error::Lex {
                kind: LexErrorKind::UnterminatedString,
                ..
            })
        ));
        assert_eq!(items[2].as_ref().unwrap().kind, TokenKind::Eof);

        let strict = DialectConfig {
            mode: Mode::StrictJson,
            ..DialectConfig::default()
        };
        assert_eq!(tokenize("'abc", &strict).count(), 1);
    }

    #[test]
    fn test_restart_yields_same_tokens() {
        let text = "{ a: `${b}`, c: 0x10 }";
        let first: Vec<_> = tokenize(text, &DialectConfig::default()).collect();
        let second: Vec<_> = tokenize(text, &DialectConfig::default()).collect();
        assert_eq!(first, second);
    }
}
