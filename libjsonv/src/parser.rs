//! Phase 3: Grammar Parser
//!
//! The grammar parser processes the token stream by recursive descent to
//! build the spanned [`Node`] tree. It handles:
//! - Scalars: null, booleans, numbers, BigInts, strings, templates
//! - Compounds: arrays and objects, with optional trailing commas
//! - References: bare paths such as `server.hosts[0]` in value position
//!
//! In tolerant mode a failed production is recorded and the parser skips to
//! the next `,` or closing bracket at the same nesting level.

use std::collections::HashMap;

use crate::dialect::{DialectConfig, Feature};
use crate::error::{Error, Failure, SyntaxErrorKind};
use crate::lexer::{Punct, Token, TokenKind};
use crate::node::{Node, NodeKind, Path, Property, Segment, Template, TemplatePiece};
use crate::options::{DuplicateKeys, ParseOptions};
use crate::scanner::{Location, Span};

/// A comment kept when `preserve_comments` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Source text including the delimiters.
    pub text: String,
    pub span: Span,
}

/// Grammar parser output.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub root: Node,
    pub comments: Vec<Comment>,
}

/// Parse a token stream into a syntax tree.
pub fn parse<'a, I>(tokens: I, options: &ParseOptions) -> Result<Parsed, Failure>
where
    I: IntoIterator<Item = Result<Token<'a>, Error>>,
{
    let mut parser = Parser::new(tokens.into_iter(), options)?;
    let root = parser.parse_document();
    parser.finish(root)
}

struct Parser<'a, I> {
    tokens: I,
    current: Token<'a>,
    dialect: DialectConfig,
    duplicate_keys: DuplicateKeys,
    max_depth: usize,
    preserve_comments: bool,
    comments: Vec<Comment>,
    errors: Vec<Error>,
    depth: usize,
    /// End of the last real token, used if the stream ends early.
    end: Location,
}

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Result<Token<'a>, Error>>,
{
    fn new(tokens: I, options: &ParseOptions) -> Result<Self, Error> {
        let mut parser = Self {
            tokens,
            current: Token {
                kind: TokenKind::Eof,
                raw: "",
                span: Span::default(),
            },
            dialect: options.dialect(),
            duplicate_keys: options.duplicate_keys,
            max_depth: options.max_depth,
            preserve_comments: options.preserve_comments,
            comments: Vec::new(),
            errors: Vec::new(),
            depth: 0,
            end: Location::START,
        };
        parser.current = parser.next_token()?;
        Ok(parser)
    }

    fn finish(mut self, root: Result<Node, Error>) -> Result<Parsed, Failure> {
        let root = match root {
            Ok(root) => Some(root),
            Err(err) if self.dialect.tolerant => {
                self.report(err);
                None
            }
            Err(err) => return Err(Failure::new(err)),
        };
        self.errors.sort_by_key(|err| err.span().start.offset);
        match (Failure::from_errors(self.errors), root) {
            (None, Some(root)) => Ok(Parsed {
                root,
                comments: self.comments,
            }),
            (Some(failure), root) => Err(failure.with_partial(root)),
            // Unreachable: a missing root always records an error.
            (None, None) => Err(Failure::new(Error::syntax(
                SyntaxErrorKind::UnexpectedEnd {
                    expected: "a value",
                },
                Span::point(self.end),
            ))),
        }
    }

    // ========================================================================
    // Token Handling
    // ========================================================================

    /// Pull the next significant token, handling comments and lexer errors.
    fn next_token(&mut self) -> Result<Token<'a>, Error> {
        loop {
            match self.tokens.next() {
                None => {
                    return Ok(Token {
                        kind: TokenKind::Eof,
                        raw: "",
                        span: Span::point(self.end),
                    })
                }
                Some(Ok(token)) if token.kind == TokenKind::Comment => {
                    self.end = token.span.end;
                    if self.preserve_comments {
                        self.comments.push(Comment {
                            text: token.raw.to_string(),
                            span: token.span,
                        });
                    }
                }
                Some(Ok(token)) => {
                    self.end = token.span.end;
                    return Ok(token);
                }
                Some(Err(err)) if self.dialect.tolerant => self.report(err),
                Some(Err(err)) => return Err(err),
            }
        }
    }

    /// Move to the next token, returning the current one.
    fn advance(&mut self) -> Result<Token<'a>, Error> {
        let next = self.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn at(&self, punct: Punct) -> bool {
        self.current.kind == TokenKind::Punct(punct)
    }

    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn expect(&mut self, punct: Punct, expected: &'static str) -> Result<Token<'a>, Error> {
        if self.at(punct) {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, Error> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Error for the current token.
    fn unexpected(&self, expected: &'static str) -> Error {
        let kind = if self.at_eof() {
            SyntaxErrorKind::UnexpectedEnd { expected }
        } else {
            SyntaxErrorKind::UnexpectedToken {
                found: self.current.describe(),
                expected,
            }
        };
        Error::syntax(kind, self.current.span)
    }

    // ========================================================================
    // Error Recovery
    // ========================================================================

    fn report(&mut self, err: Error) {
        let start = err.span().start;
        let kind = std::mem::discriminant(&err);
        if !self
            .errors
            .iter()
            .any(|e| e.span().start == start && std::mem::discriminant(e) == kind)
        {
            self.errors.push(err);
        }
    }

    /// Fail in strict mode; record and keep going in tolerant mode.
    fn report_or_fail(&mut self, err: Error) -> Result<(), Error> {
        if self.dialect.tolerant {
            self.report(err);
            Ok(())
        } else {
            Err(err)
        }
    }

    fn require(&mut self, feature: Feature, span: Span) -> Result<(), Error> {
        match self.dialect.check(feature, span) {
            Ok(()) => Ok(()),
            Err(err) => self.report_or_fail(err),
        }
    }

    /// Record `err` and skip to the next `,` or closing bracket at this
    /// nesting level.
    fn recover(&mut self, err: Error) -> Result<(), Error> {
        self.report_or_fail(err)?;
        let mut nesting = 0usize;
        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Punct(Punct::LBrace | Punct::LBracket) => nesting += 1,
                TokenKind::Punct(Punct::RBrace | Punct::RBracket) => {
                    if nesting == 0 {
                        break;
                    }
                    nesting -= 1;
                }
                TokenKind::Punct(Punct::Comma) if nesting == 0 => break,
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn parse_document(&mut self) -> Result<Node, Error> {
        let root = self.parse_value()?;
        if !self.at_eof() {
            let err = Error::syntax(SyntaxErrorKind::ExtraContent, self.current.span);
            self.report_or_fail(err)?;
        }
        Ok(root)
    }

    fn parse_value(&mut self) -> Result<Node, Error> {
        let span = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::Punct(Punct::LBrace) => return self.parse_object(),
            TokenKind::Punct(Punct::LBracket) => return self.parse_array(),
            TokenKind::Identifier(name) => match name.as_str() {
                "true" => NodeKind::Bool(true),
                "false" => NodeKind::Bool(false),
                "null" => NodeKind::Null,
                "Infinity" => {
                    self.require(Feature::NonFiniteNumber, span)?;
                    NodeKind::Number(f64::INFINITY)
                }
                "NaN" => {
                    self.require(Feature::NonFiniteNumber, span)?;
                    NodeKind::Number(f64::NAN)
                }
                _ => return self.parse_reference(),
            },
            TokenKind::String(s) => NodeKind::String(s.clone()),
            TokenKind::Number(n) => NodeKind::Number(*n),
            TokenKind::BigInt { value, suffixed } => {
                let kind = NodeKind::BigInt(value.clone());
                if !suffixed && self.dialect.strict_big_int {
                    self.report_or_fail(Error::syntax(SyntaxErrorKind::UnsafeInteger, span))?;
                }
                kind
            }
            TokenKind::Template(pieces) => template_kind(pieces),
            _ => return Err(self.unexpected("a value")),
        };
        self.advance()?;
        Ok(Node::new(kind, span))
    }

    /// Parse `ident ( "." ident | "[" index-or-string "]" )*`.
    fn parse_reference(&mut self) -> Result<Node, Error> {
        let start = self.current.span;
        self.require(Feature::Reference, start)?;
        let mut end = start.end;
        let mut segments = vec![Segment::Key(self.expect_identifier()?)];
        loop {
            if self.at(Punct::Dot) {
                self.advance()?;
                end = self.current.span.end;
                segments.push(Segment::Key(self.expect_identifier()?));
            } else if self.at(Punct::LBracket) {
                self.advance()?;
                let segment = match &self.current.kind {
                    TokenKind::Number(n) if n.fract() == 0.0 && n.is_sign_positive() => {
                        Segment::Index(*n as usize)
                    }
                    TokenKind::String(key) => Segment::Key(key.clone()),
                    _ => return Err(self.unexpected("an index or a quoted key")),
                };
                self.advance()?;
                end = self.expect(Punct::RBracket, "\"]\"")?.span.end;
                segments.push(segment);
            } else {
                break;
            }
        }
        Ok(Node::new(
            NodeKind::Reference(Path::new(segments)),
            Span::new(start.start, end),
        ))
    }

    /// Count one level of nesting at the current opening bracket.
    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.max_depth {
            return Err(Error::syntax(
                SyntaxErrorKind::NestingTooDeep,
                self.current.span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Consume `close` if present and return the end of the container.
    fn close(&mut self, close: Punct) -> Result<Location, Error> {
        if self.at(close) {
            Ok(self.advance()?.span.end)
        } else {
            Ok(self.current.span.start)
        }
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    fn parse_array(&mut self) -> Result<Node, Error> {
        self.enter()?;
        let result = self.parse_array_items();
        self.depth -= 1;
        result
    }

    fn parse_array_items(&mut self) -> Result<Node, Error> {
        let start = self.advance()?.span.start;
        let mut items = Vec::new();
        loop {
            if self.at(Punct::RBracket) {
                break;
            }
            if self.at_eof() || self.at(Punct::RBrace) {
                let err = self.unexpected("\"]\"");
                self.recover(err)?;
                break;
            }
            match self.parse_value() {
                Ok(node) => items.push(node),
                Err(err) => self.recover(err)?,
            }
            if self.at(Punct::Comma) {
                let comma = self.advance()?;
                if self.at(Punct::RBracket) {
                    self.require(Feature::TrailingComma, comma.span)?;
                }
            } else if !self.at(Punct::RBracket) {
                let err = self.unexpected("\",\" or \"]\"");
                self.recover(err)?;
                if self.at(Punct::Comma) {
                    self.advance()?;
                }
            }
        }
        let end = self.close(Punct::RBracket)?;
        Ok(Node::new(NodeKind::Array(items), Span::new(start, end)))
    }

    // ========================================================================
    // Objects
    // ========================================================================

    fn parse_object(&mut self) -> Result<Node, Error> {
        self.enter()?;
        let result = self.parse_object_properties();
        self.depth -= 1;
        result
    }

    fn parse_object_properties(&mut self) -> Result<Node, Error> {
        let start = self.advance()?.span.start;
        let mut properties: Vec<Property> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        loop {
            if self.at(Punct::RBrace) {
                break;
            }
            if self.at_eof() || self.at(Punct::RBracket) {
                let err = self.unexpected("\"}\"");
                self.recover(err)?;
                break;
            }
            match self.parse_property() {
                Ok(property) => match positions.get(&property.key) {
                    Some(&index) => match self.duplicate_keys {
                        DuplicateKeys::LastWins => properties[index].value = property.value,
                        DuplicateKeys::Error => {
                            let err = Error::syntax(
                                SyntaxErrorKind::DuplicateKey(property.key),
                                property.key_span,
                            );
                            self.report_or_fail(err)?;
                        }
                    },
                    None => {
                        positions.insert(property.key.clone(), properties.len());
                        properties.push(property);
                    }
                },
                Err(err) => self.recover(err)?,
            }
            if self.at(Punct::Comma) {
                let comma = self.advance()?;
                if self.at(Punct::RBrace) {
                    self.require(Feature::TrailingComma, comma.span)?;
                }
            } else if !self.at(Punct::RBrace) {
                let err = self.unexpected("\",\" or \"}\"");
                self.recover(err)?;
                if self.at(Punct::Comma) {
                    self.advance()?;
                }
            }
        }
        let end = self.close(Punct::RBrace)?;
        Ok(Node::new(NodeKind::Object(properties), Span::new(start, end)))
    }

    fn parse_property(&mut self) -> Result<Property, Error> {
        let key_span = self.current.span;
        let key = match &self.current.kind {
            TokenKind::String(s) => s.clone(),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.require(Feature::UnquotedKey, key_span)?;
                name
            }
            _ => return Err(self.unexpected("a property name")),
        };
        self.advance()?;
        self.expect(Punct::Colon, "\":\"")?;
        let value = self.parse_value()?;
        Ok(Property {
            key,
            key_span,
            value,
        })
    }
}

/// A template without interpolations is a plain string.
fn template_kind(pieces: &[TemplatePiece]) -> NodeKind {
    let mut text = String::new();
    for piece in pieces {
        match piece {
            TemplatePiece::Text(s) => text.push_str(s),
            TemplatePiece::Expr { .. } => {
                return NodeKind::Template(Template {
                    pieces: pieces.to_vec(),
                })
            }
        }
    }
    NodeKind::String(text)
}
