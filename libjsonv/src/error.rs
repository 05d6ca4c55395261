//! Error types for JSONV parsing.

use thiserror::Error;

use crate::dialect::Feature;
use crate::node::Node;
use crate::scanner::Span;

/// Result type for JSONV parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that starts no token.
    #[error("Unexpected character \"{0}\"")]
    UnexpectedChar(char),

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unterminated template")]
    UnterminatedTemplate,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Bad escaped character \"{0}\"")]
    BadEscapedChar(char),

    #[error("Bad Unicode escape")]
    BadUnicodeEscape,

    #[error("Invalid number")]
    InvalidNumber,

    /// `${...}` that is not a reference path.
    #[error("Invalid template expression")]
    InvalidTemplateExpression,
}

/// Grammar violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// Syntax the configured dialect does not accept.
    #[error("{0} is not allowed in this dialect")]
    FeatureDisabled(Feature),

    /// Integer outside +/-(2^53-1) without a BigInt suffix.
    #[error("Integer is outside the safe range (add an \"n\" suffix)")]
    UnsafeInteger,

    #[error("Duplicate key \"{0}\"")]
    DuplicateKey(String),

    #[error("Unexpected extra content")]
    ExtraContent,

    #[error("Nesting too deep")]
    NestingTooDeep,
}

/// Reference resolution failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceErrorKind {
    #[error("Undefined reference \"{path}\"")]
    Undefined { path: String },

    #[error("Circular reference: {}", .cycle.join(" -> "))]
    Circular { cycle: Vec<String> },

    #[error("Cannot interpolate object or array \"{path}\"")]
    NotInterpolable { path: String },

    /// Substitution would copy more than `MAX_EXPANDED_NODES` nodes.
    #[error("Expanding \"{path}\" copies too many nodes")]
    ExpansionTooLarge { path: String },

    /// A reference left in a tree that was never resolved.
    #[error("Unresolved reference \"{path}\"")]
    Unresolved { path: String },
}

/// Error type for JSONV parsing.
///
/// Every variant carries the span of the offending source text. `Display`
/// renders the message followed by the 1-based start position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{kind} at {line}:{column}", line = .span.start.line, column = .span.start.column)]
    Lex { kind: LexErrorKind, span: Span },

    #[error("{kind} at {line}:{column}", line = .span.start.line, column = .span.start.column)]
    Syntax { kind: SyntaxErrorKind, span: Span },

    #[error("{kind} at {line}:{column}", line = .span.start.line, column = .span.start.column)]
    Reference { kind: ReferenceErrorKind, span: Span },
}

impl Error {
    pub fn lex(kind: LexErrorKind, span: Span) -> Self {
        Error::Lex { kind, span }
    }

    pub fn syntax(kind: SyntaxErrorKind, span: Span) -> Self {
        Error::Syntax { kind, span }
    }

    pub fn reference(kind: ReferenceErrorKind, span: Span) -> Self {
        Error::Reference { kind, span }
    }

    /// The message without position information.
    pub fn message(&self) -> String {
        match self {
            Error::Lex { kind, .. } => kind.to_string(),
            Error::Syntax { kind, .. } => kind.to_string(),
            Error::Reference { kind, .. } => kind.to_string(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Lex { span, .. } | Error::Syntax { span, .. } | Error::Reference { span, .. } => {
                *span
            }
        }
    }

    /// 1-based line of the error start.
    pub fn line(&self) -> usize {
        self.span().start.line
    }

    /// 1-based column of the error start.
    pub fn column(&self) -> usize {
        self.span().start.column
    }

    pub fn is_lex(&self) -> bool {
        matches!(self, Error::Lex { .. })
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Error::Reference { .. })
    }
}

/// A failed parse: at least one error, plus the partial tree when one exists.
///
/// In tolerant mode the partial tree is the best-effort result of the
/// grammar parser. When resolution fails it is the unresolved tree.
#[derive(Error, Debug, Clone)]
#[error("{first}{}", more_errors(.rest.len()))]
pub struct Failure {
    #[source]
    first: Error,
    rest: Vec<Error>,
    partial: Option<Node>,
}

impl Failure {
    pub fn new(first: Error) -> Self {
        Self {
            first,
            rest: Vec::new(),
            partial: None,
        }
    }

    /// Build from a list ordered by position. Returns `None` when empty.
    pub fn from_errors(errors: Vec<Error>) -> Option<Self> {
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        Some(Self {
            first,
            rest: errors.collect(),
            partial: None,
        })
    }

    pub fn with_partial(mut self, partial: Option<Node>) -> Self {
        self.partial = partial;
        self
    }

    /// The first error in source order.
    pub fn first(&self) -> &Error {
        &self.first
    }

    pub fn into_first(self) -> Error {
        self.first
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn into_errors(self) -> Vec<Error> {
        let mut errors = Vec::with_capacity(self.rest.len() + 1);
        errors.push(self.first);
        errors.extend(self.rest);
        errors
    }

    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub fn partial(&self) -> Option<&Node> {
        self.partial.as_ref()
    }

    pub fn message(&self) -> String {
        self.first.message()
    }

    pub fn line(&self) -> usize {
        self.first.line()
    }

    pub fn column(&self) -> usize {
        self.first.column()
    }
}

fn more_errors(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => " (and 1 more error)".to_string(),
        n => format!(" (and {} more errors)", n),
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Failure::new(error)
    }
}
