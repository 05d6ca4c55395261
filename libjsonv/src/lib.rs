//! JSONV parser implementation.
//!
//! JSONV is JSON5 plus internal references: a bare path such as
//! `server.port` in value position, or a `${path}` piece inside a backtick
//! template, names another value of the same document. The accepted syntax
//! is selected by a [`Mode`] and a target ECMAScript [`Year`].
//!
//! # Parsing Pipeline
//!
//! The parser operates in four phases:
//!
//! 1. **Scanner**: Walks the source text, tracking byte offset, line and
//!    column for every position.
//!
//! 2. **Lexer**: Converts the text into a lazy token stream, checking each
//!    optional form against the dialect gate table.
//!
//! 3. **Grammar Parser**: Recursively parses the tokens into a spanned
//!    [`Node`] tree.
//!
//! 4. **Reference Resolver**: Substitutes every reference and template,
//!    detecting cycles and undefined names.

mod diagnostic;
mod dialect;
mod encode;
mod error;
pub mod lexer;
mod node;
mod options;
pub mod parser;
pub mod resolve;
mod scanner;
mod value;

use tracing::debug;

pub use diagnostic::{check, Category, Diagnostic};
pub use dialect::{DialectConfig, Feature, Mode, ModeParseError, Year, YearParseError, GATES};
pub use encode::{encode, format_number, Format};
pub use error::{Error, Failure, LexErrorKind, ReferenceErrorKind, Result, SyntaxErrorKind};
pub use lexer::tokenize;
pub use node::{is_identifier, Node, NodeKind, Path, Property, Segment, Template, TemplatePiece};
pub use options::{DuplicateKeys, ParseOptions, DEFAULT_MAX_DEPTH};
pub use parser::Comment;
pub use resolve::{resolve, MAX_EXPANDED_NODES};
pub use scanner::{Location, Span};
pub use value::Value;

/// A successfully parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Resolved tree with source spans.
    pub root: Node,
    /// The same tree without spans.
    pub value: Value,
    /// Comments, when `preserve_comments` is set.
    pub comments: Vec<Comment>,
}

/// Parse a JSONV document with default options.
///
/// # Example
///
/// ```
/// use libjsonv::parse;
///
/// let value = parse("{ port: 8080, url: `http://localhost:${port}` }").unwrap();
/// assert_eq!(value.get("url").and_then(|v| v.as_str()), Some("http://localhost:8080"));
/// ```
pub fn parse(text: &str) -> Result<Value> {
    parse_with_options(text, &ParseOptions::default())
        .map(|document| document.value)
        .map_err(Failure::into_first)
}

/// Parse a document, reporting every error in tolerant mode.
///
/// The stages run in order and the first failing stage ends the parse, so
/// reference errors are only reported for syntactically valid input.
pub fn parse_with_options(
    text: &str,
    options: &ParseOptions,
) -> std::result::Result<Document, Failure> {
    debug!(
        bytes = text.len(),
        mode = %options.mode,
        year = %options.year,
        tolerant = options.tolerant,
        "parsing document"
    );

    // Phases 1-3: Lex and parse into a tree
    let tokens = lexer::tokenize(text, &options.dialect());
    let parsed = parser::parse(tokens, options).map_err(|failure| {
        debug!(errors = failure.len(), "parse failed");
        failure
    })?;

    // Phase 4: Substitute references
    let root = match resolve::resolve(&parsed.root) {
        Ok(root) => root,
        Err(err) => {
            debug!(error = %err, "resolution failed");
            return Err(Failure::new(err).with_partial(Some(parsed.root)));
        }
    };
    let value = Value::try_from(&root)?;
    Ok(Document {
        root,
        value,
        comments: parsed.comments,
    })
}
