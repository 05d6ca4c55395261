//! Spanned syntax tree produced by the parser.

use std::fmt;

use num_bigint::BigInt;

use crate::scanner::Span;

/// A value with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Properties in source order; keys are unique.
    Object(Vec<Property>),
    Array(Vec<Node>),
    String(String),
    Number(f64),
    BigInt(BigInt),
    Bool(bool),
    Null,
    /// Bare reference to another value, e.g. `server.hosts[0]`.
    Reference(Path),
    /// Backtick string with `${path}` pieces.
    Template(Template),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub key_span: Span,
    pub value: Node,
}

/// Reference path, always starting with a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub pieces: Vec<TemplatePiece>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePiece {
    Text(String),
    /// `${path}`; the span covers the dollar sign through the closing brace.
    Expr { path: Path, span: Span },
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether this node is a reference or a template that still needs
    /// resolution.
    pub fn is_unresolved(&self) -> bool {
        matches!(self.kind, NodeKind::Reference(_) | NodeKind::Template(_))
    }

    /// Whether any node in this tree still needs resolution.
    pub fn contains_references(&self) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::Reference(_) | NodeKind::Template(_) => return true,
                NodeKind::Object(properties) => pending.extend(properties.iter().map(|p| &p.value)),
                NodeKind::Array(items) => pending.extend(items.iter()),
                _ => {}
            }
        }
        false
    }

    /// Look up a property of an object node. The last property with the
    /// key wins.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Object(properties) => properties
                .iter()
                .rev()
                .find(|p| p.key == key)
                .map(|p| &p.value),
            _ => None,
        }
    }

    /// Look up an element of an array node.
    pub fn index(&self, index: usize) -> Option<&Node> {
        match &self.kind {
            NodeKind::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Give this node and all of its descendants the same span.
    pub(crate) fn respan(mut self, span: Span) -> Node {
        {
            let mut pending = vec![&mut self];
            while let Some(node) = pending.pop() {
                node.span = span;
                match &mut node.kind {
                    NodeKind::Object(properties) => {
                        for property in properties.iter_mut() {
                            property.key_span = span;
                            pending.push(&mut property.value);
                        }
                    }
                    NodeKind::Array(items) => pending.extend(items.iter_mut()),
                    _ => {}
                }
            }
        }
        self
    }
}

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Path with a single key segment.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }
}

/// Whether `s` can be written without quotes as a key or path segment.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_part),
        _ => false,
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

pub(crate) fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_alphanumeric() || c == '\u{200C}' || c == '\u{200D}'
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if is_identifier(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Key(key) => write!(f, "[{:?}]", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Location;

    #[test]
    fn test_path_display() {
        let path = Path::new(vec![
            Segment::Key("server".into()),
            Segment::Key("hosts".into()),
            Segment::Index(0),
            Segment::Key("two words".into()),
        ]);
        assert_eq!(path.to_string(), "server.hosts[0][\"two words\"]");
        assert_eq!(Path::key("missing").to_string(), "missing");
    }

    #[test]
    fn test_identifier_classes() {
        assert!(is_identifier("port"));
        assert!(is_identifier("$ref"));
        assert!(is_identifier("_private1"));
        assert!(is_identifier("ünïcode"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("two words"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_respan_reaches_descendants() {
        let inner = Span::new(
            Location::START,
            Location {
                offset: 1,
                line: 1,
                column: 2,
            },
        );
        let node = Node::new(
            NodeKind::Array(vec![Node::new(NodeKind::Null, inner)]),
            inner,
        );
        let target = Span::point(Location {
            offset: 9,
            line: 2,
            column: 3,
        });
        let moved = node.respan(target);
        assert_eq!(moved.span, target);
        assert_eq!(moved.index(0).unwrap().span, target);
    }
}
