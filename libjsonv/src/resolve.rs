//! Phase 4: Reference Resolver
//!
//! The resolver replaces every reference and template in a parsed tree with
//! the value it names. The tree is first indexed into an arena of slots whose
//! parent links form the scope chain. Each reference slot then moves through
//! three marks (unvisited, in progress, done) on an explicit work stack, so
//! deep reference chains never grow the call stack and a dependency that is
//! already in progress is a cycle.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::encode::format_number;
use crate::error::{Error, ReferenceErrorKind};
use crate::node::{Node, NodeKind, Path, Property, Segment, TemplatePiece};
use crate::scanner::Span;

type SlotId = usize;

const ROOT: SlotId = 0;

/// Most nodes substitution may copy into one document.
pub const MAX_EXPANDED_NODES: usize = 1 << 20;

/// Resolve all references in `root`, returning a new tree.
///
/// Substituted values take the span of the reference they replace. A key
/// repeated within one object keeps its first position and its last value.
/// The first failure is returned; references are attempted in source order.
pub fn resolve(root: &Node) -> Result<Node, Error> {
    let mut resolver = Resolver::new(root);
    resolver.resolve_all()?;
    resolver.build(ROOT).map_err(|id| resolver.unresolved(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy)]
enum Edge<'n> {
    Root,
    Key(&'n str),
    Index(usize),
}

#[derive(Debug)]
enum Children<'n> {
    Leaf,
    Object(IndexMap<&'n str, (&'n Property, SlotId)>),
    Array(Vec<SlotId>),
}

#[derive(Debug)]
struct Slot<'n> {
    node: &'n Node,
    parent: Option<SlotId>,
    edge: Edge<'n>,
    children: Children<'n>,
}

enum Attempt {
    Ready(Node),
    /// Waiting on an unresolved reference slot.
    Blocked(SlotId),
}

enum Lookup {
    Found(Node),
    Blocked(SlotId),
}

struct Resolver<'n> {
    slots: Vec<Slot<'n>>,
    marks: Vec<Mark>,
    /// Resolved values of reference and template slots.
    values: Vec<Option<Node>>,
    /// Node counts of `values`.
    sizes: Vec<usize>,
    /// Nodes copied so far.
    expanded: usize,
}

impl<'n> Resolver<'n> {
    fn new(root: &'n Node) -> Self {
        let mut slots = vec![Slot {
            node: root,
            parent: None,
            edge: Edge::Root,
            children: Children::Leaf,
        }];
        let mut pending = vec![ROOT];
        while let Some(id) = pending.pop() {
            let node = slots[id].node;
            let children = match &node.kind {
                NodeKind::Object(properties) => {
                    let mut last: IndexMap<&str, &Property> =
                        IndexMap::with_capacity(properties.len());
                    for property in properties {
                        last.insert(property.key.as_str(), property);
                    }
                    let mut map = IndexMap::with_capacity(last.len());
                    for (key, property) in last {
                        let child = slots.len();
                        slots.push(Slot {
                            node: &property.value,
                            parent: Some(id),
                            edge: Edge::Key(key),
                            children: Children::Leaf,
                        });
                        map.insert(key, (property, child));
                        pending.push(child);
                    }
                    Children::Object(map)
                }
                NodeKind::Array(items) => {
                    let mut ids = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let child = slots.len();
                        slots.push(Slot {
                            node: item,
                            parent: Some(id),
                            edge: Edge::Index(index),
                            children: Children::Leaf,
                        });
                        ids.push(child);
                        pending.push(child);
                    }
                    Children::Array(ids)
                }
                _ => Children::Leaf,
            };
            slots[id].children = children;
        }

        let count = slots.len();
        Self {
            slots,
            marks: vec![Mark::Unvisited; count],
            values: vec![None; count],
            sizes: vec![0; count],
            expanded: 0,
        }
    }

    fn resolve_all(&mut self) -> Result<(), Error> {
        let mut pending: Vec<SlotId> = (0..self.slots.len())
            .filter(|&id| self.slots[id].node.is_unresolved())
            .collect();
        pending.sort_by_key(|&id| self.slots[id].node.span.start.offset);
        debug!(references = pending.len(), "resolving references");

        for id in pending {
            if self.marks[id] != Mark::Unvisited {
                continue;
            }
            self.marks[id] = Mark::InProgress;
            let mut stack = vec![id];
            while let Some(&top) = stack.last() {
                match self.attempt(top)? {
                    Attempt::Ready(node) => {
                        trace!(path = %self.document_path(top), "resolved reference");
                        self.sizes[top] = node_count(&node);
                        self.expanded += self.sizes[top];
                        self.values[top] = Some(node);
                        self.marks[top] = Mark::Done;
                        stack.pop();
                    }
                    Attempt::Blocked(dep) if self.marks[dep] == Mark::InProgress => {
                        return Err(self.circular(&stack, dep));
                    }
                    Attempt::Blocked(dep) => {
                        self.marks[dep] = Mark::InProgress;
                        stack.push(dep);
                    }
                }
            }
        }
        Ok(())
    }

    fn attempt(&self, id: SlotId) -> Result<Attempt, Error> {
        let node = self.slots[id].node;
        match &node.kind {
            NodeKind::Reference(path) => Ok(match self.lookup(id, path, node.span)? {
                Lookup::Found(value) => Attempt::Ready(value.respan(node.span)),
                Lookup::Blocked(dep) => Attempt::Blocked(dep),
            }),
            NodeKind::Template(template) => {
                let mut text = String::new();
                for piece in &template.pieces {
                    match piece {
                        TemplatePiece::Text(s) => text.push_str(s),
                        TemplatePiece::Expr { path, span } => match self.lookup(id, path, *span)? {
                            Lookup::Found(value) => interpolate(&mut text, &value, path, *span)?,
                            Lookup::Blocked(dep) => return Ok(Attempt::Blocked(dep)),
                        },
                    }
                }
                Ok(Attempt::Ready(Node::new(NodeKind::String(text), node.span)))
            }
            _ => Ok(Attempt::Ready(node.clone())),
        }
    }

    /// Find the value `path` names as seen from slot `from`.
    fn lookup(&self, from: SlotId, path: &Path, span: Span) -> Result<Lookup, Error> {
        let undefined = || {
            Error::reference(
                ReferenceErrorKind::Undefined {
                    path: path.to_string(),
                },
                span,
            )
        };
        let check_size = |size: usize| {
            if self.expanded + size > MAX_EXPANDED_NODES {
                Err(Error::reference(
                    ReferenceErrorKind::ExpansionTooLarge {
                        path: path.to_string(),
                    },
                    span,
                ))
            } else {
                Ok(())
            }
        };

        let mut segments = path.segments.iter();
        let Some(Segment::Key(head)) = segments.next() else {
            return Err(undefined());
        };
        let mut target = self.scope_lookup(from, head).ok_or_else(undefined)?;

        // Once a step goes through a resolved reference, the rest of the
        // path walks its cached value.
        let mut resolved: Option<&Node> = None;
        for segment in segments {
            if let Some(node) = resolved {
                resolved = Some(step(node, segment).ok_or_else(undefined)?);
                continue;
            }
            if self.slots[target].node.is_unresolved() {
                match &self.values[target] {
                    Some(value) => {
                        resolved = Some(step(value, segment).ok_or_else(undefined)?);
                        continue;
                    }
                    None => return Ok(Lookup::Blocked(target)),
                }
            }
            target = match (&self.slots[target].children, segment) {
                (Children::Object(map), Segment::Key(key)) => {
                    map.get(key.as_str()).map(|&(_, child)| child)
                }
                (Children::Array(ids), Segment::Index(index)) => ids.get(*index).copied(),
                _ => None,
            }
            .ok_or_else(undefined)?;
        }

        Ok(match resolved {
            Some(node) => {
                check_size(node_count(node))?;
                Lookup::Found(node.clone())
            }
            None => {
                check_size(self.size(target))?;
                match self.build(target) {
                    Ok(node) => Lookup::Found(node),
                    Err(dep) => Lookup::Blocked(dep),
                }
            }
        })
    }

    /// Walk outward from `from` to the first object holding `key`.
    fn scope_lookup(&self, from: SlotId, key: &str) -> Option<SlotId> {
        let mut scope = self.slots[from].parent;
        while let Some(id) = scope {
            if let Children::Object(map) = &self.slots[id].children {
                if let Some(&(_, child)) = map.get(key) {
                    return Some(child);
                }
            }
            scope = self.slots[id].parent;
        }
        None
    }

    /// Assemble the resolved subtree at `id`, or name the first unresolved
    /// reference slot inside it.
    fn build(&self, id: SlotId) -> Result<Node, SlotId> {
        let slot = &self.slots[id];
        if slot.node.is_unresolved() {
            return self.values[id].clone().ok_or(id);
        }
        match (&slot.node.kind, &slot.children) {
            (NodeKind::Object(_), Children::Object(map)) => {
                let mut built = Vec::with_capacity(map.len());
                for &(property, child) in map.values() {
                    built.push(Property {
                        key: property.key.clone(),
                        key_span: property.key_span,
                        value: self.build(child)?,
                    });
                }
                Ok(Node::new(NodeKind::Object(built), slot.node.span))
            }
            (NodeKind::Array(_), Children::Array(ids)) => {
                let items = ids
                    .iter()
                    .map(|&child| self.build(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(NodeKind::Array(items), slot.node.span))
            }
            _ => Ok(slot.node.clone()),
        }
    }

    /// Nodes `build(id)` would produce, counting unresolved slots by their
    /// cached values.
    fn size(&self, id: SlotId) -> usize {
        let slot = &self.slots[id];
        if slot.node.is_unresolved() {
            return self.sizes[id];
        }
        1 + match &slot.children {
            Children::Leaf => 0,
            Children::Object(map) => map.values().map(|&(_, child)| self.size(child)).sum(),
            Children::Array(ids) => ids.iter().map(|&child| self.size(child)).sum(),
        }
    }

    /// Location of slot `id` in the document, e.g. `server.hosts[0]`.
    fn document_path(&self, id: SlotId) -> Path {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let slot = &self.slots[id];
            match slot.edge {
                Edge::Root => {}
                Edge::Key(key) => segments.push(Segment::Key(key.to_string())),
                Edge::Index(index) => segments.push(Segment::Index(index)),
            }
            current = slot.parent;
        }
        segments.reverse();
        Path::new(segments)
    }

    fn circular(&self, stack: &[SlotId], dep: SlotId) -> Error {
        let start = stack.iter().position(|&id| id == dep).unwrap_or(0);
        let mut cycle: Vec<String> = stack[start..]
            .iter()
            .map(|&id| self.document_path(id).to_string())
            .collect();
        cycle.push(self.document_path(dep).to_string());
        Error::reference(
            ReferenceErrorKind::Circular { cycle },
            self.slots[dep].node.span,
        )
    }

    fn unresolved(&self, id: SlotId) -> Error {
        Error::reference(
            ReferenceErrorKind::Unresolved {
                path: self.document_path(id).to_string(),
            },
            self.slots[id].node.span,
        )
    }
}

fn node_count(node: &Node) -> usize {
    1 + match &node.kind {
        NodeKind::Object(properties) => properties.iter().map(|p| node_count(&p.value)).sum(),
        NodeKind::Array(items) => items.iter().map(node_count).sum(),
        _ => 0,
    }
}

fn step<'a>(node: &'a Node, segment: &Segment) -> Option<&'a Node> {
    match segment {
        Segment::Key(key) => node.get(key),
        Segment::Index(index) => node.index(*index),
    }
}

/// Append the text form of a scalar.
fn interpolate(out: &mut String, value: &Node, path: &Path, span: Span) -> Result<(), Error> {
    match &value.kind {
        NodeKind::String(s) => out.push_str(s),
        NodeKind::Number(n) => out.push_str(&format_number(*n)),
        NodeKind::BigInt(n) => out.push_str(&n.to_string()),
        NodeKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        NodeKind::Null => out.push_str("null"),
        _ => {
            return Err(Error::reference(
                ReferenceErrorKind::NotInterpolable {
                    path: path.to_string(),
                },
                span,
            ))
        }
    }
    Ok(())
}
