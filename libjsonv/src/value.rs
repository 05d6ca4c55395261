//! JSONV value representation.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{Error, ReferenceErrorKind};
use crate::lexer::MAX_SAFE_INTEGER;
use crate::node::{Node, NodeKind, TemplatePiece};

/// A fully resolved JSONV value.
#[derive(Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// 64-bit floating-point number.
    Number(f64),
    /// Arbitrary-precision integer.
    BigInt(BigInt),
    String(String),
    Array(Vec<Value>),
    /// Object with keys in source order.
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as an `i64` if it is an integer of either kind
    /// that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 => n.to_i64(),
            Value::BigInt(n) => n.to_i64(),
            _ => None,
        }
    }

    pub fn as_big_int(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Look up a key if this is an `Object`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Returns a description of why this value cannot be represented in JSON,
    /// or `None` if it can be represented.
    ///
    /// JSON cannot represent:
    /// - BigInts (numbers outside the float-safe integer range)
    /// - NaN and the infinities
    pub fn json_incompatibility(&self) -> Option<&'static str> {
        match self {
            Value::BigInt(_) => Some("BigInt values"),
            Value::Number(n) if !n.is_finite() => Some("NaN and Infinity"),
            Value::Array(arr) => arr.iter().find_map(Value::json_incompatibility),
            Value::Object(obj) => obj.values().find_map(Value::json_incompatibility),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", crate::encode::format_number(*n)),
            Value::BigInt(n) => write!(f, "{}n", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Object(obj) => f.debug_map().entries(obj).finish(),
        }
    }
}

impl TryFrom<&Node> for Value {
    type Error = Error;

    /// Strip spans from a resolved tree. Fails on the first reference or
    /// template still present, as in a partial tree from tolerant mode.
    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        Ok(match &node.kind {
            NodeKind::Null => Value::Null,
            NodeKind::Bool(b) => Value::Bool(*b),
            NodeKind::Number(n) => Value::Number(*n),
            NodeKind::BigInt(n) => Value::BigInt(n.clone()),
            NodeKind::String(s) => Value::String(s.clone()),
            NodeKind::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            NodeKind::Object(properties) => {
                let mut obj = IndexMap::with_capacity(properties.len());
                for property in properties {
                    obj.insert(property.key.clone(), Value::try_from(&property.value)?);
                }
                Value::Object(obj)
            }
            NodeKind::Reference(path) => {
                return Err(unresolved(path.to_string(), node));
            }
            NodeKind::Template(template) => {
                let path = template
                    .pieces
                    .iter()
                    .find_map(|piece| match piece {
                        TemplatePiece::Expr { path, .. } => Some(path.to_string()),
                        TemplatePiece::Text(_) => None,
                    })
                    .unwrap_or_default();
                return Err(unresolved(path, node));
            }
        })
    }
}

fn unresolved(path: String, node: &Node) -> Error {
    Error::reference(ReferenceErrorKind::Unresolved { path }, node.span)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Safe integers become `Number`, others `BigInt`.
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        if n.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
            Value::Number(n as f64)
        } else {
            Value::BigInt(BigInt::from(n))
        }
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(obj: IndexMap<String, Value>) -> Self {
        Value::Object(obj)
    }
}
