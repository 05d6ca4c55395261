//! TOML transcoding: convert JSONV values to TOML text.
//!
//! Mapping from JSONV to TOML:
//!   - Value::Null          -> error (TOML has no null)
//!   - Value::Bool          -> TOML boolean
//!   - Value::Number        -> TOML integer when integral and safe, else float
//!   - Value::BigInt        -> TOML integer (if fits in i64, otherwise error)
//!   - Value::String        -> TOML string
//!   - Value::Array         -> TOML array (objects inside become inline tables)
//!   - Value::Object        -> TOML table
//!
//! TOML requires the top-level value to be a table; other values error.

use anyhow::{anyhow, bail, Result};
use libjsonv::Value;
use num_traits::ToPrimitive;
use toml_edit::DocumentMut;

/// Largest integer a float holds exactly.
const MAX_SAFE: f64 = 9_007_199_254_740_991.0;

/// Encode a JSONV Value as a TOML string.
pub fn encode(value: &Value) -> Result<String> {
    let Value::Object(obj) = value else {
        bail!("TOML requires the top-level value to be an object");
    };
    let mut doc = DocumentMut::new();
    for (key, item) in obj {
        doc.insert(key, value_to_item(item)?);
    }
    Ok(doc.to_string())
}

fn value_to_item(value: &Value) -> Result<toml_edit::Item> {
    match value {
        Value::Object(obj) => {
            let mut table = toml_edit::Table::new();
            for (key, item) in obj {
                table.insert(key, value_to_item(item)?);
            }
            Ok(toml_edit::Item::Table(table))
        }
        other => Ok(toml_edit::Item::Value(value_to_toml(other)?)),
    }
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Value> {
    Ok(match value {
        Value::Null => bail!("TOML has no null type"),
        Value::Bool(b) => toml_edit::Value::from(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE => {
            toml_edit::Value::from(*n as i64)
        }
        Value::Number(n) => toml_edit::Value::from(*n),
        Value::BigInt(n) => {
            let i = n
                .to_i64()
                .ok_or_else(|| anyhow!("Integer {} too large for TOML (i64)", n))?;
            toml_edit::Value::from(i)
        }
        Value::String(s) => toml_edit::Value::from(s.as_str()),
        Value::Array(arr) => {
            let mut toml_arr = toml_edit::Array::new();
            for item in arr {
                toml_arr.push(value_to_toml(item)?);
            }
            toml_edit::Value::Array(toml_arr)
        }
        Value::Object(obj) => {
            let mut inline = toml_edit::InlineTable::new();
            for (key, item) in obj {
                inline.insert(key, value_to_toml(item)?);
            }
            toml_edit::Value::InlineTable(inline)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tables_and_values() {
        let value = libjsonv::parse("{ name: \"svc\", server: { port: 8080, ratio: 0.5 } }").unwrap();
        let text = encode(&value).unwrap();
        assert!(text.contains("name = \"svc\""));
        assert!(text.contains("[server]"));
        assert!(text.contains("port = 8080"));
        assert!(text.contains("ratio = 0.5"));
    }

    #[test]
    fn test_rejects_what_toml_cannot_hold() {
        assert!(encode(&libjsonv::parse("[1]").unwrap()).is_err());
        let err = encode(&libjsonv::parse("{ a: null }").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "TOML has no null type");
        assert!(encode(&libjsonv::parse("{ a: 99999999999999999999n }").unwrap()).is_err());
    }
}
