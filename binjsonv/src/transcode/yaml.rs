//! YAML transcoding: convert JSONV values to YAML text.
//!
//! Mapping from JSONV to YAML:
//!   - Value::Null         -> YAML null
//!   - Value::Bool         -> YAML bool
//!   - Value::Number       -> YAML integer when integral and safe, else float
//!                            (including .nan, .inf, -.inf)
//!   - Value::BigInt       -> YAML integer (as a string if beyond i64/u64)
//!   - Value::String       -> YAML string
//!   - Value::Array        -> YAML sequence
//!   - Value::Object       -> YAML mapping, keys in document order

use anyhow::Result;
use libjsonv::Value;
use num_traits::ToPrimitive;

/// Largest integer a float holds exactly.
const MAX_SAFE: f64 = 9_007_199_254_740_991.0;

/// Encode a JSONV Value as a YAML string.
pub fn encode(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(&value_to_yaml(value))?)
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE => {
            serde_yaml::Value::Number(serde_yaml::Number::from(*n as i64))
        }
        Value::Number(n) => serde_yaml::Value::Number(serde_yaml::Number::from(*n)),
        Value::BigInt(n) => {
            // Try to fit in i64 first, then u64
            if let Some(i) = n.to_i64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(i))
            } else if let Some(u) = n.to_u64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(u))
            } else {
                // YAML doesn't have native arbitrary-precision integers
                serde_yaml::Value::String(n.to_string())
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(arr) => serde_yaml::Value::Sequence(arr.iter().map(value_to_yaml).collect()),
        Value::Object(obj) => {
            let mut map = serde_yaml::Mapping::new();
            for (key, item) in obj {
                map.insert(serde_yaml::Value::String(key.clone()), value_to_yaml(item));
            }
            serde_yaml::Value::Mapping(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_order_and_integers() {
        let value = libjsonv::parse("{ zeta: 1, alpha: [1.5, null], big: 123456789012345678901234n }")
            .unwrap();
        assert_eq!(
            encode(&value).unwrap(),
            "zeta: 1\nalpha:\n- 1.5\n- null\nbig: '123456789012345678901234'\n"
        );
    }
}
