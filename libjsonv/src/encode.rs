//! Encode JSONV values as text.
//!
//! Both formats are pretty-printed with two-space indentation and keep
//! object keys in insertion order.

use crate::lexer::MAX_SAFE_INTEGER;
use crate::node::is_identifier;
use crate::Value;

/// Output format for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Standard JSON. Non-finite numbers become `null`; check
    /// [`Value::json_incompatibility`] first.
    Json,
    /// JSONV: unquoted identifier keys, `n`-suffixed BigInts, `NaN` and
    /// `Infinity`.
    Jsonv,
}

/// Encode a value to a string in the specified format.
pub fn encode(value: &Value, format: Format) -> String {
    let mut out = String::new();
    encode_value(&mut out, value, format, 0);
    out
}

/// Render a number the way ECMAScript's `Number#toString` does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", n);
    }
    exponent_form(n)
}

fn exponent_form(n: f64) -> String {
    let s = format!("{:e}", n);
    match s.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => s,
    }
}

/// Whole numbers past the safe range would read back as BigInts.
fn reads_as_big_int(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() > MAX_SAFE_INTEGER as f64
}

fn encode_value(out: &mut String, value: &Value, format: Format, indent: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => match format {
            // JSON doesn't support NaN/Infinity
            Format::Json if !n.is_finite() => out.push_str("null"),
            Format::Jsonv if *n == 0.0 && n.is_sign_negative() => out.push_str("-0"),
            Format::Jsonv if reads_as_big_int(*n) => out.push_str(&exponent_form(*n)),
            _ => out.push_str(&format_number(*n)),
        },
        Value::BigInt(n) => {
            out.push_str(&n.to_string());
            if format == Format::Jsonv {
                out.push('n');
            }
        }
        Value::String(s) => encode_string(out, s),
        Value::Array(arr) => {
            if arr.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                pad(out, indent + 1);
                encode_value(out, item, format, indent + 1);
            }
            out.push('\n');
            pad(out, indent);
            out.push(']');
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in obj.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                pad(out, indent + 1);
                if format == Format::Jsonv && is_identifier(key) {
                    out.push_str(key);
                } else {
                    encode_string(out, key);
                }
                out.push_str(": ");
                encode_value(out, item, format, indent + 1);
            }
            out.push('\n');
            pad(out, indent);
            out.push('}');
        }
    }
}

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

fn encode_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use num_bigint::BigInt;

    fn sample() -> Value {
        let mut server = IndexMap::new();
        server.insert("port".to_string(), Value::from(8080.0));
        server.insert("two words".to_string(), Value::from("a\"b\n"));
        let mut root = IndexMap::new();
        root.insert("server".to_string(), Value::Object(server));
        root.insert(
            "ids".to_string(),
            Value::Array(vec![Value::from(BigInt::from(12)), Value::Null]),
        );
        Value::Object(root)
    }

    #[test]
    fn test_encode_jsonv() {
        assert_eq!(
            encode(&sample(), Format::Jsonv),
            "{\n  server: {\n    port: 8080,\n    \"two words\": \"a\\\"b\\n\"\n  },\n  ids: [\n    12n,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn test_encode_json() {
        assert_eq!(
            encode(&sample(), Format::Json),
            "{\n  \"server\": {\n    \"port\": 8080,\n    \"two words\": \"a\\\"b\\n\"\n  },\n  \"ids\": [\n    12,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn test_non_finite_numbers() {
        let value = Value::Array(vec![Value::from(f64::NAN), Value::from(f64::NEG_INFINITY)]);
        assert_eq!(encode(&value, Format::Jsonv), "[\n  NaN,\n  -Infinity\n]");
        assert_eq!(encode(&value, Format::Json), "[\n  null,\n  null\n]");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8080.0), "8080");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(123456789012345680000.0), "123456789012345680000");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_large_whole_floats_stay_floats() {
        let value = Value::Array(vec![
            Value::from(1e20),
            Value::from(9007199254740992.0),
            Value::from(-9007199254740991.0),
        ]);
        assert_eq!(
            encode(&value, Format::Jsonv),
            "[\n  1e+20,\n  9.007199254740992e+15,\n  -9007199254740991\n]"
        );
        assert_eq!(
            encode(&value, Format::Json),
            "[\n  100000000000000000000,\n  9007199254740992,\n  -9007199254740991\n]"
        );

        let strict = crate::ParseOptions {
            strict_big_int: true,
            ..crate::ParseOptions::default()
        };
        let rendered = encode(&value, Format::Jsonv);
        assert_eq!(crate::parse(&rendered).unwrap(), value);
        assert_eq!(
            crate::parse_with_options(&rendered, &strict).unwrap().value,
            value
        );
    }

    #[test]
    fn test_control_characters_escaped() {
        assert_eq!(
            encode(&Value::from("\u{1}\t"), Format::Json),
            "\"\\u0001\\t\""
        );
    }
}
