//! Parse options.

use serde::{Deserialize, Serialize};

use crate::dialect::{DialectConfig, Mode, Year};

/// Default limit on object and array nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do when an object repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeys {
    /// The later value replaces the earlier one, keeping the earlier position.
    #[default]
    LastWins,
    /// Report a syntax error at the repeated key.
    Error,
}

/// Options accepted by [`parse_with_options`](crate::parse_with_options).
///
/// Deserializes from a camelCase object in which every field is optional,
/// e.g. `{"year": 2020, "mode": "json5", "tolerant": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    pub year: Year,
    /// Reject unsuffixed integers outside the safe range instead of
    /// widening them to BigInt.
    pub strict_big_int: bool,
    pub mode: Mode,
    /// Keep comments in [`Document::comments`](crate::Document::comments).
    pub preserve_comments: bool,
    /// Collect every error instead of stopping at the first.
    pub tolerant: bool,
    pub duplicate_keys: DuplicateKeys,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            year: Year::LATEST,
            strict_big_int: false,
            mode: Mode::Jsonv,
            preserve_comments: false,
            tolerant: false,
            duplicate_keys: DuplicateKeys::LastWins,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Options for `mode` with everything else at its default.
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// The lexical subset of these options.
    pub fn dialect(&self) -> DialectConfig {
        DialectConfig {
            year: self.year,
            strict_big_int: self.strict_big_int,
            mode: self.mode,
            tolerant: self.tolerant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.year, Year::Es2022);
        assert_eq!(options.mode, Mode::Jsonv);
        assert_eq!(options.max_depth, 128);
        assert!(!options.tolerant);
        assert_eq!(options.dialect(), DialectConfig::default());
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let options: ParseOptions = serde_json::from_str(
            r#"{"year": 2020, "strictBigInt": true, "mode": "json5", "duplicateKeys": "error"}"#,
        )
        .unwrap();
        assert_eq!(options.year, Year::Es2020);
        assert!(options.strict_big_int);
        assert_eq!(options.mode, Mode::Json5);
        assert_eq!(options.duplicate_keys, DuplicateKeys::Error);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_year_accepts_names_and_editions() {
        let by_name: ParseOptions = serde_json::from_str(r#"{"year": "es5"}"#).unwrap();
        assert_eq!(by_name.year, Year::Es5);
        let by_edition: ParseOptions = serde_json::from_str(r#"{"year": 6}"#).unwrap();
        assert_eq!(by_edition.year, Year::Es2015);
        assert!(serde_json::from_str::<ParseOptions>(r#"{"year": "es4"}"#).is_err());
        assert!(serde_json::from_str::<ParseOptions>(r#"{"mode": "yaml"}"#).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let options = ParseOptions {
            year: Year::Es2021,
            tolerant: true,
            ..ParseOptions::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["year"], 2021);
        assert_eq!(json["mode"], "jsonv");
        assert_eq!(json["duplicateKeys"], "last-wins");
        let back: ParseOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, options);
    }
}
