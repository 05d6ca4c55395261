//! Dialect selection.
//!
//! A dialect is the combination of a [`Mode`] (which family of syntax is
//! accepted at all) and a target [`Year`] (which ECMAScript-era lexical
//! forms are recognized). Every optional piece of syntax is a [`Feature`],
//! and the legality of each feature is decided by one lookup in [`GATES`].
//! The lexer and the parser both go through [`DialectConfig::check`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, SyntaxErrorKind};
use crate::scanner::Span;

/// Target ECMAScript edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "YearRepr", into = "u16")]
pub enum Year {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
}

impl Year {
    /// The newest supported edition.
    pub const LATEST: Year = Year::Es2022;

    const ALL: [Year; 9] = [
        Year::Es5,
        Year::Es2015,
        Year::Es2016,
        Year::Es2017,
        Year::Es2018,
        Year::Es2019,
        Year::Es2020,
        Year::Es2021,
        Year::Es2022,
    ];

    /// Calendar year of the edition.
    pub fn number(self) -> u16 {
        match self {
            Year::Es5 => 2009,
            Year::Es2015 => 2015,
            Year::Es2016 => 2016,
            Year::Es2017 => 2017,
            Year::Es2018 => 2018,
            Year::Es2019 => 2019,
            Year::Es2020 => 2020,
            Year::Es2021 => 2021,
            Year::Es2022 => 2022,
        }
    }

    /// Map an edition number (`5`, `6`..) or a calendar year to a `Year`.
    ///
    /// Calendar years between editions round down; years past the newest
    /// edition map to [`Year::LATEST`].
    pub fn from_number(n: u16) -> Option<Year> {
        match n {
            3 | 5 => Some(Year::Es5),
            6..=13 => Some(Year::ALL[usize::from(n - 5)]),
            2009..=2014 => Some(Year::Es5),
            2015.. => Some(
                Year::ALL
                    .iter()
                    .rev()
                    .copied()
                    .find(|y| y.number() <= n)
                    .unwrap_or(Year::LATEST),
            ),
            _ => None,
        }
    }
}

impl Default for Year {
    fn default() -> Self {
        Year::LATEST
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Es5 => write!(f, "es5"),
            year => write!(f, "es{}", year.number()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown ECMAScript year \"{0}\"")]
pub struct YearParseError(String);

impl FromStr for Year {
    type Err = YearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "latest" {
            return Ok(Year::LATEST);
        }
        let digits = lower.strip_prefix("es").unwrap_or(&lower);
        digits
            .parse::<u16>()
            .ok()
            .and_then(Year::from_number)
            .ok_or_else(|| YearParseError(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(u16),
    Name(String),
}

impl TryFrom<YearRepr> for Year {
    type Error = YearParseError;

    fn try_from(repr: YearRepr) -> Result<Self, Self::Error> {
        match repr {
            YearRepr::Number(n) => Year::from_number(n).ok_or_else(|| YearParseError(n.to_string())),
            YearRepr::Name(name) => name.parse(),
        }
    }
}

impl From<Year> for u16 {
    fn from(year: Year) -> u16 {
        year.number()
    }
}

/// Syntax family, ordered from strictest to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// RFC 8259 JSON.
    StrictJson,
    /// JSON5.
    Json5,
    /// JSON5 plus references and templates.
    #[default]
    Jsonv,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::StrictJson => "strict-json",
            Mode::Json5 => "json5",
            Mode::Jsonv => "jsonv",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mode \"{0}\" (expected strict-json, json5 or jsonv)")]
pub struct ModeParseError(String);

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict-json" | "json" => Ok(Mode::StrictJson),
            "json5" => Ok(Mode::Json5),
            "jsonv" => Ok(Mode::Jsonv),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

/// Optional syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Comments,
    TrailingComma,
    UnquotedKey,
    SingleQuotedString,
    ControlCharacter,
    ExtendedEscape,
    ExtendedWhitespace,
    HexLiteral,
    LooseDecimalPoint,
    PlusSign,
    NonFiniteNumber,
    BinaryLiteral,
    OctalLiteral,
    CodePointEscape,
    LegacyOctalEscape,
    BigIntLiteral,
    NumericSeparator,
    TemplateLiteral,
    Reference,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::Comments => "Comment",
            Feature::TrailingComma => "Trailing comma",
            Feature::UnquotedKey => "Unquoted key",
            Feature::SingleQuotedString => "Single-quoted string",
            Feature::ControlCharacter => "Unescaped control character",
            Feature::ExtendedEscape => "Escape sequence",
            Feature::ExtendedWhitespace => "Whitespace character",
            Feature::HexLiteral => "Hexadecimal literal",
            Feature::LooseDecimalPoint => "Leading or trailing decimal point",
            Feature::PlusSign => "Explicit plus sign",
            Feature::NonFiniteNumber => "Infinity or NaN",
            Feature::BinaryLiteral => "Binary literal",
            Feature::OctalLiteral => "Octal literal",
            Feature::CodePointEscape => "Unicode code point escape",
            Feature::LegacyOctalEscape => "Legacy octal escape",
            Feature::BigIntLiteral => "BigInt literal",
            Feature::NumericSeparator => "Numeric separator",
            Feature::TemplateLiteral => "Template literal",
            Feature::Reference => "Reference",
        })
    }
}

/// When a feature is legal.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    pub feature: Feature,
    /// Least permissive mode accepting the feature.
    pub mode: Mode,
    /// First edition accepting the feature.
    pub since: Option<Year>,
    /// First edition no longer accepting the feature.
    pub before: Option<Year>,
}

impl Gate {
    const fn new(feature: Feature, mode: Mode) -> Self {
        Self {
            feature,
            mode,
            since: None,
            before: None,
        }
    }

    const fn since(mut self, year: Year) -> Self {
        self.since = Some(year);
        self
    }

    const fn before(mut self, year: Year) -> Self {
        self.before = Some(year);
        self
    }

    fn admits(&self, mode: Mode, year: Year) -> bool {
        mode >= self.mode
            && self.since.map_or(true, |since| year >= since)
            && self.before.map_or(true, |before| year < before)
    }
}

/// Every optional feature and the dialects that accept it.
pub const GATES: &[Gate] = &[
    Gate::new(Feature::Comments, Mode::Json5),
    Gate::new(Feature::TrailingComma, Mode::Json5),
    Gate::new(Feature::UnquotedKey, Mode::Json5),
    Gate::new(Feature::SingleQuotedString, Mode::Json5),
    Gate::new(Feature::ControlCharacter, Mode::Json5),
    Gate::new(Feature::ExtendedEscape, Mode::Json5),
    Gate::new(Feature::ExtendedWhitespace, Mode::Json5),
    Gate::new(Feature::HexLiteral, Mode::Json5),
    Gate::new(Feature::LooseDecimalPoint, Mode::Json5),
    Gate::new(Feature::PlusSign, Mode::Json5),
    Gate::new(Feature::NonFiniteNumber, Mode::Json5),
    Gate::new(Feature::BinaryLiteral, Mode::Json5).since(Year::Es2015),
    Gate::new(Feature::OctalLiteral, Mode::Json5).since(Year::Es2015),
    Gate::new(Feature::CodePointEscape, Mode::Json5).since(Year::Es2015),
    Gate::new(Feature::LegacyOctalEscape, Mode::Json5).before(Year::Es2015),
    Gate::new(Feature::BigIntLiteral, Mode::Json5).since(Year::Es2020),
    Gate::new(Feature::NumericSeparator, Mode::Json5).since(Year::Es2021),
    Gate::new(Feature::TemplateLiteral, Mode::Jsonv).since(Year::Es2015),
    Gate::new(Feature::Reference, Mode::Jsonv),
];

/// Immutable dialect settings shared by the lexer and the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectConfig {
    pub year: Year,
    pub strict_big_int: bool,
    pub mode: Mode,
    pub tolerant: bool,
}

impl DialectConfig {
    /// Whether the dialect accepts `feature`.
    pub fn allows(&self, feature: Feature) -> bool {
        GATES
            .iter()
            .find(|gate| gate.feature == feature)
            .map_or(false, |gate| gate.admits(self.mode, self.year))
    }

    /// Fail with `FeatureDisabled` at `span` unless `feature` is accepted.
    pub fn check(&self, feature: Feature, span: Span) -> Result<(), Error> {
        if self.allows(feature) {
            Ok(())
        } else {
            Err(Error::syntax(SyntaxErrorKind::FeatureDisabled(feature), span))
        }
    }
}
