//! Encoders for formats outside the JSON family.

pub mod toml;
pub mod yaml;
