//! Text entry points: decode JSON or YAML, then parse and normalize

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::ParserError;
use crate::normalizer::Normalized;

/// Text encoding of a schema document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// JSON when the text looks like a JSON object, YAML otherwise
    #[default]
    Auto,
    Json,
    Yaml,
}

impl Format {
    /// Guess the format from a file extension
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Format::Json,
            "yaml" | "yml" => Format::Yaml,
            _ => Format::Auto,
        }
    }
}

impl FromStr for Format {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Format::Auto),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(ParserError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Auto => write!(f, "auto"),
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}

/// Decode text into a raw document tree without validating it
pub fn decode_str(text: &str, format: Format) -> Result<Value, ParserError> {
    let format = match format {
        Format::Auto if text.trim_start().starts_with('{') => Format::Json,
        Format::Auto => Format::Yaml,
        explicit => explicit,
    };
    debug!(%format, bytes = text.len(), "decoding document");

    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        _ => Ok(serde_yaml::from_str(text)?),
    }
}

pub fn parse_json_str(text: &str) -> Result<Normalized, ParserError> {
    parse_str(text, Format::Json)
}

pub fn parse_yaml_str(text: &str) -> Result<Normalized, ParserError> {
    parse_str(text, Format::Yaml)
}

/// Decode, parse and normalize a document held in memory
pub fn parse_str(text: &str, format: Format) -> Result<Normalized, ParserError> {
    let raw = decode_str(text, format)?;
    Ok(crate::parse(&raw)?)
}
