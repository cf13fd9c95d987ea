//! Diagnostics model shared by the parser and normalizer
//!
//! Every problem found in a document is a [`ValidationError`]: a message plus a
//! `#`-rooted pointer to the offending node. Phases accumulate them in a
//! [`Diagnostics`] collector instead of failing on the first problem, and the
//! caller receives a single [`NormalizeError`] exposing the full list.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid $ref \"{0}\"")]
    InvalidReference(String),

    #[error("Unresolved $ref \"{0}\"")]
    UnresolvedReference(String),
}

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad version tag, identifier, type/format pairing, `$ref` or property set
    #[default]
    Structural,
    /// Non-acyclic schema reference graph
    Cycle,
    /// Identifier collides with a target-language keyword (warning only)
    Keyword,
    /// Document uses a draft version (warning only)
    DraftVersion,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Structural => write!(f, "STRUCTURAL"),
            ErrorCategory::Cycle => write!(f, "CYCLE"),
            ErrorCategory::Keyword => write!(f, "KEYWORD"),
            ErrorCategory::DraftVersion => write!(f, "DRAFT_VERSION"),
        }
    }
}

/// A single diagnostic, serialized as `{message, path}`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// `#`-rooted, `/`-joined pointer to the offending node
    pub path: String,
    #[serde(skip)]
    pub category: ErrorCategory,
}

impl ValidationError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            category,
        }
    }

    pub fn structural(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Structural, message, path)
    }

    pub fn cycle(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Cycle, message, path)
    }

    pub fn keyword(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Keyword, message, path)
    }

    pub fn draft_version(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorCategory::DraftVersion, message, path)
    }

    pub fn is_cycle(&self) -> bool {
        self.category == ErrorCategory::Cycle
    }
}

/// Pointer into the document being checked
///
/// Walkers push a segment when descending into a child and pop it on the way
/// back out, so the current pointer is always available for a new diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    segments: Vec<String>,
}

impl Location {
    /// The document root, `#`
    pub fn root() -> Self {
        Self {
            segments: vec!["#".to_string()],
        }
    }

    /// A pointer rooted at `#` followed by `segments`
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut location = Self::root();
        location.segments.extend(segments.into_iter().map(Into::into));
        location
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Pop the last segment. The root is never removed.
    pub fn pop(&mut self) {
        if self.segments.len() > 1 {
            self.segments.pop();
        }
    }

    /// Segments below the root
    pub fn segments(&self) -> &[String] {
        &self.segments[1..]
    }

    /// Render the pointer with extra trailing segments, leaving `self` unchanged
    pub fn with_suffix(&self, suffix: &[&str]) -> String {
        let mut parts: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        parts.extend_from_slice(suffix);
        parts.join("/")
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Accumulates errors and warnings across a parse or normalize call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn warn(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Vec<ValidationError>, Vec<ValidationError>) {
        (self.errors, self.warnings)
    }

    /// Hand back `value` with the warnings, or raise every collected error
    pub fn into_result<T>(self, value: T) -> Result<(T, Vec<ValidationError>), NormalizeError> {
        if self.errors.is_empty() {
            Ok((value, self.warnings))
        } else {
            Err(NormalizeError {
                errors: self.errors,
                warnings: self.warnings,
            })
        }
    }
}

/// The single error raised when a document cannot be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.errors))]
pub struct NormalizeError {
    pub errors: Vec<ValidationError>,
    /// Warnings gathered before the failure
    pub warnings: Vec<ValidationError>,
}

impl NormalizeError {
    pub fn cycles(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.is_cycle())
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "Invalid document".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} other error(s))", first.message, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_push_pop() {
        let mut loc = Location::root();
        loc.push("components");
        loc.push("schemas");
        loc.push("Fruit");
        assert_eq!(loc.to_string(), "#/components/schemas/Fruit");
        assert_eq!(loc.with_suffix(&["$ref"]), "#/components/schemas/Fruit/$ref");
        assert_eq!(loc.segments().len(), 3);

        loc.pop();
        loc.pop();
        loc.pop();
        loc.pop();
        assert_eq!(loc.to_string(), "#");
    }

    #[test]
    fn test_location_from_segments() {
        let loc = Location::from_segments(["exports", "f", "input"]);
        assert_eq!(loc.to_string(), "#/exports/f/input");
        assert_eq!(loc.segments(), ["exports", "f", "input"]);
    }

    #[test]
    fn test_normalize_error_summary() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(ValidationError::structural("bad version", "#/version"));
        let one = diagnostics.into_result(()).unwrap_err();
        assert_eq!(one.to_string(), "bad version");

        let many = NormalizeError {
            errors: vec![
                ValidationError::structural("first", "#/a"),
                ValidationError::structural("second", "#/b"),
                ValidationError::cycle("third", "#/c"),
            ],
            warnings: Vec::new(),
        };
        assert_eq!(many.to_string(), "first (and 2 other error(s))");
        assert_eq!(many.cycles().count(), 1);
    }

    #[test]
    fn test_diagnostics_into_result() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(ValidationError::keyword("kw", "#/exports/type"));
        let (value, warnings) = diagnostics.clone().into_result(42).unwrap();
        assert_eq!(value, 42);
        assert_eq!(warnings.len(), 1);

        diagnostics.error(ValidationError::structural("oops", "#"));
        let err = diagnostics.into_result(42).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.warnings.len(), 1);
    }

    #[test]
    fn test_validation_error_serializes_message_and_path_only() {
        let err = ValidationError::cycle("Detected circular reference: A -> A", "#/components/schemas/A/$ref");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "Detected circular reference: A -> A",
                "path": "#/components/schemas/A/$ref"
            })
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Cycle.to_string(), "CYCLE");
        assert_eq!(ErrorCategory::DraftVersion.to_string(), "DRAFT_VERSION");
    }
}
