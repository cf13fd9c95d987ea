//! Identifier grammar for every name declared in a schema document.
//!
//! Export, import, schema and property names, as well as enum values, end up
//! as symbols in generated code, so they must satisfy a grammar that is a
//! valid identifier in every supported target language.

use std::sync::OnceLock;

use regex::Regex;

/// The identifier grammar, as shown in diagnostics
pub const IDENTIFIER_PATTERN: &str = "^[a-zA-Z_$][a-zA-Z0-9_$]*$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"))
}

/// Whether `name` can be used as a generated symbol
///
/// # Examples
/// ```
/// use xtp_schema_core::naming::is_valid_identifier;
/// assert!(is_valid_identifier("ghost"));
/// assert!(is_valid_identifier("_private$"));
/// assert!(!is_valid_identifier("9lives"));
/// assert!(!is_valid_identifier("kebab-case"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Diagnostic message for a name that fails the grammar
pub fn invalid_identifier_message(name: &str) -> String {
    format!(
        "Invalid identifier: \"{}\". Must match /{}/",
        name, IDENTIFIER_PATTERN
    )
}
