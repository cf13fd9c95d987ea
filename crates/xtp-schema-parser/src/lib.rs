//! Structural parser and normalizer for XTP schema documents

pub mod decode;
pub mod dependency_graph;
pub mod document;
pub mod error;
pub mod normalizer;
pub mod validator;

use serde_json::Value;
use tracing::instrument;
use xtp_schema_core::NormalizeError;

pub use decode::{decode_str, parse_json_str, parse_str, parse_yaml_str, Format};
pub use document::{Document, DocumentVersion};
pub use error::ParserError;
pub use normalizer::{normalize, Normalized};
pub use validator::{parse_document, ParseResult};

/// Parse and normalize a decoded document
///
/// Parser warnings come first in the returned list, followed by those raised
/// during normalization. On failure every diagnostic is raised together.
#[instrument(skip_all)]
pub fn parse(raw: &Value) -> Result<Normalized, NormalizeError> {
    let ParseResult {
        doc,
        errors,
        mut warnings,
    } = parse_document(raw);

    let doc = match doc {
        Some(doc) if errors.is_empty() => doc,
        _ => return Err(NormalizeError { errors, warnings }),
    };

    match normalize(doc) {
        Ok(mut normalized) => {
            warnings.append(&mut normalized.warnings);
            normalized.warnings = warnings;
            Ok(normalized)
        }
        Err(mut err) => {
            warnings.append(&mut err.warnings);
            err.warnings = warnings;
            Err(err)
        }
    }
}
