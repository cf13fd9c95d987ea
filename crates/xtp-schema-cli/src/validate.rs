//! Schema validation as seen by a host: text in, `{valid, errors, warnings}` out

use serde::Serialize;
use tracing::{info, warn};
use xtp_schema_core::{ValidationError, XtpSchema};
use xtp_schema_parser::{decode_str, parse, Format};

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<XtpSchema>,
}

impl SchemaValidationResult {
    fn invalid(errors: Vec<ValidationError>, warnings: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
            warnings,
            schema: None,
        }
    }
}

/// Decode, parse and normalize a document, never failing
///
/// Text that cannot be decoded at all is reported as a single error at `#`.
pub fn validate_schema(text: &str, format: Format) -> SchemaValidationResult {
    let raw = match decode_str(text, format) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Document could not be decoded: {}", err);
            return SchemaValidationResult::invalid(
                vec![ValidationError::structural(err.to_string(), "#")],
                Vec::new(),
            );
        }
    };

    match parse(&raw) {
        Ok(normalized) => {
            for warning in &normalized.warnings {
                warn!("{}: {}", warning.path, warning.message);
            }
            info!(
                "Schema is valid ({} exports, {} imports, {} schemas)",
                normalized.schema.exports.len(),
                normalized.schema.imports.len(),
                normalized.schema.schemas.len()
            );
            SchemaValidationResult {
                valid: true,
                errors: Vec::new(),
                warnings: normalized.warnings,
                schema: Some(normalized.schema),
            }
        }
        Err(err) => {
            info!("Schema is invalid: {}", err);
            SchemaValidationResult::invalid(err.errors, err.warnings)
        }
    }
}

/// Whether the document is valid and declares host imports
pub fn has_imports(text: &str, format: Format) -> bool {
    let result = validate_schema(text, format);
    result.valid && result.schema.is_some_and(|schema| schema.has_imports())
}
