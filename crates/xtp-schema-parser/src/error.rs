use thiserror::Error;
use xtp_schema_core::NormalizeError;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Invalid(#[from] NormalizeError),
}

impl ParserError {
    /// Diagnostics carried by a schema that decoded but failed validation
    pub fn normalize_error(&self) -> Option<&NormalizeError> {
        match self {
            ParserError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}
