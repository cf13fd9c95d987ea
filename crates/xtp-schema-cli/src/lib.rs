//! Library interface for the xtp-schema command line

pub mod context;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use xtp_schema_parser::Format;

pub use context::{load_context, XtpContext, XtpProject};
pub use validate::{has_imports, validate_schema, SchemaValidationResult};

/// Read a schema file, resolving `Format::Auto` from its extension
pub fn read_document(path: &Path, format: Format) -> Result<(String, Format)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;

    let format = match format {
        Format::Auto => path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Format::from_extension)
            .unwrap_or(Format::Auto),
        explicit => explicit,
    };
    Ok((text, format))
}
