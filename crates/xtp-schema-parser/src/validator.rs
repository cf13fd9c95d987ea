//! Structural parser
//!
//! Checks a decoded document against the shape of its declared version and
//! produces the typed [`Document`] view. Nothing is mutated and nothing fails
//! fast: every problem is recorded with the pointer to the node that caused it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};
use xtp_schema_core::ir::parse_schema_ref;
use xtp_schema_core::naming::{invalid_identifier_message, is_valid_identifier};
use xtp_schema_core::{Diagnostics, Location, MimeType, ValidationError, XtpFormat, XtpType};

use crate::document::{Document, DocumentVersion};

/// Outcome of [`parse_document`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    /// Typed view of the document, absent when the version is unknown or the
    /// shape could not be decoded
    pub doc: Option<Document>,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ParseResult {
    pub fn is_valid(&self) -> bool {
        self.doc.is_some() && self.errors.is_empty()
    }
}

/// Validate a raw document and decode it into its typed view
///
/// An unknown `version` is the only fatal case: it yields a single error at
/// `#/version` and nothing else is inspected.
#[instrument(skip(raw))]
pub fn parse_document(raw: &Value) -> ParseResult {
    let version_value = raw.get("version");
    let Some(version) = version_value
        .and_then(Value::as_str)
        .and_then(DocumentVersion::parse)
    else {
        debug!("unrecognized document version");
        return ParseResult {
            doc: None,
            errors: vec![ValidationError::structural(
                format!("version property not valid: {}", describe(version_value)),
                "#/version",
            )],
            warnings: Vec::new(),
        };
    };

    debug!(version = version.as_str(), "parsing document");
    let mut diagnostics = Diagnostics::new();
    if version.is_draft() {
        diagnostics.warn(ValidationError::draft_version(
            format!(
                "Version {} is a draft version and may be exposed to breaking changes until the final version is published",
                version.as_str()
            ),
            "#/version",
        ));
    }

    let doc = match version {
        DocumentVersion::V0 => decode(raw, &mut diagnostics).map(Document::V0),
        DocumentVersion::V1Draft | DocumentVersion::V1 => {
            StructuralValidator::new(raw, &mut diagnostics).validate();
            decode(raw, &mut diagnostics).map(Document::V1)
        }
    };

    let (errors, warnings) = diagnostics.into_parts();
    debug!(
        errors = errors.len(),
        warnings = warnings.len(),
        "document parsed"
    );
    ParseResult {
        doc,
        errors,
        warnings,
    }
}

/// Deserialize the typed view. A decoding failure is only reported when the
/// structural walk found nothing, since the walk's messages are more precise.
fn decode<T: DeserializeOwned>(raw: &Value, diagnostics: &mut Diagnostics) -> Option<T> {
    match T::deserialize(raw) {
        Ok(doc) => Some(doc),
        Err(err) => {
            if diagnostics.has_errors() {
                debug!(error = %err, "typed decoding failed after structural errors");
            } else {
                diagnostics.error(ValidationError::structural(err.to_string(), "#"));
            }
            None
        }
    }
}

/// Render a raw value for a diagnostic: strings bare, anything else as JSON
pub(crate) fn describe(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// `additionalProperties: false` declares no map values, the same as leaving it out
fn declares_map_values(fields: &Map<String, Value>) -> bool {
    present(fields.get("additionalProperties")).is_some_and(|v| *v != Value::Bool(false))
}

/// Walks an untyped v1 document, checking every node that can carry type
/// information
struct StructuralValidator<'a> {
    doc: &'a Value,
    schema_names: Vec<&'a str>,
    location: Location,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> StructuralValidator<'a> {
    fn new(doc: &'a Value, diagnostics: &'a mut Diagnostics) -> Self {
        let schema_names = doc
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .map(|schemas| schemas.keys().map(String::as_str).collect())
            .unwrap_or_default();

        Self {
            doc,
            schema_names,
            location: Location::root(),
            diagnostics,
        }
    }

    fn validate(mut self) {
        let doc = self.doc;
        self.validate_root_names(doc);
        self.validate_node(doc, true);
    }

    fn record(&mut self, message: impl Into<String>) {
        let path = self.location.to_string();
        self.diagnostics
            .error(ValidationError::structural(message, path));
    }

    fn record_at(&mut self, message: impl Into<String>, suffix: &[&str]) {
        let path = self.location.with_suffix(suffix);
        self.diagnostics
            .error(ValidationError::structural(message, path));
    }

    fn check_identifier(&mut self, name: &str, suffix: &[&str]) {
        if !is_valid_identifier(name) {
            self.record_at(invalid_identifier_message(name), suffix);
        }
    }

    /// Names declared at the root and the encodings of boundary parameters
    fn validate_root_names(&mut self, doc: &Value) {
        for section in ["exports", "imports"] {
            let Some(entries) = doc.get(section).and_then(Value::as_object) else {
                continue;
            };
            for (name, entry) in entries {
                self.check_identifier(name, &[section, name]);
                self.check_content_types(section, name, entry);
            }
        }

        for name in self.schema_names.clone() {
            self.check_identifier(name, &["components", "schemas", name]);
        }
    }

    fn check_content_types(&mut self, section: &str, name: &str, entry: &Value) {
        for slot in ["input", "output"] {
            let Some(parameter) = present(entry.get(slot)) else {
                continue;
            };
            let content_type = parameter.get("contentType");
            let known = content_type
                .and_then(Value::as_str)
                .and_then(MimeType::parse)
                .is_some();
            if !known {
                let options: Vec<&str> = MimeType::ALL.iter().map(MimeType::as_str).collect();
                self.record_at(
                    format!(
                        "Invalid contentType {}. Options are: [{}]",
                        describe(content_type),
                        options.join(", ")
                    ),
                    &[section, name, slot, "contentType"],
                );
            }
        }
    }

    /// Whether the children of `key` are user-chosen names rather than fields
    /// of a typed node
    fn is_user_keyed(&self, key: &str, parent_typed: bool) -> bool {
        match self.location.segments() {
            [] => matches!(key, "exports" | "imports" | "components"),
            [components] if components == "components" => key == "schemas",
            _ => parent_typed && key == "properties",
        }
    }

    fn validate_node(&mut self, node: &Value, typed: bool) {
        let Value::Object(fields) = node else {
            return;
        };

        if typed {
            trace!(path = %self.location, "checking typed node");
            self.validate_typed_node(fields);
        }

        // list children (enum, required, codeSamples) hold no typed nodes
        for (key, child) in fields {
            if !child.is_object() {
                continue;
            }
            let child_typed = !self.is_user_keyed(key, typed);
            self.location.push(key.as_str());
            self.validate_node(child, child_typed);
            self.location.pop();
        }
    }

    fn validate_typed_node(&mut self, fields: &Map<String, Value>) {
        let ty = present(fields.get("type"));
        let declared_type = ty
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<XtpType>().ok());

        if let Some(ty) = ty {
            if !declared_type.is_some_and(|t| t.is_declarable()) {
                let options: Vec<String> = XtpType::DECLARABLE
                    .iter()
                    .map(|t| format!("'{}'", t))
                    .collect();
                self.record(format!(
                    "Invalid type '{}'. Options are: [{}]",
                    describe(Some(ty)),
                    options.join(", ")
                ));
            }
        }

        if let Some(format) = present(fields.get("format")) {
            let valid: &[XtpFormat] = declared_type.map(|t| t.valid_formats()).unwrap_or(&[]);
            let parsed = format.as_str().and_then(|s| s.parse::<XtpFormat>().ok());
            if !parsed.is_some_and(|f| valid.contains(&f)) {
                let options: Vec<&str> = valid.iter().map(XtpFormat::as_str).collect();
                self.record(format!(
                    "Invalid format {} for type {}. Valid formats are: [{}]",
                    describe(Some(format)),
                    describe(ty),
                    options.join(", ")
                ));
            }
        }

        match present(fields.get("properties")) {
            Some(Value::Object(properties)) if !properties.is_empty() => {
                self.validate_properties(fields, properties)
            }
            Some(Value::Object(_)) | None => {}
            Some(other) => self.record_at(
                format!("properties must be a map of names to definitions, got {}", other),
                &["properties"],
            ),
        }

        match present(fields.get("additionalProperties")) {
            None | Some(Value::Bool(_)) | Some(Value::Object(_)) => {}
            Some(other) => self.record_at(
                format!("additionalProperties must be a definition or a boolean, got {}", other),
                &["additionalProperties"],
            ),
        }

        if let Some(values) = present(fields.get("enum")) {
            match values.as_array() {
                Some(items) => {
                    for item in items {
                        match item.as_str() {
                            Some(value) => self.check_identifier(value, &["enum"]),
                            None => self.record(format!(
                                "Enum item must be a string: {}",
                                describe(Some(item))
                            )),
                        }
                    }
                }
                None => self.record_at(
                    format!("enum must be a list of strings, got {}", values),
                    &["enum"],
                ),
            }
        }

        if let Some(reference) = present(fields.get("$ref")) {
            self.validate_reference(reference);
        }
    }

    fn validate_properties(&mut self, fields: &Map<String, Value>, properties: &Map<String, Value>) {
        if declares_map_values(fields) {
            self.record(
                "We currently do not support objects with both fixed properties and additionalProperties",
            );
        }

        if let Some(required) = fields.get("required").and_then(Value::as_array) {
            for name in required {
                let defined = name.as_str().is_some_and(|n| properties.contains_key(n));
                if !defined {
                    self.record(format!(
                        "Property {} is marked as required but not defined",
                        describe(Some(name))
                    ));
                }
            }
        }

        for name in properties.keys() {
            self.check_identifier(name, &["properties", name]);
        }
    }

    fn validate_reference(&mut self, reference: &Value) {
        let Some(path) = reference.as_str() else {
            self.record_at(format!("Invalid $ref {}", reference), &["$ref"]);
            return;
        };

        match parse_schema_ref(path) {
            Ok(name) if self.schema_names.contains(&name) => {}
            Ok(name) => {
                let message = format!(
                    "Invalid $ref \"{}\". Cannot find schema \"{}\". Options are: [{}]",
                    path,
                    name,
                    self.schema_names.join(", ")
                );
                self.record_at(message, &["$ref"]);
            }
            Err(err) => self.record_at(err.to_string(), &["$ref"]),
        }
    }
}
