//! Intermediate representation handed to code generators
//!
//! The IR owns every schema in a single ordered registry. A `$ref` is stored as
//! a [`SchemaRef`] holding the original pointer string and, once resolved, the
//! [`SchemaId`] of its target, so schemas that point at each other never form
//! an ownership cycle.

use crate::error::CoreError;
use crate::types::{MimeType, XtpFormat, XtpNormalizedType, XtpType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a schema in [`XtpSchema::schemas`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(pub usize);

/// Prefix every schema pointer must start with
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Extract the schema name from a `#/components/schemas/<name>` pointer
pub fn parse_schema_ref(path: &str) -> Result<&str, CoreError> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        ["#", "components", "schemas", name] if !name.is_empty() => Ok(*name),
        _ => Err(CoreError::InvalidReference(path.to_string())),
    }
}

/// A `$ref` to a named schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    /// Pointer as written in the document
    pub path: String,
    /// Registry entry, filled in by the normalizer
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<SchemaId>,
}

impl SchemaRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: None,
        }
    }

    pub fn to_schema(name: &str) -> Self {
        Self::new(format!("{}{}", SCHEMA_REF_PREFIX, name))
    }

    pub fn schema_name(&self) -> Result<&str, CoreError> {
        parse_schema_ref(&self.path)
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

/// Fields shared by every node that can carry type information:
/// schemas, properties, parameters, array items and map values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedNode {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<XtpType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub format: Option<XtpFormat>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<Box<TypedNode>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub additional_properties: Option<Box<TypedNode>>,
    /// Inline object members in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub properties: Vec<Property>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none", default)]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none", default)]
    pub schema_ref: Option<SchemaRef>,
    /// Derived by the normalizer
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub xtp_type: Option<XtpNormalizedType>,
}

impl TypedNode {
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }

    pub fn is_date_time(&self) -> bool {
        self.ty == Some(XtpType::String) && self.format == Some(XtpFormat::DateTime)
    }

    /// Enum values that are strings, in order
    pub fn enum_strings(&self) -> Vec<&str> {
        self.enum_values
            .iter()
            .flatten()
            .filter_map(|v| v.as_str())
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A named member of an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Derived from the owning object's `required` list
    pub required: bool,
    #[serde(flatten)]
    pub node: TypedNode,
}

impl Property {
    pub fn has_comment(&self) -> bool {
        self.node.description.is_some() || self.node.schema_ref.is_some()
    }
}

/// Input or output of a boundary function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "contentType")]
    pub content_type: MimeType,
    #[serde(flatten)]
    pub node: TypedNode,
}

impl Parameter {
    pub fn is_json_encoded(&self) -> bool {
        self.content_type == MimeType::Json
    }

    pub fn is_utf8_encoded(&self) -> bool {
        self.content_type == MimeType::Utf8Text
    }

    pub fn has_comment(&self) -> bool {
        self.node.description.is_some() || self.node.schema_ref.is_some()
    }
}

/// A named, reusable type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
    #[serde(flatten)]
    pub node: TypedNode,
}

impl Schema {
    pub fn properties(&self) -> &[Property] {
        &self.node.properties
    }

    pub fn is_enum(&self) -> bool {
        self.node.enum_values.is_some()
    }

    pub fn xtp_type(&self) -> Option<&XtpNormalizedType> {
        self.node.xtp_type.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSample {
    pub lang: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
}

/// A boundary function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub code_samples: Vec<CodeSample>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub input: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<Parameter>,
}

/// Host functions have the same shape as exports
pub type Import = Export;

impl Export {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Code samples for `lang`, compared case-insensitively
    pub fn code_samples(&self, lang: &str) -> Vec<&CodeSample> {
        self.code_samples
            .iter()
            .filter(|s| s.lang.eq_ignore_ascii_case(lang))
            .collect()
    }

    pub fn has_comment(&self) -> bool {
        self.description.is_some()
            || self.input.as_ref().is_some_and(Parameter::has_comment)
            || self.output.as_ref().is_some_and(Parameter::has_comment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "v0")]
    V0,
    #[serde(rename = "v1")]
    V1,
}

/// The normalized document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XtpSchema {
    pub version: Version,
    pub exports: Vec<Export>,
    pub imports: Vec<Import>,
    pub schemas: IndexMap<String, Schema>,
}

impl XtpSchema {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            exports: Vec::new(),
            imports: Vec::new(),
            schemas: IndexMap::new(),
        }
    }

    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get_index(id.0).map(|(_, schema)| schema)
    }

    pub fn schema_id(&self, name: &str) -> Option<SchemaId> {
        self.schemas.get_index_of(name).map(SchemaId)
    }

    /// The schema a resolved `$ref` points at
    pub fn resolve(&self, schema_ref: &SchemaRef) -> Result<&Schema, CoreError> {
        schema_ref
            .target
            .and_then(|id| self.schema(id))
            .ok_or_else(|| CoreError::UnresolvedReference(schema_ref.path.clone()))
    }

    pub fn has_imports(&self) -> bool {
        !self.imports.is_empty()
    }

    /// Whether a node can be passed without structured encoding.
    ///
    /// Nodes without a `$ref` are primitive. A `$ref` is primitive when it points
    /// at an enum (encoded as a string) or at a schema without properties.
    pub fn is_primitive(&self, node: &TypedNode) -> bool {
        match &node.schema_ref {
            None => true,
            Some(schema_ref) => match self.resolve(schema_ref) {
                Ok(target) => target.is_enum() || target.properties().is_empty(),
                Err(_) => false,
            },
        }
    }
}
