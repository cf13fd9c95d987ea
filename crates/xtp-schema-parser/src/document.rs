//! Typed view of a raw schema document
//!
//! These structs mirror the document exactly as written: `$ref`s are still
//! strings, properties are still keyed maps and nothing is derived. The
//! structural validator checks the untyped tree first; deserializing into
//! these types only gives the normalizer something convenient to walk.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use xtp_schema_core::ir::CodeSample;
use xtp_schema_core::types::{MimeType, XtpFormat, XtpType};

/// Document versions the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentVersion {
    /// Flat list of export names
    V0,
    /// Schemas, exports and imports; shape may still change
    V1Draft,
    V1,
}

impl DocumentVersion {
    pub fn parse(version: &str) -> Option<Self> {
        match version {
            "v0" => Some(DocumentVersion::V0),
            "v1-draft" => Some(DocumentVersion::V1Draft),
            "v1" => Some(DocumentVersion::V1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVersion::V0 => "v0",
            DocumentVersion::V1Draft => "v1-draft",
            DocumentVersion::V1 => "v1",
        }
    }

    pub fn is_draft(&self) -> bool {
        self.as_str().ends_with("-draft")
    }
}

/// A parsed document, tagged by version
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    V0(V0Document),
    V1(V1Document),
}

impl Document {
    pub fn version(&self) -> &str {
        match self {
            Document::V0(doc) => &doc.version,
            Document::V1(doc) => &doc.version,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct V0Document {
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct V1Document {
    pub version: String,
    #[serde(default, deserialize_with = "named_entries")]
    pub exports: IndexMap<String, RawExport>,
    #[serde(default, deserialize_with = "named_entries")]
    pub imports: IndexMap<String, RawExport>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: RawComponents,
}

impl V1Document {
    pub fn schemas(&self) -> &IndexMap<String, RawNode> {
        &self.components.schemas
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawComponents {
    #[serde(default, deserialize_with = "named_entries")]
    pub schemas: IndexMap<String, RawNode>,
}

/// An export or import as written
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExport {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code_samples: Vec<CodeSample>,
    #[serde(default)]
    pub input: Option<RawParameter>,
    #[serde(default)]
    pub output: Option<RawParameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawParameter {
    #[serde(rename = "contentType")]
    pub content_type: MimeType,
    #[serde(flatten)]
    pub node: RawNode,
}

/// Any node that may carry inline type information
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(rename = "type", default)]
    pub ty: Option<XtpType>,
    #[serde(default)]
    pub format: Option<XtpFormat>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub items: Option<Box<RawNode>>,
    #[serde(default, deserialize_with = "map_values")]
    pub additional_properties: Option<Box<RawNode>>,
    #[serde(default, deserialize_with = "named_entries")]
    pub properties: IndexMap<String, RawNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
}

impl RawNode {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// `null` deserializes to the default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `additionalProperties` may be a node or a flag. `true` allows values of any
/// type; `false` and `null` declare no map values at all.
fn map_values<'de, D>(deserializer: D) -> Result<Option<Box<RawNode>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => Ok(None),
        Some(serde_json::Value::Bool(true)) => Ok(Some(Box::default())),
        Some(node) => RawNode::deserialize(node)
            .map(|node| Some(Box::new(node)))
            .map_err(D::Error::custom),
    }
}

/// A user-keyed map whose entries may be left empty (`name:` in YAML)
fn named_entries<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let entries = Option::<IndexMap<String, Option<T>>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|(name, entry)| (name, entry.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_parse() {
        assert_eq!(DocumentVersion::parse("v1-draft"), Some(DocumentVersion::V1Draft));
        assert!(DocumentVersion::V1Draft.is_draft());
        assert!(!DocumentVersion::V1.is_draft());
        assert_eq!(DocumentVersion::parse("v2"), None);
    }

    #[test]
    fn test_v1_document_keeps_declaration_order() {
        let doc: V1Document = serde_json::from_value(json!({
            "version": "v1-draft",
            "exports": { "zeta": null, "alpha": {} },
            "components": {
                "schemas": {
                    "Thing": {
                        "properties": {
                            "z": { "type": "string" },
                            "a": { "type": "integer", "format": "int32" }
                        },
                        "required": ["a"]
                    }
                }
            }
        }))
        .unwrap();

        let names: Vec<&str> = doc.exports.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha"]);

        let thing = &doc.schemas()["Thing"];
        let props: Vec<&str> = thing.properties.keys().map(String::as_str).collect();
        assert_eq!(props, ["z", "a"]);
        assert!(thing.is_required("a"));
        assert!(!thing.is_required("z"));
        assert_eq!(thing.properties["a"].format, Some(XtpFormat::Int32));
    }

    #[test]
    fn test_parameter_flattens_node() {
        let param: RawParameter = serde_json::from_value(json!({
            "contentType": "application/json",
            "$ref": "#/components/schemas/Fruit",
            "description": "fruit to eat"
        }))
        .unwrap();
        assert_eq!(param.content_type, MimeType::Json);
        assert_eq!(param.node.reference.as_deref(), Some("#/components/schemas/Fruit"));
        assert_eq!(param.node.description.as_deref(), Some("fruit to eat"));
    }

    #[test]
    fn test_missing_components_default_to_empty() {
        let doc: V1Document = serde_json::from_value(json!({ "version": "v1" })).unwrap();
        assert!(doc.schemas().is_empty());
        assert!(doc.imports.is_empty());
    }
}
