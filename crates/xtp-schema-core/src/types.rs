//! Type system: the schema-level `type`/`format` vocabulary and the
//! normalized type tree derived from it
//!
//! Schema authors describe values with a JSON-Schema-like `type` plus an
//! optional `format`. The normalizer folds those (together with `$ref`,
//! `enum`, `items`, `properties` and `additionalProperties`) into a closed
//! [`XtpNormalizedType`] tree which is what code generators match on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structural `type` of a typed node
///
/// Documents may only use the first seven; `Enum` and `Map` are derived by the
/// normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XtpType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Buffer,
    Enum,
    Map,
}

impl XtpType {
    /// Types a document is allowed to declare
    pub const DECLARABLE: [XtpType; 7] = [
        XtpType::String,
        XtpType::Number,
        XtpType::Integer,
        XtpType::Boolean,
        XtpType::Object,
        XtpType::Array,
        XtpType::Buffer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            XtpType::String => "string",
            XtpType::Number => "number",
            XtpType::Integer => "integer",
            XtpType::Boolean => "boolean",
            XtpType::Object => "object",
            XtpType::Array => "array",
            XtpType::Buffer => "buffer",
            XtpType::Enum => "enum",
            XtpType::Map => "map",
        }
    }

    pub fn is_declarable(&self) -> bool {
        Self::DECLARABLE.contains(self)
    }

    /// Formats that may accompany this type
    pub fn valid_formats(&self) -> &'static [XtpFormat] {
        match self {
            XtpType::String => &[XtpFormat::DateTime, XtpFormat::Byte],
            XtpType::Number => &[XtpFormat::Float, XtpFormat::Double],
            XtpType::Integer => &[
                XtpFormat::Int8,
                XtpFormat::Int16,
                XtpFormat::Int32,
                XtpFormat::Int64,
                XtpFormat::UInt8,
                XtpFormat::UInt16,
                XtpFormat::UInt32,
                XtpFormat::UInt64,
            ],
            XtpType::Boolean
            | XtpType::Object
            | XtpType::Array
            | XtpType::Buffer
            | XtpType::Enum
            | XtpType::Map => &[],
        }
    }
}

impl fmt::Display for XtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XtpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(XtpType::String),
            "number" => Ok(XtpType::Number),
            "integer" => Ok(XtpType::Integer),
            "boolean" => Ok(XtpType::Boolean),
            "object" => Ok(XtpType::Object),
            "array" => Ok(XtpType::Array),
            "buffer" => Ok(XtpType::Buffer),
            "enum" => Ok(XtpType::Enum),
            "map" => Ok(XtpType::Map),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XtpFormat {
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "byte")]
    Byte,
}

impl XtpFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            XtpFormat::Int8 => "int8",
            XtpFormat::Int16 => "int16",
            XtpFormat::Int32 => "int32",
            XtpFormat::Int64 => "int64",
            XtpFormat::UInt8 => "uint8",
            XtpFormat::UInt16 => "uint16",
            XtpFormat::UInt32 => "uint32",
            XtpFormat::UInt64 => "uint64",
            XtpFormat::Float => "float",
            XtpFormat::Double => "double",
            XtpFormat::DateTime => "date-time",
            XtpFormat::Byte => "byte",
        }
    }
}

impl fmt::Display for XtpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XtpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" => Ok(XtpFormat::Int8),
            "int16" => Ok(XtpFormat::Int16),
            "int32" => Ok(XtpFormat::Int32),
            "int64" => Ok(XtpFormat::Int64),
            "uint8" => Ok(XtpFormat::UInt8),
            "uint16" => Ok(XtpFormat::UInt16),
            "uint32" => Ok(XtpFormat::UInt32),
            "uint64" => Ok(XtpFormat::UInt64),
            "float" => Ok(XtpFormat::Float),
            "double" => Ok(XtpFormat::Double),
            "date-time" => Ok(XtpFormat::DateTime),
            "byte" => Ok(XtpFormat::Byte),
            other => Err(other.to_string()),
        }
    }
}

/// Encoding of an export or import parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "text/plain; charset=utf-8")]
    Utf8Text,
    #[serde(rename = "application/x-binary")]
    Binary,
}

impl MimeType {
    pub const ALL: [MimeType; 3] = [MimeType::Json, MimeType::Utf8Text, MimeType::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Json => "application/json",
            MimeType::Utf8Text => "text/plain; charset=utf-8",
            MimeType::Binary => "application/x-binary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag of a normalized type, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XtpNormalizedKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "buffer")]
    Buffer,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "map")]
    Map,
    #[serde(rename = "jsobject")]
    FreeFormObject,
}

impl XtpNormalizedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            XtpNormalizedKind::String => "string",
            XtpNormalizedKind::Boolean => "boolean",
            XtpNormalizedKind::DateTime => "date-time",
            XtpNormalizedKind::Buffer => "buffer",
            XtpNormalizedKind::Int8 => "int8",
            XtpNormalizedKind::Int16 => "int16",
            XtpNormalizedKind::Int32 => "int32",
            XtpNormalizedKind::Int64 => "int64",
            XtpNormalizedKind::UInt8 => "uint8",
            XtpNormalizedKind::UInt16 => "uint16",
            XtpNormalizedKind::UInt32 => "uint32",
            XtpNormalizedKind::UInt64 => "uint64",
            XtpNormalizedKind::Float => "float",
            XtpNormalizedKind::Double => "double",
            XtpNormalizedKind::Object => "object",
            XtpNormalizedKind::Enum => "enum",
            XtpNormalizedKind::Array => "array",
            XtpNormalizedKind::Map => "map",
            XtpNormalizedKind::FreeFormObject => "jsobject",
        }
    }
}

impl fmt::Display for XtpNormalizedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a normalized type
///
/// Recursive cases own their children. A type never contains itself; any
/// self-reference has to go through a named schema, and the normalizer rejects
/// documents whose schemas reference each other in a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeShape {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "buffer")]
    Buffer,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "object")]
    Object {
        name: String,
        /// Property types in declaration order
        properties: Vec<XtpNormalizedType>,
    },
    #[serde(rename = "enum", rename_all = "camelCase")]
    Enum {
        name: String,
        element_type: Box<XtpNormalizedType>,
        values: Vec<String>,
    },
    #[serde(rename = "array", rename_all = "camelCase")]
    Array { element_type: Box<XtpNormalizedType> },
    #[serde(rename = "map", rename_all = "camelCase")]
    Map {
        key_type: Box<XtpNormalizedType>,
        value_type: Box<XtpNormalizedType>,
    },
    #[serde(rename = "jsobject")]
    FreeFormObject,
}

/// A node of the normalized type tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XtpNormalizedType {
    #[serde(flatten)]
    pub shape: TypeShape,
    #[serde(default)]
    pub nullable: bool,
}

impl From<TypeShape> for XtpNormalizedType {
    fn from(shape: TypeShape) -> Self {
        Self {
            shape,
            nullable: false,
        }
    }
}

impl XtpNormalizedType {
    pub fn string() -> Self {
        TypeShape::String.into()
    }

    pub fn boolean() -> Self {
        TypeShape::Boolean.into()
    }

    pub fn date_time() -> Self {
        TypeShape::DateTime.into()
    }

    pub fn buffer() -> Self {
        TypeShape::Buffer.into()
    }

    pub fn float() -> Self {
        TypeShape::Float.into()
    }

    pub fn double() -> Self {
        TypeShape::Double.into()
    }

    pub fn free_form_object() -> Self {
        TypeShape::FreeFormObject.into()
    }

    /// Integer of the given width and signedness. Unsupported widths fall back to 64 bits.
    pub fn integer(bits: u8, signed: bool) -> Self {
        let shape = match (bits, signed) {
            (8, true) => TypeShape::Int8,
            (16, true) => TypeShape::Int16,
            (32, true) => TypeShape::Int32,
            (8, false) => TypeShape::UInt8,
            (16, false) => TypeShape::UInt16,
            (32, false) => TypeShape::UInt32,
            (_, false) => TypeShape::UInt64,
            (_, true) => TypeShape::Int64,
        };
        shape.into()
    }

    pub fn object(name: impl Into<String>, properties: Vec<XtpNormalizedType>) -> Self {
        TypeShape::Object {
            name: name.into(),
            properties,
        }
        .into()
    }

    /// String enum; the element type is always `string`
    pub fn enumeration(name: impl Into<String>, values: Vec<String>) -> Self {
        TypeShape::Enum {
            name: name.into(),
            element_type: Box::new(Self::string()),
            values,
        }
        .into()
    }

    pub fn array(element_type: XtpNormalizedType) -> Self {
        TypeShape::Array {
            element_type: Box::new(element_type),
        }
        .into()
    }

    /// Map with string keys
    pub fn map(value_type: XtpNormalizedType) -> Self {
        TypeShape::Map {
            key_type: Box::new(Self::string()),
            value_type: Box::new(value_type),
        }
        .into()
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn kind(&self) -> XtpNormalizedKind {
        match &self.shape {
            TypeShape::String => XtpNormalizedKind::String,
            TypeShape::Boolean => XtpNormalizedKind::Boolean,
            TypeShape::DateTime => XtpNormalizedKind::DateTime,
            TypeShape::Buffer => XtpNormalizedKind::Buffer,
            TypeShape::Int8 => XtpNormalizedKind::Int8,
            TypeShape::Int16 => XtpNormalizedKind::Int16,
            TypeShape::Int32 => XtpNormalizedKind::Int32,
            TypeShape::Int64 => XtpNormalizedKind::Int64,
            TypeShape::UInt8 => XtpNormalizedKind::UInt8,
            TypeShape::UInt16 => XtpNormalizedKind::UInt16,
            TypeShape::UInt32 => XtpNormalizedKind::UInt32,
            TypeShape::UInt64 => XtpNormalizedKind::UInt64,
            TypeShape::Float => XtpNormalizedKind::Float,
            TypeShape::Double => XtpNormalizedKind::Double,
            TypeShape::Object { .. } => XtpNormalizedKind::Object,
            TypeShape::Enum { .. } => XtpNormalizedKind::Enum,
            TypeShape::Array { .. } => XtpNormalizedKind::Array,
            TypeShape::Map { .. } => XtpNormalizedKind::Map,
            TypeShape::FreeFormObject => XtpNormalizedKind::FreeFormObject,
        }
    }

    /// Bit width and signedness for integer types
    pub fn int_width(&self) -> Option<(u8, bool)> {
        match self.shape {
            TypeShape::Int8 => Some((8, true)),
            TypeShape::Int16 => Some((16, true)),
            TypeShape::Int32 => Some((32, true)),
            TypeShape::Int64 => Some((64, true)),
            TypeShape::UInt8 => Some((8, false)),
            TypeShape::UInt16 => Some((16, false)),
            TypeShape::UInt32 => Some((32, false)),
            TypeShape::UInt64 => Some((64, false)),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.int_width().is_some()
    }

    pub fn is_float(&self) -> bool {
        matches!(self.shape, TypeShape::Float | TypeShape::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self.shape, TypeShape::String)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.shape, TypeShape::Boolean)
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self.shape, TypeShape::DateTime)
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self.shape, TypeShape::Buffer)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.shape, TypeShape::Object { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, TypeShape::Enum { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, TypeShape::Array { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self.shape, TypeShape::Map { .. })
    }

    pub fn is_free_form_object(&self) -> bool {
        matches!(self.shape, TypeShape::FreeFormObject)
    }

    /// Scalars that need no structured encoding
    pub fn is_primitive(&self) -> bool {
        match &self.shape {
            TypeShape::String
            | TypeShape::Boolean
            | TypeShape::DateTime
            | TypeShape::Buffer
            | TypeShape::Int8
            | TypeShape::Int16
            | TypeShape::Int32
            | TypeShape::Int64
            | TypeShape::UInt8
            | TypeShape::UInt16
            | TypeShape::UInt32
            | TypeShape::UInt64
            | TypeShape::Float
            | TypeShape::Double
            | TypeShape::Enum { .. } => true,
            TypeShape::Object { .. }
            | TypeShape::Array { .. }
            | TypeShape::Map { .. }
            | TypeShape::FreeFormObject => false,
        }
    }

    /// Element type of arrays and enums, value type of maps
    pub fn element_type(&self) -> Option<&XtpNormalizedType> {
        match &self.shape {
            TypeShape::Array { element_type } | TypeShape::Enum { element_type, .. } => {
                Some(&**element_type)
            }
            TypeShape::Map { value_type, .. } => Some(&**value_type),
            _ => None,
        }
    }

    /// Name of object and enum types
    pub fn name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Object { name, .. } | TypeShape::Enum { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}
