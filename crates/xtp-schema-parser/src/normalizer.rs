//! Normalizer: typed document to IR
//!
//! A v1 document goes through three phases:
//!
//! 1. **Indexing** registers every schema in declaration order and flattens
//!    property maps into ordered lists carrying their derived `required` flag.
//! 2. **Annotation** resolves each `$ref` to a registry index and attaches a
//!    normalized type to every typed node. Results are memoized per node, and a
//!    schema that is re-entered while still being annotated yields a shallow
//!    placeholder, which keeps recursive documents from recursing forever.
//! 3. **Cycle detection** searches the resolved reference graph and rejects any
//!    loop between schemas.
//!
//! Declared names are checked for identifier grammar and keyword collisions in
//! between. Every diagnostic is collected and raised together at the end.

use std::mem;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};
use xtp_schema_core::keywords::check_for_keyword;
use xtp_schema_core::naming::{invalid_identifier_message, is_valid_identifier};
use xtp_schema_core::{
    Diagnostics, Export, Language, Location, NormalizeError, Parameter, Property, Schema,
    SchemaId, SchemaRef, TypedNode, ValidationError, Version, XtpFormat, XtpNormalizedType,
    XtpSchema, XtpType,
};

use crate::dependency_graph::DependencyGraph;
use crate::document::{Document, RawExport, RawNode, RawParameter, V0Document, V1Document};

/// A successfully normalized document
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub schema: XtpSchema,
    /// Keyword collisions and other non-fatal notices
    pub warnings: Vec<ValidationError>,
}

/// Build the IR for a parsed document
///
/// The document is consumed: each call owns the tree it annotates.
#[instrument(skip_all, fields(version = doc.version()))]
pub fn normalize(doc: Document) -> Result<Normalized, NormalizeError> {
    let (schema, warnings) = match doc {
        Document::V0(doc) => normalize_v0(doc),
        Document::V1(doc) => V1Normalizer::default().normalize(doc),
    }?;

    debug!(
        exports = schema.exports.len(),
        imports = schema.imports.len(),
        schemas = schema.schemas.len(),
        warnings = warnings.len(),
        "document normalized"
    );
    Ok(Normalized { schema, warnings })
}

/// v0 exports are bare names and are taken as written
fn normalize_v0(doc: V0Document) -> Result<(XtpSchema, Vec<ValidationError>), NormalizeError> {
    let mut schema = XtpSchema::new(Version::V0);
    schema.exports = doc.exports.into_iter().map(Export::named).collect();
    Ok((schema, Vec::new()))
}

/// Progress of a schema through annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    Pending,
    InProgress,
    Done,
}

/// Per-call state for a v1 document
#[derive(Debug, Default)]
struct V1Normalizer {
    schemas: IndexMap<String, Schema>,
    states: Vec<Annotation>,
    location: Location,
    diagnostics: Diagnostics,
}

impl V1Normalizer {
    fn normalize(
        mut self,
        doc: V1Document,
    ) -> Result<(XtpSchema, Vec<ValidationError>), NormalizeError> {
        let V1Document {
            exports,
            imports,
            components,
            ..
        } = doc;

        self.index_schemas(components.schemas);
        let mut exports = lower_functions(exports);
        let mut imports = lower_functions(imports);
        self.check_names(&exports, &imports);

        self.annotate_schemas();
        self.annotate_functions("exports", &mut exports);
        self.annotate_functions("imports", &mut imports);

        self.detect_cycles();

        let schema = XtpSchema {
            version: Version::V1,
            exports,
            imports,
            schemas: self.schemas,
        };
        self.diagnostics.into_result(schema)
    }

    /// Phase A
    #[instrument(skip_all, fields(schemas = raw.len()))]
    fn index_schemas(&mut self, raw: IndexMap<String, RawNode>) {
        for (name, node) in raw {
            for required in &node.required {
                if !node.properties.contains_key(required) {
                    self.diagnostics.error(ValidationError::structural(
                        format!("Property {} is marked as required but not defined", required),
                        Location::from_segments(["components", "schemas", name.as_str()]).to_string(),
                    ));
                }
            }

            trace!(schema = %name, properties = node.properties.len(), "indexing schema");
            let schema = Schema {
                name: name.clone(),
                required: node.required.clone(),
                node: lower_node(node),
            };
            self.schemas.insert(name, schema);
        }
        self.states = vec![Annotation::Pending; self.schemas.len()];
    }

    /// Identifier grammar and keyword collisions for every declared name
    fn check_names(&mut self, exports: &[Export], imports: &[Export]) {
        for (section, functions) in [("exports", exports), ("imports", imports)] {
            for function in functions {
                let mut location = Location::from_segments([section, function.name.as_str()]);
                check_declared_name(&function.name, location.to_string(), &mut self.diagnostics);
                for (slot, parameter) in [("input", &function.input), ("output", &function.output)] {
                    if let Some(parameter) = parameter {
                        location.push(slot);
                        check_member_names(&parameter.node, &mut location, &mut self.diagnostics);
                        location.pop();
                    }
                }
            }
        }

        for (name, schema) in &self.schemas {
            let mut location = Location::from_segments(["components", "schemas", name.as_str()]);
            check_declared_name(name, location.to_string(), &mut self.diagnostics);
            check_member_names(&schema.node, &mut location, &mut self.diagnostics);
        }
    }

    /// Phase B, schema registry
    fn annotate_schemas(&mut self) {
        for index in 0..self.schemas.len() {
            self.annotate_schema(SchemaId(index));
        }
    }

    /// Phase B, boundary functions
    fn annotate_functions(&mut self, section: &str, functions: &mut [Export]) {
        for function in functions {
            for (slot, parameter) in [("input", &mut function.input), ("output", &mut function.output)] {
                if let Some(parameter) = parameter {
                    self.location =
                        Location::from_segments([section, function.name.as_str(), slot]);
                    self.annotate_node(&mut parameter.node, &function.name, false);
                }
            }
        }
        self.location = Location::root();
    }

    fn annotate_schema(&mut self, id: SchemaId) -> Option<XtpNormalizedType> {
        let (name, schema) = self.schemas.get_index_mut(id.0)?;
        match self.states[id.0] {
            Annotation::Done => return schema.node.xtp_type.clone(),
            Annotation::InProgress => {
                trace!(schema = %name, "schema re-entered during annotation");
                return Some(XtpNormalizedType::object(name.as_str(), Vec::new()));
            }
            Annotation::Pending => {}
        }

        let name = name.clone();
        let mut node = mem::take(&mut schema.node);
        self.states[id.0] = Annotation::InProgress;

        let outer = mem::replace(
            &mut self.location,
            Location::from_segments(["components", "schemas", name.as_str()]),
        );
        let xtp_type = self.annotate_node(&mut node, &name, false);
        self.location = outer;

        if let Some((_, schema)) = self.schemas.get_index_mut(id.0) {
            schema.node = node;
        }
        self.states[id.0] = Annotation::Done;
        xtp_type
    }

    /// Attach a normalized type to `node`, returning it
    ///
    /// `member` nodes (properties, array items, map values) without any type
    /// information are free-form objects; other nodes stay untyped.
    fn annotate_node(
        &mut self,
        node: &mut TypedNode,
        name: &str,
        member: bool,
    ) -> Option<XtpNormalizedType> {
        if let Some(xtp_type) = &node.xtp_type {
            return Some(xtp_type.clone());
        }

        let xtp_type = self.derive_type(node, name, member);
        node.xtp_type = xtp_type.clone();
        xtp_type
    }

    fn derive_type(
        &mut self,
        node: &mut TypedNode,
        name: &str,
        member: bool,
    ) -> Option<XtpNormalizedType> {
        let nullable = node.is_nullable();

        if !node.properties.is_empty() {
            let properties = self.annotate_properties(&mut node.properties);
            node.ty = Some(XtpType::Object);
            return Some(XtpNormalizedType::object(name, properties).with_nullable(nullable));
        }

        if let Some(schema_ref) = node.schema_ref.as_mut() {
            let target = self.resolve(schema_ref)?;
            node.ty = Some(XtpType::Object);
            let xtp_type = self
                .annotate_schema(target)
                .unwrap_or_else(XtpNormalizedType::free_form_object);
            return Some(xtp_type.with_nullable(nullable));
        }

        if let Some(values) = &node.enum_values {
            let mut variants = Vec::with_capacity(values.len());
            for value in values {
                match value.as_str() {
                    Some(variant) => {
                        if !is_valid_identifier(variant) {
                            self.diagnostics.error(ValidationError::structural(
                                invalid_identifier_message(variant),
                                self.location.with_suffix(&["enum"]),
                            ));
                        }
                        variants.push(variant.to_string());
                    }
                    None => self.diagnostics.error(ValidationError::structural(
                        format!("Enum item must be a string: {}", value),
                        self.location.to_string(),
                    )),
                }
            }
            node.ty = Some(XtpType::Enum);
            return Some(XtpNormalizedType::enumeration(name, variants).with_nullable(nullable));
        }

        if let Some(items) = node.items.as_deref_mut() {
            self.location.push("items");
            let element = self.annotate_node(items, name, true);
            self.location.pop();
            node.ty.get_or_insert(XtpType::Array);
            let element = element.unwrap_or_else(XtpNormalizedType::free_form_object);
            return Some(XtpNormalizedType::array(element).with_nullable(nullable));
        }

        if let Some(value) = node.additional_properties.as_deref_mut() {
            self.location.push("additionalProperties");
            let value_type = self.annotate_node(value, name, true);
            self.location.pop();
            node.ty = Some(XtpType::Map);
            let value_type = value_type.unwrap_or_else(XtpNormalizedType::free_form_object);
            return Some(XtpNormalizedType::map(value_type).with_nullable(nullable));
        }

        let xtp_type = match node.ty {
            Some(XtpType::String) if node.format == Some(XtpFormat::DateTime) => {
                XtpNormalizedType::date_time()
            }
            Some(XtpType::String) => XtpNormalizedType::string(),
            Some(XtpType::Integer) => integer_type(node.format),
            Some(XtpType::Boolean) => XtpNormalizedType::boolean(),
            Some(XtpType::Buffer) => XtpNormalizedType::buffer(),
            Some(XtpType::Number) if node.format == Some(XtpFormat::Float) => {
                XtpNormalizedType::float()
            }
            Some(XtpType::Number) => XtpNormalizedType::double(),
            Some(XtpType::Array) => XtpNormalizedType::array(XtpNormalizedType::free_form_object()),
            Some(XtpType::Object | XtpType::Enum | XtpType::Map) => {
                XtpNormalizedType::free_form_object()
            }
            None if member => XtpNormalizedType::free_form_object(),
            None => return None,
        };
        Some(xtp_type.with_nullable(nullable))
    }

    fn annotate_properties(&mut self, properties: &mut [Property]) -> Vec<XtpNormalizedType> {
        self.location.push("properties");
        let types = properties
            .iter_mut()
            .map(|property| {
                self.location.push(property.name.as_str());
                let xtp_type = self
                    .annotate_node(&mut property.node, &property.name, true)
                    .unwrap_or_else(XtpNormalizedType::free_form_object);
                self.location.pop();
                xtp_type
            })
            .collect();
        self.location.pop();
        types
    }

    /// Point `schema_ref` at its registry entry. A miss is reported at the
    /// `$ref` and only the referencing branch is abandoned.
    fn resolve(&mut self, schema_ref: &mut SchemaRef) -> Option<SchemaId> {
        if let Some(target) = schema_ref.target {
            return Some(target);
        }

        let name = match schema_ref.schema_name() {
            Ok(name) => name,
            Err(err) => {
                self.diagnostics.error(ValidationError::structural(
                    err.to_string(),
                    self.location.with_suffix(&["$ref"]),
                ));
                return None;
            }
        };

        match self.schemas.get_index_of(name) {
            Some(index) => {
                trace!(reference = %schema_ref.path, "resolved");
                schema_ref.target = Some(SchemaId(index));
                schema_ref.target
            }
            None => {
                let options: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
                let message = format!(
                    "Invalid $ref \"{}\". Cannot find schema \"{}\". Options are: [{}]",
                    schema_ref.path,
                    name,
                    options.join(", ")
                );
                self.diagnostics.error(ValidationError::structural(
                    message,
                    self.location.with_suffix(&["$ref"]),
                ));
                None
            }
        }
    }

    /// Phase C
    fn detect_cycles(&mut self) {
        let graph = DependencyGraph::from_schemas(&self.schemas);
        for cycle in graph.find_cycles() {
            debug!(cycle = %cycle, "circular reference");
            self.diagnostics.error(cycle.into());
        }
    }
}

fn integer_type(format: Option<XtpFormat>) -> XtpNormalizedType {
    let (bits, signed) = match format {
        Some(XtpFormat::Int8) => (8, true),
        Some(XtpFormat::Int16) => (16, true),
        Some(XtpFormat::Int32) => (32, true),
        Some(XtpFormat::UInt8) => (8, false),
        Some(XtpFormat::UInt16) => (16, false),
        Some(XtpFormat::UInt32) => (32, false),
        Some(XtpFormat::UInt64) => (64, false),
        _ => (64, true),
    };
    XtpNormalizedType::integer(bits, signed)
}

/// Convert a raw node, flattening its property map and deriving `required`
fn lower_node(raw: RawNode) -> TypedNode {
    let RawNode {
        ty,
        format,
        description,
        nullable,
        items,
        additional_properties,
        properties,
        required,
        enum_values,
        reference,
    } = raw;

    let properties = properties
        .into_iter()
        .map(|(name, node)| {
            let is_required = required.contains(&name);
            Property {
                name,
                required: is_required,
                node: lower_node(node),
            }
        })
        .collect();

    TypedNode {
        ty,
        format,
        description,
        nullable,
        items: items.map(|node| Box::new(lower_node(*node))),
        additional_properties: additional_properties.map(|node| Box::new(lower_node(*node))),
        properties,
        enum_values,
        schema_ref: reference.map(SchemaRef::new),
        xtp_type: None,
    }
}

fn lower_parameter(raw: RawParameter) -> Parameter {
    Parameter {
        content_type: raw.content_type,
        node: lower_node(raw.node),
    }
}

fn lower_functions(raw: IndexMap<String, RawExport>) -> Vec<Export> {
    raw.into_iter()
        .map(|(name, function)| Export {
            name,
            description: function.description,
            code_samples: function.code_samples,
            input: function.input.map(lower_parameter),
            output: function.output.map(lower_parameter),
        })
        .collect()
}

/// Report a name that breaks the identifier grammar, or warn when it is
/// reserved in a target language
fn check_declared_name(name: &str, path: String, diagnostics: &mut Diagnostics) {
    if !is_valid_identifier(name) {
        diagnostics.error(ValidationError::structural(
            invalid_identifier_message(name),
            path,
        ));
        return;
    }

    if let Some(languages) = check_for_keyword(name) {
        let languages: Vec<&str> = languages.iter().map(Language::as_str).collect();
        diagnostics.warn(ValidationError::keyword(
            format!(
                "Identifier \"{}\" collides with reserved keywords in: {}",
                name,
                languages.join(", ")
            ),
            path,
        ));
    }
}

/// Property names below `node`, including inline objects in items and map values
fn check_member_names(node: &TypedNode, location: &mut Location, diagnostics: &mut Diagnostics) {
    for property in &node.properties {
        location.push("properties");
        location.push(property.name.as_str());
        check_declared_name(&property.name, location.to_string(), diagnostics);
        check_member_names(&property.node, location, diagnostics);
        location.pop();
        location.pop();
    }

    if let Some(items) = &node.items {
        location.push("items");
        check_member_names(items, location, diagnostics);
        location.pop();
    }

    if let Some(value) = &node.additional_properties {
        location.push("additionalProperties");
        check_member_names(value, location, diagnostics);
        location.pop();
    }
}
