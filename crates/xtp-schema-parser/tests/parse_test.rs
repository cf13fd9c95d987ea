//! End-to-end tests for parse + normalize

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use xtp_schema_core::{ErrorCategory, MimeType, Version, XtpNormalizedKind, XtpNormalizedType};
use xtp_schema_parser::{decode_str, parse, parse_document, Format};

fn fixture(name: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = std::fs::read_to_string(path)?;
    Ok(decode_str(&text, Format::Yaml)?)
}

#[test]
fn test_minimal_document() -> Result<(), Box<dyn std::error::Error>> {
    let result = parse(&json!({
        "version": "v1-draft",
        "exports": { "f": {} },
        "components": { "schemas": {} }
    }))?;

    assert_eq!(result.schema.version, Version::V1);
    assert_eq!(result.schema.exports.len(), 1);
    assert_eq!(result.schema.exports[0].name, "f");
    assert!(result.schema.exports[0].input.is_none());
    assert!(result.schema.schemas.is_empty());
    assert!(result.schema.imports.is_empty());
    Ok(())
}

#[test]
fn test_enum_reference_points_at_schema() -> Result<(), Box<dyn std::error::Error>> {
    let result = parse(&json!({
        "version": "v1-draft",
        "components": {
            "schemas": {
                "Color": { "enum": ["red", "green"] },
                "Pixel": { "properties": { "c": { "$ref": "#/components/schemas/Color" } } }
            }
        }
    }))?;

    let schema = &result.schema;
    let color = &schema.schemas["Color"];
    assert_eq!(
        color.xtp_type().map(XtpNormalizedType::kind),
        Some(XtpNormalizedKind::Enum)
    );
    assert_eq!(
        color.xtp_type(),
        Some(&XtpNormalizedType::enumeration(
            "Color",
            vec!["red".to_string(), "green".to_string()]
        ))
    );

    let c = schema.schemas["Pixel"].node.property("c").expect("property c");
    let target = schema.resolve(c.node.schema_ref.as_ref().expect("$ref"))?;
    assert!(std::ptr::eq(target, color));
    assert_eq!(c.node.xtp_type.as_ref(), color.xtp_type());
    assert!(schema.is_primitive(&c.node));
    Ok(())
}

#[test]
fn test_mutual_reference_is_one_cycle() {
    let err = parse(&json!({
        "version": "v1-draft",
        "components": {
            "schemas": {
                "A": { "properties": { "b": { "$ref": "#/components/schemas/B" } } },
                "B": { "properties": { "a": { "$ref": "#/components/schemas/A" } } }
            }
        }
    }))
    .unwrap_err();

    assert_eq!(err.errors.len(), 1);
    let cycle = &err.errors[0];
    assert_eq!(cycle.category, ErrorCategory::Cycle);
    assert_eq!(cycle.message, "Detected circular reference: A -> B -> A");
    assert_eq!(cycle.path, "#/components/schemas/B/properties/a/$ref");
    assert_eq!(err.cycles().count(), 1);
    assert_eq!(err.to_string(), "Detected circular reference: A -> B -> A");
}

#[test]
fn test_diamond_has_no_cycle() {
    let result = parse(&json!({
        "version": "v1",
        "components": {
            "schemas": {
                "Top": {
                    "properties": {
                        "left": { "$ref": "#/components/schemas/Left" },
                        "right": { "$ref": "#/components/schemas/Right" }
                    }
                },
                "Left": { "properties": { "bottom": { "$ref": "#/components/schemas/Bottom" } } },
                "Right": {
                    "properties": {
                        "bottoms": { "type": "array", "items": { "$ref": "#/components/schemas/Bottom" } }
                    }
                },
                "Bottom": { "properties": { "value": { "type": "string" } } }
            }
        }
    }));
    assert!(result.is_ok(), "{:?}", result.err());
}

#[test]
fn test_keyword_property_only_warns() -> Result<(), Box<dyn std::error::Error>> {
    let result = parse(&json!({
        "version": "v1-draft",
        "components": {
            "schemas": { "Thing": { "properties": { "type": { "type": "string" } } } }
        }
    }))?;

    let keyword_warnings: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.category == ErrorCategory::Keyword)
        .collect();
    assert_eq!(keyword_warnings.len(), 1);
    assert_eq!(
        keyword_warnings[0].path,
        "#/components/schemas/Thing/properties/type"
    );
    assert!(keyword_warnings[0].message.ends_with("go, rust"));

    // draft notice is reported ahead of normalization warnings
    assert_eq!(result.warnings[0].category, ErrorCategory::DraftVersion);
    Ok(())
}

#[test]
fn test_unknown_version_returns_no_ir() {
    let err = parse(&json!({
        "version": "v2",
        "exports": { "bad name": {} }
    }))
    .unwrap_err();
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].path, "#/version");
    assert!(err.warnings.is_empty());
}

#[test]
fn test_v0_export_names_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let result = parse(&json!({ "version": "v0", "exports": ["my-func", "type"] }))?;

    assert_eq!(result.schema.version, Version::V0);
    let names: Vec<&str> = result.schema.exports.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["my-func", "type"]);
    assert!(result.warnings.is_empty());
    Ok(())
}

#[test]
fn test_boolean_additional_properties() -> Result<(), Box<dyn std::error::Error>> {
    let result = parse(&json!({
        "version": "v1",
        "components": {
            "schemas": {
                "Closed": {
                    "properties": { "a": { "type": "string" } },
                    "additionalProperties": false
                },
                "Open": { "type": "object", "additionalProperties": true }
            }
        }
    }))?;

    let closed = &result.schema.schemas["Closed"];
    assert_eq!(closed.xtp_type().map(XtpNormalizedType::kind), Some(XtpNormalizedKind::Object));
    assert!(closed.node.additional_properties.is_none());

    let open = &result.schema.schemas["Open"];
    assert_eq!(
        open.xtp_type(),
        Some(&XtpNormalizedType::map(XtpNormalizedType::free_form_object()))
    );
    Ok(())
}

#[test]
fn test_type_format_compatibility() {
    let doc = |ty: &str, format: Option<&str>| {
        let mut node = json!({ "type": ty });
        if let Some(format) = format {
            node["format"] = json!(format);
        }
        json!({
            "version": "v1",
            "components": { "schemas": { "Holder": { "properties": { "value": node } } } }
        })
    };

    let err = parse(&doc("string", Some("int32"))).unwrap_err();
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].path, "#/components/schemas/Holder/properties/value");

    let int32 = parse(&doc("integer", Some("int32"))).unwrap();
    let holder = &int32.schema.schemas["Holder"];
    assert_eq!(
        holder.properties()[0].node.xtp_type,
        Some(XtpNormalizedType::integer(32, true))
    );

    let default = parse(&doc("integer", None)).unwrap();
    let holder = &default.schema.schemas["Holder"];
    assert_eq!(
        holder.properties()[0].node.xtp_type.as_ref().map(XtpNormalizedType::kind),
        Some(XtpNormalizedKind::Int64)
    );
}

#[test]
fn test_normalizing_twice_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let raw = fixture("v1-valid-doc.yaml")?;
    let first = parse(&raw)?;
    let second = parse(&raw)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_valid_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let raw = fixture("v1-valid-doc.yaml")?;

    let parsed = parse_document(&raw);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);

    let result = parse(&raw)?;
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].path, "#/version");

    let schema = &result.schema;
    let exports: Vec<&str> = schema.exports.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(exports, ["voidFunc", "primitiveTypeFunc", "referenceTypeFunc"]);
    let imports: Vec<&str> = schema.imports.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(imports, ["eatAFruit", "kv_read"]);
    assert!(schema.has_imports());

    let primitive = &schema.exports[1];
    assert_eq!(primitive.code_samples("TypeScript").len(), 1);
    assert_eq!(
        primitive.code_samples("go")[0].label.as_deref(),
        Some("Go version")
    );
    let input = primitive.input.as_ref().expect("input");
    assert!(input.is_utf8_encoded());
    assert_eq!(input.node.xtp_type, Some(XtpNormalizedType::string()));
    let output = primitive.output.as_ref().expect("output");
    assert!(output.is_json_encoded());
    assert_eq!(output.node.xtp_type, Some(XtpNormalizedType::integer(32, true)));

    let by_ref = &schema.exports[2];
    let input = by_ref.input.as_ref().expect("input");
    assert_eq!(
        input.node.xtp_type.as_ref(),
        schema.schemas["ComplexObject"].xtp_type()
    );
    assert!(!schema.is_primitive(&input.node));
    assert_eq!(
        by_ref
            .output
            .as_ref()
            .and_then(|p| p.node.xtp_type.as_ref())
            .map(XtpNormalizedType::kind),
        Some(XtpNormalizedKind::Map)
    );

    let kv_output = schema.imports[1].output.as_ref().expect("output");
    assert_eq!(kv_output.content_type, MimeType::Binary);
    assert_eq!(kv_output.node.xtp_type, Some(XtpNormalizedType::buffer()));

    let complex = &schema.schemas["ComplexObject"];
    let required: Vec<&str> = complex
        .properties()
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(required, ["ghost", "aBoolean"]);

    let kinds: Vec<(&str, XtpNormalizedKind, bool)> = complex
        .properties()
        .iter()
        .map(|p| {
            let ty = p.node.xtp_type.as_ref().expect("annotated property");
            (p.name.as_str(), ty.kind(), ty.nullable)
        })
        .collect();
    assert_eq!(
        kinds,
        [
            ("ghost", XtpNormalizedKind::Enum, false),
            ("aBoolean", XtpNormalizedKind::Boolean, false),
            ("aString", XtpNormalizedKind::String, false),
            ("anInt", XtpNormalizedKind::Int32, false),
            ("aBigUnsigned", XtpNormalizedKind::UInt64, false),
            ("anOptionalDate", XtpNormalizedKind::DateTime, true),
            ("aFloat", XtpNormalizedKind::Float, false),
            ("aDouble", XtpNormalizedKind::Double, false),
            ("someTags", XtpNormalizedKind::Array, false),
            ("anAddress", XtpNormalizedKind::Object, false),
            ("aFruitBasket", XtpNormalizedKind::Array, false),
            ("aNullableFruit", XtpNormalizedKind::Enum, true),
            ("someExtra", XtpNormalizedKind::FreeFormObject, false),
        ]
    );

    let ghost = complex.node.property("ghost").expect("ghost");
    assert!(ghost.has_comment());
    assert_eq!(
        ghost.node.schema_ref.as_ref().and_then(|r| r.target),
        schema.schema_id("GhostGang")
    );

    let basket = complex.node.property("aFruitBasket").expect("basket");
    let element = basket
        .node
        .xtp_type
        .as_ref()
        .and_then(XtpNormalizedType::element_type)
        .expect("element type");
    assert_eq!(element.name(), Some("Fruit"));

    let address = complex.node.property("anAddress").expect("address");
    assert!(address.node.property("street").expect("street").required);
    assert!(!address.node.property("zip").expect("zip").required);

    let fruit = &schema.schemas["Fruit"];
    assert!(fruit.is_enum());
    assert_eq!(fruit.node.enum_strings(), ["apple", "orange", "banana"]);
    Ok(())
}

#[test]
fn test_invalid_fixture_paths() -> Result<(), Box<dyn std::error::Error>> {
    let raw = fixture("v1-invalid-doc.yaml")?;
    let parsed = parse_document(&raw);
    let paths: Vec<&str> = parsed.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "#/exports/invalid-func-2",
            "#/exports/invalidFunc1/input",
            "#/exports/invalidFunc1/output",
            "#/exports/invalid-func-2/input/$ref",
            "#/components/schemas/ComplexObject",
            "#/components/schemas/ComplexObject/properties/a-bad-name",
            "#/components/schemas/ComplexObject/properties/aBoolean",
            "#/components/schemas/ComplexObject/properties/aString",
            "#/components/schemas/ComplexObject/properties/anInt",
            "#/components/schemas/MixedObject",
            "#/components/schemas/BadEnum/enum",
        ]
    );

    let err = parse(&raw).unwrap_err();
    assert_eq!(err.errors, parsed.errors);
    assert_eq!(
        err.to_string(),
        "Invalid identifier: \"invalid-func-2\". Must match /^[a-zA-Z_$][a-zA-Z0-9_$]*$/ (and 10 other error(s))"
    );
    Ok(())
}

fn document_with_property(name: &str) -> Value {
    json!({
        "version": "v1",
        "components": {
            "schemas": { "Holder": { "properties": { name: { "type": "string" } } } }
        }
    })
}

proptest! {
    #[test]
    fn accepted_property_names_survive(name in "[a-zA-Z_$][a-zA-Z0-9_$]{0,12}") {
        let result = parse(&document_with_property(&name));
        prop_assert!(result.is_ok());
        let result = result.unwrap();
        prop_assert!(result.schema.schemas["Holder"].node.property(&name).is_some());
    }

    #[test]
    fn rejected_property_name_reported_once(name in "[0-9][a-z0-9-]{0,12}") {
        let err = parse(&document_with_property(&name)).unwrap_err();
        prop_assert_eq!(err.errors.len(), 1);
        prop_assert_eq!(
            &err.errors[0].path,
            &format!("#/components/schemas/Holder/properties/{}", name)
        );
    }
}
