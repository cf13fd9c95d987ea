use pretty_assertions::assert_eq;
use serde_json::json;
use xtp_schema_core::{TypeShape, XtpNormalizedKind, XtpNormalizedType};

#[test]
fn test_nested_type_serialization() {
    let ty = XtpNormalizedType::object(
        "Basket",
        vec![
            XtpNormalizedType::array(XtpNormalizedType::enumeration(
                "Fruit",
                vec!["apple".to_string()],
            )),
            XtpNormalizedType::map(XtpNormalizedType::integer(16, false)).with_nullable(true),
            XtpNormalizedType::free_form_object(),
        ],
    );

    assert_eq!(
        serde_json::to_value(&ty).unwrap(),
        json!({
            "kind": "object",
            "name": "Basket",
            "nullable": false,
            "properties": [
                {
                    "kind": "array",
                    "nullable": false,
                    "elementType": {
                        "kind": "enum",
                        "name": "Fruit",
                        "nullable": false,
                        "values": ["apple"],
                        "elementType": { "kind": "string", "nullable": false }
                    }
                },
                {
                    "kind": "map",
                    "nullable": true,
                    "keyType": { "kind": "string", "nullable": false },
                    "valueType": { "kind": "uint16", "nullable": false }
                },
                { "kind": "jsobject", "nullable": false }
            ]
        })
    );
}

#[test]
fn test_type_tree_deserializes() {
    let ty: XtpNormalizedType = serde_json::from_value(json!({
        "kind": "array",
        "elementType": { "kind": "date-time", "nullable": true }
    }))
    .unwrap();

    assert!(ty.is_array());
    assert!(!ty.nullable);
    let element = ty.element_type().unwrap();
    assert!(element.is_date_time());
    assert!(element.nullable);
}

#[test]
fn test_predicates_cover_every_kind() {
    let samples = [
        (XtpNormalizedType::string(), XtpNormalizedKind::String),
        (XtpNormalizedType::boolean(), XtpNormalizedKind::Boolean),
        (XtpNormalizedType::date_time(), XtpNormalizedKind::DateTime),
        (XtpNormalizedType::buffer(), XtpNormalizedKind::Buffer),
        (XtpNormalizedType::integer(8, true), XtpNormalizedKind::Int8),
        (XtpNormalizedType::integer(64, false), XtpNormalizedKind::UInt64),
        (XtpNormalizedType::float(), XtpNormalizedKind::Float),
        (XtpNormalizedType::double(), XtpNormalizedKind::Double),
        (XtpNormalizedType::free_form_object(), XtpNormalizedKind::FreeFormObject),
    ];

    for (ty, kind) in samples {
        assert_eq!(ty.kind(), kind);
        assert_eq!(ty.kind().to_string(), kind.as_str());
    }

    let int = XtpNormalizedType::integer(32, false);
    assert!(int.is_integer());
    assert_eq!(int.int_width(), Some((32, false)));
    assert!(int.is_primitive());
    assert!(!XtpNormalizedType::object("O", vec![]).is_primitive());
    assert!(matches!(
        XtpNormalizedType::map(XtpNormalizedType::string()).shape,
        TypeShape::Map { .. }
    ));
}
