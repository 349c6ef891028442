//! # End-to-End Form Scenarios
//!
//! Drives the derivers, the meta engine and the validator together the way
//! a form binding would: derive the initial value and meta tree, mutate the
//! value, recompute dirty flags, validate, and apply the error tree.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use formwork_core::{
    ArrayMethod, ArrayStrategy, Check, DefaultOptions, DepthPolicy, PathSegment, SchemaNode,
    StructuredArrays,
};
use formwork_schema::{
    derive_defaults, derive_partial, parse_native, AdapterRegistry, NativeAdapter, Schema,
    SchemaAdapter, ValidationOutcome, Validator,
};
use formwork_state::{
    create_meta_state, sync_meta_state, update_dirty_state, update_validation_state,
    CycleSequencer, ValidationCycle,
};

fn person() -> SchemaNode {
    SchemaNode::object([
        ("name", SchemaNode::string().check(Check::MinLength(1), Some("Name is required"))),
        (
            "age",
            SchemaNode::integer().check(Check::Positive, Some("Age must be a positive integer")),
        ),
    ])
}

fn populate(length: usize, depth: Option<DepthPolicy>) -> DefaultOptions {
    DefaultOptions {
        arrays: ArrayStrategy::Structured(StructuredArrays {
            method: ArrayMethod::Populate,
            length: Some(length),
            depth,
        }),
        ..DefaultOptions::default()
    }
}

fn error_count(schema: &SchemaNode, value: &Value) -> usize {
    match ValidationOutcome::from_parse(parse_native(schema, value)) {
        ValidationOutcome::Valid(_) => 0,
        ValidationOutcome::Invalid(errors) => errors.message_count().max(1),
    }
}

// ─── Person form ─────────────────────────────────────────────────────

#[test]
fn test_person_defaults_and_dirty_tracking() {
    let schema = person();
    let options = DefaultOptions::default();
    let initial = derive_defaults(&schema, &options).unwrap().unwrap();
    assert_eq!(initial, json!({"name": "", "age": 0}));

    let mut meta = create_meta_state(&schema, &options);
    let mut current = initial.clone();
    current["age"] = json!(30);

    assert!(update_dirty_state(&mut meta, Some(&current), Some(&initial)));
    assert!(meta.is_dirty());
    assert!(meta.field("age").unwrap().is_dirty());
    assert!(!meta.field("name").unwrap().is_dirty());

    current["age"] = json!(0.0);
    assert!(!update_dirty_state(&mut meta, Some(&current), Some(&initial)));
    assert!(!meta.field("age").unwrap().is_dirty());
}

#[test]
fn test_person_validation_marks_invalid_fields() {
    let schema = Schema::native(person());
    let validator = Validator::new(Arc::new(NativeAdapter), schema.clone());
    let outcome = validator.validate(&json!({"name": "", "age": -1})).unwrap();
    let errors = outcome.errors().unwrap().clone();
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({
            "name": {"error": "Name is required"},
            "age": {"error": "Age must be a positive integer"}
        })
    );

    let mut meta = NativeAdapter
        .create_meta_state(&schema, &DefaultOptions::default())
        .unwrap();
    update_validation_state(&mut meta, Some(&errors));
    assert!(!meta.field("name").unwrap().is_valid());
    assert!(!meta.field("age").unwrap().is_valid());
    assert!(meta.is_valid());

    update_validation_state(&mut meta, None);
    assert!(meta.field("name").unwrap().is_valid());
}

#[test]
fn test_validation_cycle_over_the_executor() {
    let schema = Schema::native(person());
    let validator = Validator::new(Arc::new(NativeAdapter), schema.clone());
    let sequencer = CycleSequencer::new();
    let mut meta = NativeAdapter
        .create_meta_state(&schema, &DefaultOptions::default())
        .unwrap();

    let stale = ValidationCycle::new(&sequencer).begin(&mut meta);
    let fresh = ValidationCycle::new(&sequencer).begin(&mut meta);
    assert!(meta.field("name").unwrap().is_validating());

    let late = validator.validate(&json!({"name": "", "age": 1})).unwrap();
    let current = validator.validate(&json!({"name": "Ada", "age": 36})).unwrap();

    let settled = fresh
        .settle(&mut meta, current.errors().cloned(), &sequencer)
        .unwrap();
    assert!(settled.is_valid());
    assert!(stale
        .settle(&mut meta, late.errors().cloned(), &sequencer)
        .is_err());
    assert!(meta.field("name").unwrap().is_valid());
    assert!(!meta.is_validating());
}

// ─── Arrays ──────────────────────────────────────────────────────────

#[test]
fn test_populate_three_elements() {
    let schema = SchemaNode::array(SchemaNode::object([
        ("label", SchemaNode::string()),
        ("tags", SchemaNode::array(SchemaNode::string())),
    ]));
    let options = populate(3, None);
    let element = match schema.kind() {
        formwork_core::NodeKind::Array { element, .. } => element.as_ref().clone(),
        other => panic!("expected array, got {other}"),
    };
    let expected = derive_defaults(&element, &options).unwrap().unwrap();
    let value = derive_defaults(&schema, &options).unwrap().unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item == &expected));
    assert_eq!(expected, json!({"label": "", "tags": ["", "", ""]}));

    let meta = create_meta_state(&schema, &options);
    assert_eq!(meta.items().unwrap().len(), 3);
    assert_eq!(
        meta.node_at(&[PathSegment::Index(2), "tags".into()])
            .and_then(|tags| tags.items())
            .map(<[_]>::len),
        Some(3)
    );
}

#[test]
fn test_meta_items_start_in_lock_step_with_defaults() {
    let schema = SchemaNode::object([
        ("fixed", SchemaNode::array_of_length(SchemaNode::number(), 3)),
        ("tags", SchemaNode::array(SchemaNode::string()).with_default(json!(["a", "b"]))),
        ("rows", SchemaNode::array(SchemaNode::object([("qty", SchemaNode::integer())]))),
    ]);
    for options in [
        DefaultOptions::default(),
        DefaultOptions {
            arrays: ArrayStrategy::Flat(ArrayMethod::Populate),
            ..DefaultOptions::default()
        },
        populate(2, None),
    ] {
        let value = derive_defaults(&schema, &options).unwrap().unwrap();
        let meta = create_meta_state(&schema, &options);
        for field in ["fixed", "tags", "rows"] {
            assert_eq!(
                meta.field(field).and_then(|node| node.items()).map(<[_]>::len),
                value[field].as_array().map(Vec::len),
                "{field} under {options:?}"
            );
        }
    }
}

#[test]
fn test_max_depth_zero_never_populates() {
    let schema = SchemaNode::object([(
        "grid",
        SchemaNode::array(SchemaNode::array(SchemaNode::number())),
    )]);
    let options = populate(
        2,
        Some(DepthPolicy {
            max: Some(0),
            layers: None,
            fallback: Some(ArrayMethod::Null),
        }),
    );
    assert_eq!(
        derive_defaults(&schema, &options).unwrap(),
        Some(json!({"grid": null}))
    );
}

#[test]
fn test_sync_tracks_live_array_length() {
    let schema = SchemaNode::object([(
        "rows",
        SchemaNode::array(SchemaNode::object([("qty", SchemaNode::integer())])),
    )]);
    let options = populate(1, None);
    let mut meta = create_meta_state(&schema, &options);
    let value = json!({"rows": [{"qty": 1}, {"qty": 2}, {"qty": 3}]});

    assert!(sync_meta_state(&mut meta, Some(&value), &schema, &options));
    let first = serde_json::to_string(&meta).unwrap();
    assert!(!sync_meta_state(&mut meta, Some(&value), &schema, &options));
    assert_eq!(serde_json::to_string(&meta).unwrap(), first);
    assert_eq!(meta.field("rows").unwrap().items().unwrap().len(), 3);

    let shorter = json!({"rows": [{"qty": 1}]});
    sync_meta_state(&mut meta, Some(&shorter), &schema, &options);
    assert_eq!(meta.field("rows").unwrap().items().unwrap().len(), 1);
}

// ─── Partial schemas ─────────────────────────────────────────────────

#[test]
fn test_discriminated_union_partial_accepts_bare_tag() {
    let schema = SchemaNode::discriminated_union(
        "type",
        vec![
            SchemaNode::object([
                ("type", SchemaNode::literal("text")),
                ("content", SchemaNode::string()),
            ]),
            SchemaNode::object([
                ("type", SchemaNode::literal("number")),
                ("content", SchemaNode::number()),
            ]),
        ],
    )
    .unwrap();
    let validator = Validator::new(Arc::new(NativeAdapter), Schema::native(schema));
    assert!(validator.validate_partial(&json!({"type": "text"})).unwrap().is_valid());
    assert!(!validator.validate(&json!({"type": "text"})).unwrap().is_valid());
    assert!(!validator
        .validate_partial(&json!({"type": "number", "content": "x"}))
        .unwrap()
        .is_valid());
    assert!(!validator.validate_partial(&json!({"content": 1})).unwrap().is_valid());
}

#[test]
fn test_partial_twice_accepts_the_same_values() {
    let schema = SchemaNode::object([
        ("name", SchemaNode::string()),
        ("address", SchemaNode::object([("city", SchemaNode::string())])),
    ]);
    let once = derive_partial(&schema).unwrap();
    let twice = derive_partial(&once).unwrap();
    for value in [
        json!({}),
        json!({"name": "x"}),
        json!({"address": {}}),
        json!({"address": {"city": 1}}),
        json!({"name": 3}),
        json!("nope"),
    ] {
        assert_eq!(
            parse_native(&once, &value).is_ok(),
            parse_native(&twice, &value).is_ok(),
            "{value}"
        );
    }
}

#[test]
fn test_registry_routes_native_and_json_schema() {
    let registry = AdapterRegistry::with_builtin();
    let document = Schema::document(json!({
        "type": "object",
        "properties": {
            "title": {"type": "string", "minLength": 1},
            "items": {"type": "array", "items": {"type": "object", "properties": {"sku": {"type": "string"}}, "required": ["sku"]}}
        },
        "required": ["title", "items"]
    }));
    let adapter = registry.resolve(&document).unwrap();
    assert_eq!(adapter.vendor(), "json-schema");
    assert_eq!(
        adapter
            .create_default_values(&document, &populate(1, None))
            .unwrap(),
        Some(json!({"title": "", "items": [{"sku": ""}]}))
    );

    let validator = registry.validator(document).unwrap();
    assert!(validator.validate_partial(&json!({"items": [{}]})).unwrap().is_valid());
    let full = validator.validate(&json!({"items": [{}]})).unwrap();
    let errors = full.errors().unwrap();
    assert_eq!(errors.field("title").unwrap().error.as_deref(), Some("Required"));
    assert_eq!(
        errors.field("items").unwrap().item(0).unwrap().field("sku").unwrap().error.as_deref(),
        Some("Required")
    );
}

// ─── Properties ──────────────────────────────────────────────────────

fn arb_person_value() -> impl Strategy<Value = Value> {
    let name = prop_oneof![
        Just(None),
        Just(Some(json!(null))),
        "[a-z]{0,4}".prop_map(|s| Some(json!(s))),
        any::<i32>().prop_map(|n| Some(json!(n))),
    ];
    let age = prop_oneof![
        Just(None),
        any::<i16>().prop_map(|n| Some(json!(n))),
        (-5.0f64..5.0).prop_map(|x| Some(json!(x))),
        "[a-z]{0,2}".prop_map(|s| Some(json!(s))),
    ];
    (name, age).prop_map(|(name, age)| {
        let mut object = serde_json::Map::new();
        if let Some(name) = name {
            object.insert("name".into(), name);
        }
        if let Some(age) = age {
            object.insert("age".into(), age);
        }
        Value::Object(object)
    })
}

fn arb_root_array() -> impl Strategy<Value = (SchemaNode, Value)> {
    let value = prop_oneof![
        Just(json!(null)),
        Just(json!([])),
        Just(json!("x")),
        Just(json!({})),
        prop::collection::vec(
            prop_oneof!["[a-z]{0,3}".prop_map(Value::from), any::<i8>().prop_map(Value::from)],
            0..4
        )
        .prop_map(Value::from),
    ];
    (any::<bool>(), any::<bool>(), value).prop_map(|(nullable, optional, value)| {
        let mut schema = SchemaNode::array(SchemaNode::string());
        if nullable {
            schema = schema.nullable();
        }
        if optional {
            schema = schema.optional();
        }
        (schema, value)
    })
}

proptest! {
    #[test]
    fn root_array_partial_is_never_stricter((schema, value) in arb_root_array()) {
        let validator = Validator::new(Arc::new(NativeAdapter), Schema::native(schema));
        if validator.validate(&value).unwrap().is_valid() {
            prop_assert!(validator.validate_partial(&value).unwrap().is_valid());
        }
    }

    #[test]
    fn partial_is_never_stricter(value in arb_person_value()) {
        let schema = person();
        let partial = derive_partial(&schema).unwrap();
        prop_assert!(error_count(&partial, &value) <= error_count(&schema, &value));
        if parse_native(&schema, &value).is_ok() {
            prop_assert!(parse_native(&partial, &value).is_ok());
        }
    }

    #[test]
    fn defaults_cover_every_declared_field(length in 0usize..4) {
        let schema = SchemaNode::object([
            ("person", person()),
            ("rows", SchemaNode::array(person())),
        ]);
        let value = derive_defaults(&schema, &populate(length, None)).unwrap().unwrap();
        prop_assert!(value["person"].get("name").is_some());
        prop_assert!(value["person"].get("age").is_some());
        let rows = value["rows"].as_array().unwrap();
        prop_assert_eq!(rows.len(), length);
        for row in rows {
            prop_assert!(row.get("name").is_some() && row.get("age").is_some());
        }
    }
}
