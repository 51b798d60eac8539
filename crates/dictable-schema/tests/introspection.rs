use dictable_core::{Field, Registry, Schema, TypeHint};
use dictable_schema::{
    definitions_spec, input_spec, schema_spec, ExportConfig, PayloadValidator, SchemaError,
    SpecStyle,
};
use serde_json::json;

fn cyclic_registry() -> Registry {
    let mut builder = Registry::builder();
    builder
        .register(
            Schema::builder("Author")
                .field("name", Field::str().required())
                .field("books", Field::list(Field::object("Book")))
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
        .register(
            Schema::builder("Book")
                .field("title", Field::str().required())
                .field("author", Field::object("Author"))
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.build().unwrap()
}

fn profile_registry() -> Registry {
    let mut builder = Registry::builder();
    builder
        .register(
            Schema::builder("Avatar")
                .field("url", Field::str().required())
                .field("size", Field::int_range(Some(16), Some(512)))
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
        .register(
            Schema::builder("User")
                .field("name", Field::str().required().key("user_name"))
                .field("avatar", Field::object("Avatar").required())
                .field("tags", Field::list(Field::str().required()).required())
                .hint("age", TypeHint::Int)
                .build()
                .unwrap(),
        )
        .unwrap();
    builder.build().unwrap()
}

#[test]
fn mutually_referencing_entities_produce_two_definitions() {
    let registry = cyclic_registry();
    let author = registry.schema("Author").unwrap();

    assert!(matches!(
        input_spec(&registry, author),
        Err(SchemaError::Cyclic(_))
    ));

    let spec = definitions_spec(&registry, author).unwrap();
    let defs = spec["$defs"].as_object().unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(spec["$root"], json!("#/$defs/Author"));
    assert_eq!(
        defs["Author"]["books"]["of"]["of"],
        json!({"$ref": "#/$defs/Book"})
    );
    assert_eq!(
        defs["Book"]["author"]["of"],
        json!({"$ref": "#/$defs/Author"})
    );

    assert_eq!(schema_spec(&registry, author, SpecStyle::Auto).unwrap(), spec);
}

#[test]
fn acyclic_auto_spec_is_flat() {
    let registry = profile_registry();
    let user = registry.schema("User").unwrap();
    let spec = schema_spec(&registry, user, SpecStyle::Auto).unwrap();
    assert_eq!(spec, input_spec(&registry, user).unwrap());
    assert_eq!(
        spec["avatar"]["of"]["url"],
        json!({"type": "str", "required": true})
    );
    assert_eq!(spec["age"], json!({"type": "int", "required": true}));

    let keys: Vec<_> = spec.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["user_name", "avatar", "tags", "age"]);
}

#[test]
fn partial_spec_relaxes_top_level_only() {
    let registry = profile_registry();
    let partial = registry.partial("User").unwrap();
    let spec = input_spec(&registry, &partial).unwrap();

    for key in ["user_name", "avatar", "tags", "age"] {
        assert_eq!(spec[key]["required"], json!(false), "{key}");
    }
    assert_eq!(spec["tags"]["of"]["required"], json!(true));
    assert_eq!(spec["avatar"]["of"]["url"]["required"], json!(true));

    let defs = definitions_spec(&registry, &partial).unwrap();
    assert_eq!(defs["$root"], json!("#/$defs/UserPartial"));
    assert!(defs["$defs"].get("Avatar").is_some());
}

#[test]
fn exported_schema_accepts_entity_output() {
    let registry = profile_registry();
    let user = registry.schema("User").unwrap();
    let validator = PayloadValidator::compile(&registry, user, &ExportConfig::default()).unwrap();

    let entity = registry
        .from_raw(
            "User",
            &json!({
                "user_name": "pramod",
                "avatar": {"url": "a.png", "size": 64},
                "tags": ["admin"],
                "age": 31
            }),
        )
        .unwrap();
    assert!(validator.validate(&entity.to_external()).is_ok());

    assert!(validator
        .validate(&json!({"user_name": "p", "avatar": {"url": "a", "size": 8}, "tags": [], "age": 1}))
        .is_err());
    assert!(validator
        .validate(&json!({"user_name": "p", "avatar": {"url": "a"}, "tags": [null], "age": 1}))
        .is_err());
}

#[test]
fn cyclic_schema_exports_and_validates() {
    let registry = cyclic_registry();
    let author = registry.schema("Author").unwrap();
    let validator =
        PayloadValidator::compile(&registry, author, &ExportConfig::default()).unwrap();
    assert!(validator
        .validate(&json!({
            "name": "ursula",
            "books": [{"title": "earthsea", "author": {"name": "ursula", "books": []}}]
        }))
        .is_ok());
    assert!(validator
        .validate(&json!({"name": "ursula", "books": [{"author": null}]}))
        .is_err());
}
