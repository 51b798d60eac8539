//! JSON Schema 2020-12 export.

use std::collections::{HashSet, VecDeque};

use dictable_core::{EnumBy, Field, FieldKind, Registry, Schema, DEFAULT_DISCRIMINATOR};
use serde_json::{json, Map, Value as Json};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::spec::reference;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Export `schema` and every entity it reaches as one JSON Schema document.
///
/// Entities land in `$defs` and the root is a `$ref`, so cyclic schemas
/// export without expansion. Optional fields accept `null`. Multi-type
/// members get a separate definition that requires the discriminator.
pub fn to_json_schema(
    registry: &Registry,
    schema: &Schema,
    config: &ExportConfig,
) -> Result<Json> {
    let mut exporter = Exporter {
        config,
        seen: HashSet::new(),
        pending: VecDeque::new(),
    };
    let root = definition_name(schema.name(), None);
    exporter.seen.insert(root.clone());

    let mut defs = Map::new();
    defs.insert(root.clone(), exporter.object(schema, None)?);
    while let Some((name, discriminator)) = exporter.pending.pop_front() {
        let nested = registry.schema(&name)?;
        let definition = exporter.object(nested, discriminator.as_deref())?;
        defs.insert(definition_name(&name, discriminator.as_deref()), definition);
    }

    Ok(json!({
        "$schema": DRAFT,
        "$ref": reference(&root),
        "$defs": defs,
    }))
}

/// `Name` for plain objects, `Name__typed` for discriminated members.
///
/// Characters that need escaping in a `$ref` fragment, such as the brackets
/// of `SelectField[Gender]`, become `_`.
fn definition_name(entity: &str, discriminator: Option<&str>) -> String {
    let name = match discriminator {
        None => entity.to_string(),
        Some(DEFAULT_DISCRIMINATOR) => format!("{entity}__typed"),
        Some(key) => format!("{entity}__typed_{key}"),
    };
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

struct Exporter<'c> {
    config: &'c ExportConfig,
    seen: HashSet<String>,
    pending: VecDeque<(String, Option<String>)>,
}

impl Exporter<'_> {
    fn object(&mut self, schema: &Schema, discriminator: Option<&str>) -> Result<Json> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for slot in schema.slots() {
            properties.insert(slot.key().to_string(), self.field(slot.field()));
            if slot.field().is_required() {
                required.push(Json::from(slot.key()));
            }
        }
        if let Some(key) = discriminator {
            properties.insert(key.to_string(), json!({ "const": schema.name() }));
            required.push(Json::from(key));
        }

        let mut object = Map::new();
        object.insert("title".into(), json!(schema.name()));
        if let Some(description) = schema
            .description()
            .filter(|_| self.config.include_descriptions)
        {
            object.insert("description".into(), json!(description));
        }
        object.insert("type".into(), json!("object"));
        object.insert("properties".into(), Json::Object(properties));
        if !required.is_empty() {
            object.insert("required".into(), Json::Array(required));
        }
        if self.config.strict_mode {
            object.insert("additionalProperties".into(), Json::Bool(false));
        }
        Ok(Json::Object(object))
    }

    fn field(&mut self, field: &Field) -> Json {
        let base = self.kind(field.kind());
        let mut schema = if field.is_required() {
            base
        } else {
            json!({ "anyOf": [base, { "type": "null" }] })
        };
        if let (Some(description), Json::Object(map)) = (field.description(), &mut schema) {
            if self.config.include_descriptions {
                map.insert("description".into(), json!(description));
            }
        }
        schema
    }

    fn kind(&mut self, kind: &FieldKind) -> Json {
        match kind {
            FieldKind::Str => json!({ "type": "string" }),
            FieldKind::Int | FieldKind::Datetime => json!({ "type": "integer" }),
            FieldKind::Float => json!({ "type": "number" }),
            FieldKind::Bool => json!({ "type": "boolean" }),
            FieldKind::Any | FieldKind::Custom(_) => json!({}),
            FieldKind::Object(name) => self.reference(name, None),
            FieldKind::List(element) => json!({
                "type": "array",
                "items": self.field(element),
            }),
            FieldKind::Dict { key, value } => {
                let mut schema = json!({
                    "type": "object",
                    "additionalProperties": self.field(value),
                });
                if let Some(names) = self.property_names(key.kind()) {
                    schema["propertyNames"] = names;
                }
                schema
            }
            FieldKind::Union(members) => json!({
                "anyOf": members.iter().map(|member| self.field(member)).collect::<Vec<_>>(),
            }),
            FieldKind::Enum { enumeration, by } => {
                let members: Vec<Json> = match by {
                    EnumBy::Value => enumeration.values().cloned().collect(),
                    EnumBy::Name => enumeration.names().map(Json::from).collect(),
                };
                json!({ "enum": members })
            }
            FieldKind::MultiType {
                entities,
                discriminator,
            } => json!({
                "oneOf": entities
                    .iter()
                    .map(|name| self.reference(name, Some(discriminator.as_str())))
                    .collect::<Vec<_>>(),
            }),
            FieldKind::Regex(pattern) => json!({
                "type": "string",
                "pattern": pattern.as_str(),
            }),
            FieldKind::IntRange { min, max } => {
                bounded("integer", min.map(Json::from), max.map(Json::from))
            }
            FieldKind::FloatRange { min, max } => {
                bounded("number", min.map(Json::from), max.map(Json::from))
            }
        }
    }

    /// Object keys are always strings, so only text-shaped key kinds
    /// constrain them; integer keys are matched by pattern.
    fn property_names(&mut self, key: &FieldKind) -> Option<Json> {
        match key {
            FieldKind::Str | FieldKind::Regex(_) | FieldKind::Enum { by: EnumBy::Name, .. } => {
                Some(self.kind(key))
            }
            FieldKind::Int | FieldKind::Datetime => {
                Some(json!({ "type": "string", "pattern": "^-?[0-9]+$" }))
            }
            _ => None,
        }
    }

    fn reference(&mut self, entity: &str, discriminator: Option<&str>) -> Json {
        let name = definition_name(entity, discriminator);
        if self.seen.insert(name.clone()) {
            self.pending
                .push_back((entity.to_string(), discriminator.map(str::to_string)));
        }
        json!({ "$ref": reference(&name) })
    }
}

fn bounded(kind: &str, min: Option<Json>, max: Option<Json>) -> Json {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(kind));
    if let Some(min) = min {
        schema.insert("minimum".into(), min);
    }
    if let Some(max) = max {
        schema.insert("maximum".into(), max);
    }
    Json::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut builder = Registry::builder();
        for schema in [
            Schema::builder("CarA").field("brand", Field::str().required()).build(),
            Schema::builder("CarB").field("seats", Field::int()).build(),
            Schema::builder("Garage")
                .describe("cars by bay")
                .field("name", Field::str().required())
                .field("cars", Field::list(Field::multi_type(["CarA", "CarB"]).required()))
                .build(),
        ] {
            builder.register(schema.unwrap()).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn exports_defs_with_root_reference() {
        let registry = registry();
        let garage = registry.schema("Garage").unwrap();
        let doc = to_json_schema(&registry, garage, &ExportConfig::default()).unwrap();

        assert_eq!(doc["$ref"], json!("#/$defs/Garage"));
        assert_eq!(doc["$defs"]["Garage"]["required"], json!(["name"]));
        assert_eq!(doc["$defs"]["Garage"]["description"], json!("cars by bay"));
        assert_eq!(
            doc["$defs"]["Garage"]["properties"]["cars"]["anyOf"][1],
            json!({"type": "null"})
        );
        assert_eq!(
            doc["$defs"]["CarA__typed"]["properties"]["__type"],
            json!({"const": "CarA"})
        );
        assert_eq!(doc["$defs"]["CarB__typed"]["required"], json!(["__type"]));
        assert!(doc["$defs"].get("CarA").is_none());
    }

    #[test]
    fn integer_dict_keys_export_as_digit_patterns() {
        let mut builder = Registry::builder();
        builder
            .register(
                Schema::builder("Scores")
                    .field("by_id", Field::dict_of(Field::int(), Field::str()).required())
                    .field("any_key", Field::dict_of(Field::float(), Field::int()).required())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let scores = registry.schema("Scores").unwrap();
        let doc = to_json_schema(&registry, scores, &ExportConfig::default()).unwrap();

        let properties = &doc["$defs"]["Scores"]["properties"];
        assert_eq!(
            properties["by_id"]["propertyNames"],
            json!({"type": "string", "pattern": "^-?[0-9]+$"})
        );
        assert!(properties["any_key"].get("propertyNames").is_none());

        let validator = jsonschema::validator_for(&doc).unwrap();
        assert!(validator.is_valid(&json!({"by_id": {"7": "x"}, "any_key": {"1.5": 2}})));
        assert!(!validator.is_valid(&json!({"by_id": {"x": "x"}, "any_key": {}})));
    }

    #[test]
    fn strict_export_closes_objects() {
        let registry = registry();
        let garage = registry.schema("Garage").unwrap();
        let config = ExportConfig {
            strict_mode: true,
            ..ExportConfig::default()
        };
        let doc = to_json_schema(&registry, garage, &config).unwrap();
        assert_eq!(
            doc["$defs"]["Garage"]["additionalProperties"],
            json!(false)
        );
        assert_eq!(
            doc["$defs"]["CarA__typed"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn definition_names_are_fragment_safe() {
        assert_eq!(definition_name("SelectField[Gender]", None), "SelectField_Gender_");
        assert_eq!(definition_name("CarA", Some("kind")), "CarA__typed_kind");
    }

    #[test]
    fn bounds_omit_open_sides() {
        assert_eq!(
            bounded("integer", Some(json!(1)), None),
            json!({"type": "integer", "minimum": 1})
        );
    }
}
