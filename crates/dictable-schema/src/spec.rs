//! Declarative field specs: `{type, required, of?, description?}` trees.

use std::collections::{HashSet, VecDeque};

use dictable_core::{EnumBy, Field, FieldKind, Registry, Schema};
use serde_json::{json, Map, Value as Json};
use tracing::debug;

use crate::error::{Result, SchemaError};

/// How nested entities appear in a spec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpecStyle {
    /// Flat when possible, definitions table when the schema is cyclic.
    #[default]
    Auto,
    /// Nested field maps inlined; cyclic schemas fail.
    Flat,
    /// Every entity once in `$defs`, referenced by `#/$defs/Name`.
    Definitions,
}

/// Flat spec of every field of `schema`, keyed by serialized key.
pub fn input_spec(registry: &Registry, schema: &Schema) -> Result<Json> {
    SpecWriter::flat(registry).expand(schema).map(Json::Object)
}

/// Flat spec of a single field.
pub fn field_spec(registry: &Registry, field: &Field) -> Result<Json> {
    SpecWriter::flat(registry).field(field)
}

/// Spec with each reachable entity registered once in a definitions table.
///
/// Output shape: `{"$defs": {Name: {key: spec}}, "$root": "#/$defs/Name"}`.
pub fn definitions_spec(registry: &Registry, schema: &Schema) -> Result<Json> {
    let mut writer = SpecWriter::definitions(registry);
    writer.mark_seen(schema.name());

    let mut defs = Map::new();
    defs.insert(
        schema.name().to_string(),
        Json::Object(writer.fields(schema)?),
    );
    while let Some(name) = writer.next_pending() {
        let nested = registry.schema(&name)?;
        let fields = writer.fields(nested)?;
        defs.insert(name, Json::Object(fields));
    }

    Ok(json!({
        "$defs": defs,
        "$root": reference(schema.name()),
    }))
}

/// Spec in the requested style.
pub fn schema_spec(registry: &Registry, schema: &Schema, style: SpecStyle) -> Result<Json> {
    match style {
        SpecStyle::Flat => input_spec(registry, schema),
        SpecStyle::Definitions => definitions_spec(registry, schema),
        SpecStyle::Auto => match input_spec(registry, schema) {
            Err(SchemaError::Cyclic(entity)) => {
                debug!(root = schema.name(), %entity, "cyclic schema, using definitions table");
                definitions_spec(registry, schema)
            }
            other => other,
        },
    }
}

pub(crate) fn reference(name: &str) -> String {
    format!("#/$defs/{name}")
}

enum Layout {
    /// Entities currently being expanded, outermost first.
    Flat { open: Vec<String> },
    Definitions {
        seen: HashSet<String>,
        pending: VecDeque<String>,
    },
}

struct SpecWriter<'r> {
    registry: &'r Registry,
    layout: Layout,
}

impl<'r> SpecWriter<'r> {
    fn flat(registry: &'r Registry) -> Self {
        Self {
            registry,
            layout: Layout::Flat { open: Vec::new() },
        }
    }

    fn definitions(registry: &'r Registry) -> Self {
        Self {
            registry,
            layout: Layout::Definitions {
                seen: HashSet::new(),
                pending: VecDeque::new(),
            },
        }
    }

    fn mark_seen(&mut self, name: &str) {
        if let Layout::Definitions { seen, .. } = &mut self.layout {
            seen.insert(name.to_string());
        }
    }

    fn next_pending(&mut self) -> Option<String> {
        match &mut self.layout {
            Layout::Definitions { pending, .. } => pending.pop_front(),
            Layout::Flat { .. } => None,
        }
    }

    fn expand(&mut self, schema: &Schema) -> Result<Map<String, Json>> {
        if let Layout::Flat { open } = &mut self.layout {
            if open.iter().any(|name| name == schema.name()) {
                return Err(SchemaError::Cyclic(schema.name().to_string()));
            }
            open.push(schema.name().to_string());
        }
        let fields = self.fields(schema);
        if let Layout::Flat { open } = &mut self.layout {
            open.pop();
        }
        fields
    }

    fn fields(&mut self, schema: &Schema) -> Result<Map<String, Json>> {
        let mut map = Map::new();
        for slot in schema.slots() {
            map.insert(slot.key().to_string(), self.field(slot.field())?);
        }
        Ok(map)
    }

    fn field(&mut self, field: &Field) -> Result<Json> {
        let mut spec = Map::new();
        spec.insert("type".into(), json!(field.kind().type_name()));
        spec.insert("required".into(), json!(field.is_required()));
        if let Some(of) = self.of(field.kind())? {
            spec.insert("of".into(), of);
        }
        if let Some(description) = field.description() {
            spec.insert("description".into(), json!(description));
        }
        Ok(Json::Object(spec))
    }

    fn of(&mut self, kind: &FieldKind) -> Result<Option<Json>> {
        let of = match kind {
            FieldKind::List(element) => self.field(element)?,
            FieldKind::Dict { key, value } => json!({
                "key": self.field(key)?,
                "value": self.field(value)?,
            }),
            FieldKind::Union(members) => Json::Array(
                members
                    .iter()
                    .map(|member| self.field(member))
                    .collect::<Result<_>>()?,
            ),
            FieldKind::Object(name) => self.entity(name)?,
            FieldKind::MultiType { entities, .. } => {
                let mut map = Map::new();
                for name in entities {
                    map.insert(name.clone(), self.entity(name)?);
                }
                Json::Object(map)
            }
            FieldKind::Enum { enumeration, by } => match by {
                EnumBy::Value => enumeration.values().cloned().collect(),
                EnumBy::Name => enumeration.names().map(Json::from).collect(),
            },
            FieldKind::Regex(pattern) => json!(pattern.as_str()),
            FieldKind::IntRange { min, max } => json!({"min": min, "max": max}),
            FieldKind::FloatRange { min, max } => json!({"min": min, "max": max}),
            _ => return Ok(None),
        };
        Ok(Some(of))
    }

    fn entity(&mut self, name: &str) -> Result<Json> {
        if let Layout::Definitions { seen, pending } = &mut self.layout {
            if seen.insert(name.to_string()) {
                pending.push_back(name.to_string());
            }
            return Ok(json!({ "$ref": reference(name) }));
        }
        let schema = self.registry.schema(name)?;
        self.expand(schema).map(Json::Object)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dictable_core::Enumeration;

    use super::*;

    fn single(schema: Schema) -> (Registry, Arc<Schema>) {
        let mut builder = Registry::builder();
        let schema = builder.register(schema).unwrap();
        (builder.build().unwrap(), schema)
    }

    #[test]
    fn scalar_and_collection_specs() {
        let (registry, schema) = single(
            Schema::builder("Profile")
                .field("name", Field::str().required().describe("display name"))
                .field("scores", Field::dict_of(Field::str(), Field::list(Field::int())))
                .field("code", Field::regex("^[A-Z]{3}$").unwrap())
                .field("level", Field::int_range(Some(1), None))
                .build()
                .unwrap(),
        );
        let spec = input_spec(&registry, &schema).unwrap();
        assert_eq!(
            spec,
            json!({
                "name": {"type": "str", "required": true, "description": "display name"},
                "scores": {
                    "type": "dict",
                    "required": false,
                    "of": {
                        "key": {"type": "str", "required": false},
                        "value": {
                            "type": "list",
                            "required": false,
                            "of": {"type": "int", "required": false}
                        }
                    }
                },
                "code": {"type": "regex", "required": false, "of": "^[A-Z]{3}$"},
                "level": {"type": "int_range", "required": false, "of": {"min": 1, "max": null}}
            })
        );
    }

    #[test]
    fn enum_spec_lists_values_or_names() {
        let role = Arc::new(Enumeration::new("Role").member("ADMIN", "admin").member("DEV", 2));
        let registry = Registry::empty();
        assert_eq!(
            field_spec(&registry, &Field::enumeration(Arc::clone(&role))).unwrap()["of"],
            json!(["admin", 2])
        );
        assert_eq!(
            field_spec(&registry, &Field::enumeration(role).by_name()).unwrap()["of"],
            json!(["ADMIN", "DEV"])
        );
    }

    #[test]
    fn union_spec_lists_members_in_order() {
        let spec = field_spec(
            &Registry::empty(),
            &Field::union(vec![Field::int(), Field::str().required()]),
        )
        .unwrap();
        assert_eq!(
            spec["of"],
            json!([
                {"type": "int", "required": false},
                {"type": "str", "required": true}
            ])
        );
    }

    #[test]
    fn self_reference_fails_flat_and_falls_back() {
        let (registry, node) = single(
            Schema::builder("Node")
                .field("children", Field::list(Field::object("Node")))
                .build()
                .unwrap(),
        );
        assert!(matches!(
            input_spec(&registry, &node),
            Err(SchemaError::Cyclic(name)) if name == "Node"
        ));
        let spec = schema_spec(&registry, &node, SpecStyle::Auto).unwrap();
        assert_eq!(spec["$root"], json!("#/$defs/Node"));
        assert_eq!(
            spec["$defs"]["Node"]["children"]["of"]["of"],
            json!({"$ref": "#/$defs/Node"})
        );
    }
}
