use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use dictable_core::{
    Enumeration, Field, Registry, RegistryBuilder, RegistryConfig, Schema, TypeHint, Value,
};
use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::document::{EntityDoc, FieldDoc, KindDoc, SchemaDocument};
use crate::error::{DocumentError, Result};

/// Read a schema document from disk, bounded by `max_document_size`.
pub fn load_file(path: &Path, config: &LoaderConfig) -> Result<Registry> {
    let file = std::fs::File::open(path)
        .map_err(|err| DocumentError::LoadFailed(format!("{}: {err}", path.display())))?;
    let metadata = file
        .metadata()
        .map_err(|err| DocumentError::LoadFailed(err.to_string()))?;
    if !metadata.is_file() {
        return Err(DocumentError::LoadFailed(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    if metadata.len() > config.max_document_size as u64 {
        return Err(DocumentError::LoadFailed(format!(
            "schema document too large ({} bytes): {}",
            metadata.len(),
            path.display()
        )));
    }

    let max_bytes = config.max_document_size;
    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            DocumentError::LoadFailed(format!("failed reading {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(DocumentError::LoadFailed(format!(
            "schema document too large while reading: {}",
            path.display()
        )));
    }

    load_str(&content, config)
}

/// Parse a schema document from JSON text.
pub fn load_str(text: &str, config: &LoaderConfig) -> Result<Registry> {
    if text.len() > config.max_document_size {
        return Err(DocumentError::LoadFailed(format!(
            "schema document too large ({} bytes)",
            text.len()
        )));
    }
    let document: SchemaDocument = serde_json::from_str(text)?;
    build_registry(document, config)
}

/// Load an already parsed document value.
pub fn load_value(value: Json, config: &LoaderConfig) -> Result<Registry> {
    let document: SchemaDocument = serde_json::from_value(value)?;
    build_registry(document, config)
}

fn build_registry(document: SchemaDocument, config: &LoaderConfig) -> Result<Registry> {
    let enums: IndexMap<String, Arc<Enumeration>> = document
        .enums
        .iter()
        .map(|(name, members)| {
            let enumeration = members
                .iter()
                .fold(Enumeration::new(name.as_str()), |acc, (member, value)| {
                    acc.member(member.as_str(), value.clone())
                });
            (name.clone(), Arc::new(enumeration))
        })
        .collect();

    let mut built: IndexMap<String, Schema> = IndexMap::new();
    for name in inheritance_order(&document.entities)? {
        let entity = &document.entities[name];
        let mut builder = Schema::builder(name);
        if let Some(parent) = &entity.extends {
            // inheritance_order places parents first
            if let Some(parent) = built.get(parent) {
                builder = builder.extends(parent);
            }
        }
        if let Some(description) = &entity.description {
            builder = builder.describe(description);
        }
        for (attr, doc) in &entity.fields {
            builder = builder.field(attr, field_from_doc(name, attr, doc, &enums)?);
        }
        for (attr, text) in &entity.hints {
            builder = builder.hint(attr, TypeHint::parse(text)?);
        }
        built.insert(name.to_string(), builder.build()?);
    }

    let mut registry = RegistryBuilder::with_config(RegistryConfig {
        strict_mode: config.strict_mode || document.strict,
        allow_subtypes: config.allow_subtypes,
    });
    for name in document.entities.keys() {
        if let Some(schema) = built.swap_remove(name) {
            registry.register(schema)?;
        }
    }
    let registry = registry.build()?;
    debug!(
        entities = registry.len(),
        enums = enums.len(),
        "schema document loaded"
    );
    Ok(registry)
}

/// Entity names with every parent ahead of its children.
fn inheritance_order(entities: &IndexMap<String, EntityDoc>) -> Result<Vec<&str>> {
    #[derive(Clone, Copy)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        name: &'a str,
        entities: &'a IndexMap<String, EntityDoc>,
        marks: &mut IndexMap<&'a str, Mark>,
        order: &mut Vec<&'a str>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(DocumentError::InheritanceCycle(name.to_string()));
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        if let Some(parent) = entities.get(name).and_then(|entity| entity.extends.as_deref()) {
            let Some((parent, _)) = entities.get_key_value(parent) else {
                return Err(DocumentError::UnknownParent {
                    entity: name.to_string(),
                    parent: parent.to_string(),
                });
            };
            visit(parent, entities, marks, order)?;
        }
        marks.insert(name, Mark::Done);
        order.push(name);
        Ok(())
    }

    let mut marks = IndexMap::new();
    let mut order = Vec::with_capacity(entities.len());
    for name in entities.keys() {
        visit(name, entities, &mut marks, &mut order)?;
    }
    Ok(order)
}

fn field_from_doc(
    entity: &str,
    attr: &str,
    doc: &FieldDoc,
    enums: &IndexMap<String, Arc<Enumeration>>,
) -> Result<Field> {
    let mut field = match &doc.kind {
        KindDoc::Str => Field::str(),
        KindDoc::Int => Field::int(),
        KindDoc::Float => Field::float(),
        KindDoc::Bool => Field::bool(),
        KindDoc::Datetime => Field::datetime(),
        KindDoc::Any => Field::any(),
        KindDoc::Object { entity: target } => Field::object(target.as_str()),
        KindDoc::List { of } => Field::list(field_from_doc(entity, attr, of, enums)?),
        KindDoc::Dict { keys, values } => {
            let key = match keys {
                Some(doc) => field_from_doc(entity, attr, doc, enums)?,
                None => Field::str(),
            };
            let value = match values {
                Some(doc) => field_from_doc(entity, attr, doc, enums)?,
                None => Field::any(),
            };
            Field::dict_of(key, value)
        }
        KindDoc::Union { of } => Field::union(
            of.iter()
                .map(|member| field_from_doc(entity, attr, member, enums))
                .collect::<Result<_>>()?,
        ),
        KindDoc::Enum {
            enumeration,
            by_name,
        } => {
            let resolved = enums.get(enumeration).ok_or_else(|| {
                DocumentError::UnknownEnumeration {
                    entity: entity.to_string(),
                    field: attr.to_string(),
                    enumeration: enumeration.clone(),
                }
            })?;
            let field = Field::enumeration(Arc::clone(resolved));
            if *by_name {
                field.by_name()
            } else {
                field
            }
        }
        KindDoc::MultiType {
            entities,
            discriminator,
        } => {
            let field = Field::multi_type(entities.iter().cloned());
            match discriminator {
                Some(key) => field.discriminator(key.as_str()),
                None => field,
            }
        }
        KindDoc::Regex { pattern } => Field::regex(pattern)?,
        KindDoc::IntRange { min, max } => Field::int_range(*min, *max),
        KindDoc::FloatRange { min, max } => Field::float_range(*min, *max),
    };

    if doc.required {
        field = field.required();
    }
    if let Some(key) = &doc.key {
        field = field.key(key.as_str());
    }
    if let Some(description) = &doc.description {
        field = field.describe(description.as_str());
    }

    let invalid_default = |message: String| DocumentError::InvalidDefault {
        entity: entity.to_string(),
        field: attr.to_string(),
        message,
    };
    match (&doc.default, &doc.default_factory) {
        (Some(_), Some(_)) => {
            return Err(invalid_default(
                "default and default_factory are mutually exclusive".to_string(),
            ));
        }
        (Some(raw), None) => {
            // Defaults are checked without a registry, so they cannot hold entities.
            let scalars = Registry::empty();
            let value = field
                .check_external(&scalars, raw)
                .and_then(|()| field.from_external(&scalars, raw))
                .map_err(|err| invalid_default(err.to_string()))?;
            field = field.default(value);
        }
        (None, Some(factory)) => {
            field = match factory.as_str() {
                "now" => field.default_factory("now", || Value::Timestamp(Utc::now())),
                "empty_list" => field.default_factory("empty_list", || Value::List(Vec::new())),
                "empty_dict" => {
                    field.default_factory("empty_dict", || Value::Dict(IndexMap::new()))
                }
                other => {
                    return Err(DocumentError::UnknownFactory {
                        entity: entity.to_string(),
                        field: attr.to_string(),
                        factory: other.to_string(),
                    });
                }
            };
        }
        (None, None) => {}
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parents_are_ordered_before_children() {
        let document: SchemaDocument = serde_json::from_value(json!({
            "entities": {
                "Manager": {"extends": "Employee"},
                "Employee": {"extends": "Person"},
                "Person": {}
            }
        }))
        .unwrap();
        assert_eq!(
            inheritance_order(&document.entities).unwrap(),
            ["Person", "Employee", "Manager"]
        );
    }

    #[test]
    fn inheritance_cycles_are_rejected() {
        let document: SchemaDocument = serde_json::from_value(json!({
            "entities": {"A": {"extends": "B"}, "B": {"extends": "A"}}
        }))
        .unwrap();
        assert!(matches!(
            inheritance_order(&document.entities),
            Err(DocumentError::InheritanceCycle(_))
        ));
    }

    #[test]
    fn oversized_text_is_rejected_before_parsing() {
        let config = LoaderConfig {
            max_document_size: 8,
            ..LoaderConfig::default()
        };
        assert!(matches!(
            load_str(r#"{"entities": {}}"#, &config),
            Err(DocumentError::LoadFailed(_))
        ));
    }
}
