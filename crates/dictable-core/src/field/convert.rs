use indexmap::IndexMap;
use serde_json::Value as Json;

use super::validate::{
    accepts_external, exact_float, exact_int, expect_mapping, lookup_member, mismatch,
    select_entity, timestamp_from_millis,
};
use super::{EnumBy, Field, FieldKind};
use crate::config::OutputMode;
use crate::entity;
use crate::error::{DictableError, Result};
use crate::path::Segment;
use crate::registry::Registry;
use crate::value::Value;

impl Field {
    /// Convert a raw value into its in-memory form.
    ///
    /// `null` converts to [`Value::Null`]; requiredness is enforced by the
    /// checks, not here.
    pub fn from_external(&self, registry: &Registry, raw: &Json) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match self.kind() {
            FieldKind::Str | FieldKind::Regex(_) => raw
                .as_str()
                .map(|text| Value::Str(text.to_string()))
                .ok_or_else(|| mismatch("a string", raw)),
            FieldKind::Int | FieldKind::IntRange { .. } => {
                exact_int(raw, "an integer").map(Value::Int)
            }
            FieldKind::Float | FieldKind::FloatRange { .. } => exact_float(raw)
                .map(Value::Float)
                .ok_or_else(|| mismatch("a float", raw)),
            FieldKind::Bool => raw
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| mismatch("a bool", raw)),
            FieldKind::Datetime => {
                let millis = exact_int(raw, "an epoch-millisecond integer")?;
                timestamp_from_millis(millis).map(Value::Timestamp)
            }
            FieldKind::Any => Ok(Value::Raw(raw.clone())),
            FieldKind::Object(name) => {
                let schema = registry.schema(name)?;
                entity::build(registry, schema, Vec::new(), Some(raw), None).map(Value::Object)
            }
            FieldKind::List(element) => {
                let items = raw.as_array().ok_or_else(|| mismatch("a list", raw))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        element
                            .from_external(registry, item)
                            .map_err(|err| err.within(Segment::Index(index)))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::List)
            }
            FieldKind::Dict { key, value } => {
                let mut converted = IndexMap::new();
                for (name, item) in expect_mapping(raw)? {
                    let (text, entry) = key
                        .key_from_text(registry, name)
                        .and_then(|typed| key.from_external(registry, &typed))
                        .and_then(|typed| {
                            let text = key_text(&key.to_external(&typed, OutputMode::Full), name);
                            Ok((text, value.from_external(registry, item)?))
                        })
                        .map_err(|err| err.within(Segment::Key(name.clone())))?;
                    converted.insert(text, entry);
                }
                Ok(Value::Dict(converted))
            }
            FieldKind::Union(members) => {
                for member in members {
                    if accepts_external(member, registry, raw)? {
                        return member.from_external(registry, raw);
                    }
                }
                Err(DictableError::Unsupported(format!(
                    "no union member accepts {raw}"
                )))
            }
            FieldKind::Enum { enumeration, by } => {
                lookup_member(enumeration, *by, raw).map(Value::Enum)
            }
            FieldKind::MultiType {
                entities,
                discriminator,
            } => {
                let (schema, _) = select_entity(registry, entities, discriminator, raw)?;
                entity::build(registry, schema, Vec::new(), Some(raw), Some(discriminator))
                    .map(Value::Object)
            }
            FieldKind::Custom(codec) => codec.from_external(raw).map_err(DictableError::invalid),
        }
    }

    /// Convert an in-memory value back to its raw form.
    ///
    /// Values that do not fit the kind fall back to [`Value::to_json`].
    pub fn to_external(&self, value: &Value, mode: OutputMode) -> Json {
        match (self.kind(), value) {
            (_, Value::Null) => Json::Null,
            (FieldKind::Enum { by, .. }, Value::Enum(member)) => match by {
                EnumBy::Value => member.value().clone(),
                EnumBy::Name => Json::String(member.name().to_string()),
            },
            (FieldKind::MultiType { discriminator, .. }, Value::Object(entity)) => {
                let mut map = entity.to_map(mode);
                map.insert(
                    discriminator.clone(),
                    Json::String(entity.name().to_string()),
                );
                Json::Object(map)
            }
            (FieldKind::List(element), Value::List(items)) => Json::Array(
                items
                    .iter()
                    .map(|item| element.to_external(item, mode))
                    .collect(),
            ),
            (FieldKind::Dict { value: field, .. }, Value::Dict(map)) => Json::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), field.to_external(item, mode)))
                    .collect(),
            ),
            (FieldKind::Union(members), value) => members
                .iter()
                .find(|member| member.matches_shape(value))
                .map_or_else(|| value.to_json(), |member| member.to_external(value, mode)),
            (FieldKind::Custom(codec), value) => codec.to_external(value),
            (_, Value::Object(entity)) => Json::Object(entity.to_map(mode)),
            (_, value) => value.to_json(),
        }
    }
}

/// Canonical text of a converted dict key, e.g. `7` for the wire key `07`.
fn key_text(typed: &Json, wire: &str) -> String {
    match typed {
        Json::String(text) => text.clone(),
        Json::Null => wire.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::field::Enumeration;

    fn role() -> Arc<Enumeration> {
        Arc::new(
            Enumeration::new("Role")
                .member("ADMIN", "admin")
                .member("DEV", 2),
        )
    }

    #[test]
    fn union_picks_first_accepting_member() {
        let registry = Registry::empty();
        let field = Field::union(vec![Field::int(), Field::str()]);
        assert_eq!(field.from_external(&registry, &json!(1)).unwrap(), Value::Int(1));
        assert_eq!(
            field.from_external(&registry, &json!("1")).unwrap(),
            Value::from("1")
        );
        assert!(matches!(
            field.from_external(&registry, &json!(1.5)),
            Err(DictableError::Unsupported(_))
        ));
    }

    #[test]
    fn dict_keys_convert_from_text() {
        let registry = Registry::empty();
        let field = Field::dict_of(Field::int(), Field::str());
        let value = field
            .from_external(&registry, &json!({"07": "a", "8": "b"}))
            .unwrap();
        let keys: Vec<_> = value.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["7", "8"]);
        assert_eq!(
            field.to_external(&value, OutputMode::Full),
            json!({"7": "a", "8": "b"})
        );

        let err = field
            .check_external(&registry, &json!({"x": "a"}))
            .unwrap_err();
        assert_eq!(err.validation().unwrap().path().to_string(), "{x}");

        let by_role = Field::dict_of(Field::enumeration(role()), Field::bool());
        assert!(by_role
            .check_external(&registry, &json!({"admin": true, "2": false}))
            .is_ok());
        assert!(by_role.check_external(&registry, &json!({"3": true})).is_err());
    }

    #[test]
    fn datetime_round_trips_epoch_millis() {
        let registry = Registry::empty();
        let field = Field::datetime();
        let value = field.from_external(&registry, &json!(1_617_129_000_123i64)).unwrap();
        assert_eq!(
            value,
            Value::Timestamp(Utc.timestamp_millis_opt(1_617_129_000_123).single().unwrap())
        );
        assert_eq!(
            field.to_external(&value, OutputMode::Full),
            json!(1_617_129_000_123i64)
        );
    }

    #[test]
    fn enum_converts_by_value_or_name() {
        let registry = Registry::empty();
        let by_value = Field::enumeration(role());
        let member = by_value.from_external(&registry, &json!(2)).unwrap();
        assert_eq!(member.as_enum().unwrap().name(), "DEV");
        assert_eq!(by_value.to_external(&member, OutputMode::Full), json!(2));

        let by_name = Field::enumeration(role()).by_name();
        let member = by_name.from_external(&registry, &json!("ADMIN")).unwrap();
        assert_eq!(by_name.to_external(&member, OutputMode::Full), json!("ADMIN"));

        let err = by_value.from_external(&registry, &json!(4)).unwrap_err();
        assert_eq!(err.validation().unwrap().message(), "invalid key 4 for enum Role");
    }

    #[test]
    fn dict_keeps_entry_order() {
        let registry = Registry::empty();
        let field = Field::dict_of(Field::str(), Field::int());
        let value = field
            .from_external(&registry, &json!({"zeta": 1, "alpha": 2}))
            .unwrap();
        let keys: Vec<_> = value.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(
            field.to_external(&value, OutputMode::Full),
            json!({"zeta": 1, "alpha": 2})
        );
    }

    #[test]
    fn any_keeps_raw_payload() {
        let registry = Registry::empty();
        let raw = json!({"nested": [1, "two", null]});
        let value = Field::any().from_external(&registry, &raw).unwrap();
        assert_eq!(value, Value::Raw(raw.clone()));
        assert_eq!(Field::any().to_external(&value, OutputMode::Full), raw);
    }

    #[test]
    fn list_conversion_reports_index() {
        let registry = Registry::empty();
        let err = Field::list(Field::float())
            .from_external(&registry, &json!([1.0, 2]))
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed at [1]: expected a float, got integer");
    }
}
