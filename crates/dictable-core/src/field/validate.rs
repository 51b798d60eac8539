use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value as Json};

use super::{EnumBy, Enumeration, Field, FieldKind};
use crate::entity::{validate_mapping, Entity};
use crate::error::{DictableError, Result};
use crate::path::Segment;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::value::{EnumMember, Value};

impl Field {
    /// Pre-check a raw value, honoring requiredness.
    ///
    /// Null passes for optional fields and fails for required ones.
    pub fn check_external(&self, registry: &Registry, raw: &Json) -> Result<()> {
        if raw.is_null() {
            return self.null_outcome();
        }
        self.validate_external(registry, raw)
    }

    /// Post-check an in-memory value, honoring requiredness.
    pub fn check_internal(&self, registry: &Registry, value: &Value) -> Result<()> {
        if value.is_null() {
            return self.null_outcome();
        }
        self.validate_internal(registry, value)
    }

    fn null_outcome(&self) -> Result<()> {
        if self.is_required() {
            Err(missing_value())
        } else {
            Ok(())
        }
    }

    /// Pre-check a non-null raw value against this field's contract.
    pub fn validate_external(&self, registry: &Registry, raw: &Json) -> Result<()> {
        match self.kind() {
            FieldKind::Str => expect(raw.is_string(), "a string", raw),
            FieldKind::Int => exact_int(raw, "an integer").map(|_| ()),
            FieldKind::Float => expect(exact_float(raw).is_some(), "a float", raw),
            FieldKind::Bool => expect(raw.is_boolean(), "a bool", raw),
            FieldKind::Datetime => {
                let millis = exact_int(raw, "an epoch-millisecond integer")?;
                timestamp_from_millis(millis).map(|_| ())
            }
            FieldKind::Any => Ok(()),
            FieldKind::Object(entity) => {
                let schema = registry.schema(entity)?;
                validate_mapping(registry, schema, expect_mapping(raw)?, &[], None)
            }
            FieldKind::List(element) => {
                let items = raw.as_array().ok_or_else(|| mismatch("a list", raw))?;
                for (index, item) in items.iter().enumerate() {
                    element
                        .check_external(registry, item)
                        .map_err(|err| err.within(Segment::Index(index)))?;
                }
                Ok(())
            }
            FieldKind::Dict { key, value } => {
                for (name, item) in expect_mapping(raw)? {
                    key.key_from_text(registry, name)
                        .and_then(|typed| key.check_external(registry, &typed))
                        .and_then(|()| value.check_external(registry, item))
                        .map_err(|err| err.within(Segment::Key(name.clone())))?;
                }
                Ok(())
            }
            FieldKind::Union(members) => {
                for member in members {
                    if accepts_external(member, registry, raw)? {
                        return Ok(());
                    }
                }
                Err(DictableError::invalid(format!(
                    "{} matches none of the union members ({})",
                    json_kind(raw),
                    member_names(members)
                )))
            }
            FieldKind::Enum { enumeration, by } => lookup_member(enumeration, *by, raw).map(|_| ()),
            FieldKind::MultiType {
                entities,
                discriminator,
            } => {
                let (schema, map) = select_entity(registry, entities, discriminator, raw)?;
                validate_mapping(registry, schema, map, &[], Some(discriminator))
            }
            FieldKind::Regex(pattern) => {
                let text = raw.as_str().ok_or_else(|| mismatch("a string", raw))?;
                if pattern.is_match(text) {
                    Ok(())
                } else {
                    Err(DictableError::invalid(format!(
                        "`{text}` does not match pattern `{}`",
                        pattern.as_str()
                    )))
                }
            }
            FieldKind::IntRange { min, max } => {
                let number = exact_int(raw, "an integer")?;
                check_bounds(number, *min, *max)
            }
            FieldKind::FloatRange { min, max } => {
                let number = exact_float(raw).ok_or_else(|| mismatch("a float", raw))?;
                check_bounds(number, *min, *max)
            }
            FieldKind::Custom(codec) => codec
                .validate_external(raw)
                .map_err(DictableError::invalid),
        }
    }

    /// Post-check a non-null in-memory value against this field's contract.
    ///
    /// Range and pattern refinements are pre-check only; here they verify
    /// the base scalar type.
    pub fn validate_internal(&self, registry: &Registry, value: &Value) -> Result<()> {
        match (self.kind(), value) {
            (FieldKind::Str | FieldKind::Regex(_), Value::Str(_))
            | (FieldKind::Int | FieldKind::IntRange { .. }, Value::Int(_))
            | (FieldKind::Float | FieldKind::FloatRange { .. }, Value::Float(_))
            | (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Datetime, Value::Timestamp(_))
            | (FieldKind::Any, _) => Ok(()),
            (FieldKind::Object(expected), Value::Object(entity)) => {
                if !is_instance_of(registry, entity, expected) {
                    return Err(DictableError::invalid(format!(
                        "expected a {expected} entity, got {}",
                        entity.name()
                    )));
                }
                entity.validate(registry)
            }
            (FieldKind::List(element), Value::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    element
                        .check_internal(registry, item)
                        .map_err(|err| err.within(Segment::Index(index)))?;
                }
                Ok(())
            }
            (FieldKind::Dict { key, value: field }, Value::Dict(map)) => {
                for (name, item) in map {
                    key.key_from_text(registry, name)
                        .and_then(|typed| key.check_external(registry, &typed))
                        .and_then(|()| field.check_internal(registry, item))
                        .map_err(|err| err.within(Segment::Key(name.clone())))?;
                }
                Ok(())
            }
            (FieldKind::Union(members), value) => {
                for member in members {
                    match member.check_internal(registry, value) {
                        Ok(()) => return Ok(()),
                        Err(DictableError::Validation(_)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Err(DictableError::invalid(format!(
                    "{} value matches none of the union members ({})",
                    value.kind_name(),
                    member_names(members)
                )))
            }
            (FieldKind::Enum { enumeration, .. }, Value::Enum(member)) => {
                if member.enumeration() == enumeration.name()
                    && enumeration.get(member.name()).is_some()
                {
                    Ok(())
                } else {
                    Err(DictableError::invalid(format!(
                        "{member} is not a member of enum {}",
                        enumeration.name()
                    )))
                }
            }
            (FieldKind::MultiType { entities, .. }, Value::Object(entity)) => {
                if !entities.iter().any(|name| name == entity.name()) {
                    return Err(DictableError::invalid(format!(
                        "entity {} is not one of [{}]",
                        entity.name(),
                        entities.join(", ")
                    )));
                }
                entity.validate(registry)
            }
            (FieldKind::Custom(codec), value) => codec
                .validate_internal(value)
                .map_err(DictableError::invalid),
            (kind, value) => Err(DictableError::invalid(format!(
                "expected {} value, got {}",
                kind.type_name(),
                value.kind_name()
            ))),
        }
    }

    /// Typed raw form of a dict key, which is always text on the wire.
    ///
    /// Text that does not parse for the key kind stays a string so the key's
    /// own check reports the mismatch.
    pub(crate) fn key_from_text(&self, registry: &Registry, text: &str) -> Result<Json> {
        let typed = match self.kind() {
            FieldKind::Int | FieldKind::IntRange { .. } | FieldKind::Datetime => {
                text.parse::<i64>().ok().map(Json::from)
            }
            FieldKind::Float | FieldKind::FloatRange { .. } => text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Json::Number),
            FieldKind::Bool => text.parse::<bool>().ok().map(Json::Bool),
            FieldKind::Enum {
                enumeration,
                by: EnumBy::Value,
            } => {
                let literal = Json::String(text.to_string());
                if enumeration.from_value(&literal).is_some() {
                    None
                } else {
                    serde_json::from_str::<Json>(text)
                        .ok()
                        .filter(|value| enumeration.from_value(value).is_some())
                }
            }
            FieldKind::Union(members) => {
                for member in members {
                    let candidate = member.key_from_text(registry, text)?;
                    if accepts_external(member, registry, &candidate)? {
                        return Ok(candidate);
                    }
                }
                None
            }
            _ => None,
        };
        Ok(typed.unwrap_or_else(|| Json::String(text.to_string())))
    }

    /// Registry-free shape test used to pick a union member on output.
    pub(crate) fn matches_shape(&self, value: &Value) -> bool {
        match (self.kind(), value) {
            (_, Value::Null) => !self.is_required(),
            (FieldKind::Str | FieldKind::Regex(_), Value::Str(_))
            | (FieldKind::Int | FieldKind::IntRange { .. }, Value::Int(_))
            | (FieldKind::Float | FieldKind::FloatRange { .. }, Value::Float(_))
            | (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Datetime, Value::Timestamp(_))
            | (FieldKind::Any, _) => true,
            (FieldKind::Object(expected), Value::Object(entity)) => {
                entity.name() == expected || entity.schema().descends_from(expected)
            }
            (FieldKind::MultiType { entities, .. }, Value::Object(entity)) => {
                entities.iter().any(|name| name == entity.name())
            }
            (FieldKind::List(element), Value::List(items)) => {
                items.iter().all(|item| element.matches_shape(item))
            }
            (FieldKind::Dict { value: field, .. }, Value::Dict(map)) => {
                map.values().all(|item| field.matches_shape(item))
            }
            (FieldKind::Union(members), value) => {
                members.iter().any(|member| member.matches_shape(value))
            }
            (FieldKind::Enum { enumeration, .. }, Value::Enum(member)) => {
                member.enumeration() == enumeration.name()
            }
            (FieldKind::Custom(codec), value) => codec.validate_internal(value).is_ok(),
            _ => false,
        }
    }
}

/// Whether a union member's pre-check takes the raw value.
///
/// Only validation failures mean "no"; definition errors propagate.
pub(crate) fn accepts_external(member: &Field, registry: &Registry, raw: &Json) -> Result<bool> {
    match member.check_external(registry, raw) {
        Ok(()) => Ok(true),
        Err(DictableError::Validation(_)) => Ok(false),
        Err(other) => Err(other),
    }
}

pub(crate) fn missing_value() -> DictableError {
    DictableError::invalid("required value is missing")
}

pub(crate) fn mismatch(expected: &str, raw: &Json) -> DictableError {
    DictableError::invalid(format!("expected {expected}, got {}", json_kind(raw)))
}

pub(crate) fn expect_mapping(raw: &Json) -> Result<&Map<String, Json>> {
    raw.as_object().ok_or_else(|| mismatch("a mapping", raw))
}

/// A JSON integer that fits `i64`; bools and floats never qualify.
pub(crate) fn exact_int(raw: &Json, expected: &str) -> Result<i64> {
    match raw {
        Json::Number(number) => match number.as_i64() {
            Some(value) => Ok(value),
            None if number.is_u64() => Err(DictableError::invalid(format!(
                "integer {number} is out of range"
            ))),
            None => Err(mismatch(expected, raw)),
        },
        _ => Err(mismatch(expected, raw)),
    }
}

/// A JSON number written with a fraction or exponent.
pub(crate) fn exact_float(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(number) if number.is_f64() => number.as_f64(),
        _ => None,
    }
}

pub(crate) fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DictableError::invalid(format!("timestamp {millis} is out of range")))
}

pub(crate) fn lookup_member(
    enumeration: &Enumeration,
    by: EnumBy,
    raw: &Json,
) -> Result<EnumMember> {
    let found = match by {
        EnumBy::Value => enumeration.from_value(raw),
        EnumBy::Name => raw.as_str().and_then(|name| enumeration.get(name)),
    };
    found.ok_or_else(|| {
        DictableError::invalid(format!(
            "invalid key {raw} for enum {}",
            enumeration.name()
        ))
    })
}

/// Resolve the concrete entity named by a multi-type discriminator.
pub(crate) fn select_entity<'r, 'j>(
    registry: &'r Registry,
    entities: &[String],
    discriminator: &str,
    raw: &'j Json,
) -> Result<(&'r std::sync::Arc<Schema>, &'j Map<String, Json>)> {
    let map = expect_mapping(raw)?;
    let name = map
        .get(discriminator)
        .and_then(Json::as_str)
        .ok_or_else(|| DictableError::invalid(format!("missing discriminator `{discriminator}`")))?;
    if !entities.iter().any(|entity| entity == name) {
        return Err(DictableError::invalid(format!(
            "unknown type `{name}`, expected one of [{}]",
            entities.join(", ")
        ))
        .within(Segment::Field(discriminator.to_string())));
    }
    Ok((registry.schema(name)?, map))
}

fn is_instance_of(registry: &Registry, entity: &Entity, expected: &str) -> bool {
    entity.name() == expected
        || (registry.config().allow_subtypes && entity.schema().descends_from(expected))
}

fn expect(ok: bool, expected: &str, raw: &Json) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(expected, raw))
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display + Copy>(
    number: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<()> {
    if let Some(min) = min {
        if number < min {
            return Err(DictableError::invalid(format!("{number} is below the minimum {min}")));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Err(DictableError::invalid(format!("{number} is above the maximum {max}")));
        }
    }
    Ok(())
}

fn member_names(members: &[Field]) -> String {
    members
        .iter()
        .map(|member| member.kind().type_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn json_kind(raw: &Json) -> &'static str {
    match raw {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(number) if number.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "mapping",
    }
}
