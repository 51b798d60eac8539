use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

use crate::entity::Entity;

/// In-memory value held by an entity slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    Enum(EnumMember),
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Object(Entity),
    /// Untyped payload kept by `any` fields.
    Raw(Json),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Timestamp(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Object(_) => "object",
            Value::Raw(_) => "raw",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Value::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Dict(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Json> {
        match self {
            Value::Raw(v) => Some(v),
            _ => None,
        }
    }

    /// Render without a field descriptor to guide the conversion.
    ///
    /// Timestamps become epoch milliseconds, enum members their value, and
    /// non-finite floats `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::Int(v) => Json::from(*v),
            Value::Float(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Value::Str(v) => Json::String(v.clone()),
            Value::Timestamp(v) => Json::from(v.timestamp_millis()),
            Value::Enum(member) => member.value().clone(),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Dict(map) => Json::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<String, Json>>(),
            ),
            Value::Object(entity) => entity.to_external(),
            Value::Raw(raw) => raw.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<EnumMember> for Value {
    fn from(v: EnumMember) -> Self {
        Value::Enum(v)
    }
}

impl From<Entity> for Value {
    fn from(v: Entity) -> Self {
        Value::Object(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Dict(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A member of an [`Enumeration`](crate::field::Enumeration).
///
/// Members compare equal when they share the enumeration name and the
/// member name.
#[derive(Debug, Clone)]
pub struct EnumMember {
    enumeration: Arc<str>,
    name: Arc<str>,
    value: Json,
}

impl EnumMember {
    pub(crate) fn new(enumeration: Arc<str>, name: Arc<str>, value: Json) -> Self {
        Self {
            enumeration,
            name,
            value,
        }
    }

    pub fn enumeration(&self) -> &str {
        &self.enumeration
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Json {
        &self.value
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.enumeration == other.enumeration && self.name == other.name
    }
}

impl fmt::Display for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.enumeration, self.name)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn to_json_renders_scalars_and_collections() {
        let stamp = Utc.timestamp_millis_opt(1_617_129_000_000).single().unwrap();
        let mut dict = IndexMap::new();
        dict.insert("b".to_string(), Value::Int(2));
        dict.insert("a".to_string(), Value::Null);

        let value = Value::List(vec![
            Value::from("x"),
            Value::from(1.5),
            Value::from(stamp),
            Value::Dict(dict),
        ]);
        assert_eq!(
            value.to_json(),
            json!(["x", 1.5, 1_617_129_000_000i64, {"b": 2, "a": null}])
        );
    }

    #[test]
    fn non_finite_float_renders_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), Json::Null);
    }

    #[test]
    fn option_converts_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }
}
