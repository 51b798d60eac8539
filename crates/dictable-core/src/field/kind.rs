use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value as Json;

use super::{Enumeration, Field};
use crate::value::Value;

/// Serialized key recording the concrete entity of a multi-type value.
pub const DEFAULT_DISCRIMINATOR: &str = "__type";

/// How an enum field reads and writes its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumBy {
    #[default]
    Value,
    Name,
}

/// Caller-supplied conversion for values the built-in kinds do not model.
///
/// Error strings become validation messages at the field's path.
pub trait CustomCodec: fmt::Debug + Send + Sync {
    /// Type name reported in specs.
    fn name(&self) -> &str;

    fn from_external(&self, raw: &Json) -> Result<Value, String>;

    fn to_external(&self, value: &Value) -> Json;

    fn validate_external(&self, _raw: &Json) -> Result<(), String> {
        Ok(())
    }

    fn validate_internal(&self, _value: &Value) -> Result<(), String> {
        Ok(())
    }
}

/// Closed set of field behaviors.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
    Datetime,
    Any,
    Object(String),
    List(Box<Field>),
    Dict {
        key: Box<Field>,
        value: Box<Field>,
    },
    Union(Vec<Field>),
    Enum {
        enumeration: Arc<Enumeration>,
        by: EnumBy,
    },
    MultiType {
        entities: Vec<String>,
        discriminator: String,
    },
    Regex(Regex),
    IntRange {
        min: Option<i64>,
        max: Option<i64>,
    },
    FloatRange {
        min: Option<f64>,
        max: Option<f64>,
    },
    Custom(Arc<dyn CustomCodec>),
}

impl FieldKind {
    /// Name reported as `type` in specs.
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Str => "str",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Datetime => "datetime",
            FieldKind::Any => "any",
            FieldKind::Object(_) => "object",
            FieldKind::List(_) => "list",
            FieldKind::Dict { .. } => "dict",
            FieldKind::Union(_) => "union",
            FieldKind::Enum { .. } => "enum",
            FieldKind::MultiType { .. } => "multi_type",
            FieldKind::Regex(_) => "regex",
            FieldKind::IntRange { .. } => "int_range",
            FieldKind::FloatRange { .. } => "float_range",
            FieldKind::Custom(codec) => codec.name(),
        }
    }

    /// Entity names reachable from this kind without crossing an entity.
    pub fn referenced_entities(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_entities(&mut names);
        names
    }

    fn collect_entities<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            FieldKind::Object(entity) => names.push(entity),
            FieldKind::MultiType { entities, .. } => {
                names.extend(entities.iter().map(String::as_str));
            }
            FieldKind::List(element) => element.kind().collect_entities(names),
            FieldKind::Dict { key, value } => {
                key.kind().collect_entities(names);
                value.kind().collect_entities(names);
            }
            FieldKind::Union(members) => {
                for member in members {
                    member.kind().collect_entities(names);
                }
            }
            _ => {}
        }
    }
}
