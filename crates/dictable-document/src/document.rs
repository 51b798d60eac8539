//! Serde model of a schema document.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;

/// Top-level schema document.
///
/// ```json
/// {
///   "enums": { "Role": { "ADMIN": "ADMIN", "DEV": 2 } },
///   "entities": {
///     "User": {
///       "fields": { "name": { "kind": "str", "required": true } },
///       "hints": { "age": "Optional[int]" }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Enumeration name to ordered `member -> value` pairs.
    #[serde(default)]
    pub enums: IndexMap<String, IndexMap<String, Json>>,
    #[serde(default)]
    pub entities: IndexMap<String, EntityDoc>,
    /// Reject unknown raw keys for every entity.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDoc {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit descriptors, in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDoc>,
    /// Attribute name to type hint text, e.g. `List[str]`.
    #[serde(default)]
    pub hints: IndexMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDoc {
    #[serde(flatten)]
    pub kind: KindDoc,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub key: Option<String>,
    /// Raw default, converted through the field when loading.
    #[serde(default)]
    pub default: Option<Json>,
    /// Built-in factory: `now`, `empty_list` or `empty_dict`.
    #[serde(default)]
    pub default_factory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindDoc {
    Str,
    Int,
    Float,
    Bool,
    Datetime,
    Any,
    Object {
        entity: String,
    },
    List {
        of: Box<FieldDoc>,
    },
    Dict {
        #[serde(default)]
        keys: Option<Box<FieldDoc>>,
        #[serde(default)]
        values: Option<Box<FieldDoc>>,
    },
    Union {
        of: Vec<FieldDoc>,
    },
    Enum {
        enumeration: String,
        #[serde(default)]
        by_name: bool,
    },
    MultiType {
        entities: Vec<String>,
        #[serde(default)]
        discriminator: Option<String>,
    },
    Regex {
        pattern: String,
    },
    IntRange {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    FloatRange {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_nested_field_documents() {
        let doc: SchemaDocument = serde_json::from_value(json!({
            "entities": {
                "Inbox": {
                    "fields": {
                        "tags": {
                            "kind": "dict",
                            "values": {"kind": "list", "of": {"kind": "int", "required": true}}
                        },
                        "level": {"kind": "int_range", "min": 1, "key": "lvl"}
                    }
                }
            }
        }))
        .unwrap();
        let inbox = &doc.entities["Inbox"];
        let names: Vec<_> = inbox.fields.keys().cloned().collect();
        assert_eq!(names, ["tags", "level"]);
        match &inbox.fields["tags"].kind {
            KindDoc::Dict { keys: None, values: Some(values) } => {
                assert!(matches!(&values.kind, KindDoc::List { of } if of.required));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(inbox.fields["level"].key.as_deref(), Some("lvl"));
        assert!(matches!(
            inbox.fields["level"].kind,
            KindDoc::IntRange { min: Some(1), max: None }
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed: std::result::Result<SchemaDocument, _> = serde_json::from_value(json!({
            "entities": {"A": {"fields": {"x": {"kind": "tuple"}}}}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let parsed: std::result::Result<SchemaDocument, _> =
            serde_json::from_value(json!({"entity": {}}));
        assert!(parsed.is_err());
    }
}
