//! Schema-bound entity instances and the construction pipeline.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use crate::config::OutputMode;
use crate::error::{DictableError, Result};
use crate::field::resolve_default;
use crate::field::validate::{expect_mapping, missing_value};
use crate::path::Segment;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::value::Value;

/// Inputs for one construction: a raw mapping, direct assignments, or both.
///
/// Direct assignments are applied first; a raw entry that is absent or
/// `null` leaves the directly assigned value in place.
#[derive(Debug, Clone, Default)]
pub struct Init {
    raw: Option<Json>,
    direct: Vec<(String, Value)>,
}

impl Init {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(raw: Json) -> Self {
        Self::new().with_raw(raw)
    }

    pub fn with_raw(mut self, raw: Json) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Assign an attribute directly, by attribute name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.direct.push((name.into(), value.into()));
        self
    }

    pub(crate) fn into_parts(self) -> (Option<Json>, Vec<(String, Value)>) {
        (self.raw, self.direct)
    }
}

/// A populated, validated instance of a [`Schema`].
#[derive(Clone)]
pub struct Entity {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Entity {
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.schema.index_of(attr).map(|index| &self.values[index])
    }

    /// Attribute names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .slots()
            .iter()
            .map(|slot| slot.name())
            .zip(&self.values)
    }

    pub fn to_external(&self) -> Json {
        self.to_external_with(OutputMode::Full)
    }

    /// Render as a raw mapping keyed by serialized keys.
    pub fn to_external_with(&self, mode: OutputMode) -> Json {
        Json::Object(self.to_map(mode))
    }

    pub(crate) fn to_map(&self, mode: OutputMode) -> Map<String, Json> {
        let mut map = Map::new();
        for (slot, value) in self.schema.slots().iter().zip(&self.values) {
            if mode == OutputMode::Compact && value.is_null() && !slot.field().is_required() {
                continue;
            }
            map.insert(slot.key().to_string(), slot.field().to_external(value, mode));
        }
        map
    }

    /// Post-check every field against its current value.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        for (slot, value) in self.schema.slots().iter().zip(&self.values) {
            slot.field()
                .check_internal(registry, value)
                .map_err(|err| err.within(Segment::Field(slot.name().to_string())))?;
        }
        Ok(())
    }

    /// Replace one attribute after post-checking the new value.
    pub fn set(&mut self, registry: &Registry, attr: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index(attr)?;
        let value = value.into();
        let slot = &self.schema.slots()[index];
        slot.field()
            .check_internal(registry, &value)
            .map_err(|err| err.within(Segment::Field(attr.to_string())))?;
        self.values[index] = value;
        Ok(())
    }

    fn index(&self, attr: &str) -> Result<usize> {
        self.schema
            .index_of(attr)
            .ok_or_else(|| DictableError::UnknownField {
                entity: self.name().to_string(),
                field: attr.to_string(),
            })
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.values == other.values
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.name());
        for (name, value) in self.iter() {
            out.field(name, value);
        }
        out.finish()
    }
}

/// Run the full construction pipeline for `schema`.
///
/// `extra_key` names one raw key that strict mode must tolerate, used for
/// multi-type discriminators.
pub(crate) fn build(
    registry: &Registry,
    schema: &Arc<Schema>,
    direct: Vec<(String, Value)>,
    raw: Option<&Json>,
    extra_key: Option<&str>,
) -> Result<Entity> {
    for slot in schema.slots() {
        slot.field().check_definition(schema.name(), slot.name())?;
    }

    let mut entity = Entity {
        schema: Arc::clone(schema),
        values: vec![Value::Null; schema.len()],
    };
    for (name, value) in direct {
        let index = entity.index(&name)?;
        entity.values[index] = value;
    }

    if let Some(raw) = raw {
        let map = expect_mapping(raw)?;
        let assigned: Vec<bool> = entity.values.iter().map(|value| !value.is_null()).collect();
        validate_mapping(registry, schema, map, &assigned, extra_key)?;
        for (slot, value) in schema.slots().iter().zip(entity.values.iter_mut()) {
            let Some(item) = map.get(slot.key()).filter(|item| !item.is_null()) else {
                continue;
            };
            trace!(entity = schema.name(), field = slot.name(), "converting field");
            *value = slot
                .field()
                .from_external(registry, item)
                .map_err(|err| err.within(Segment::Field(slot.name().to_string())))?;
        }
    }

    for (slot, value) in schema.slots().iter().zip(entity.values.iter_mut()) {
        if value.is_null() {
            if let Some(default) = resolve_default(schema.name(), slot.name(), slot.field())? {
                *value = default;
            }
        }
    }

    if let Err(err) = entity.validate(registry) {
        debug!(entity = schema.name(), error = %err, "constructed value rejected");
        return Err(err);
    }
    debug!(entity = schema.name(), "entity constructed");
    Ok(entity)
}

/// Pre-check a raw mapping against every field of `schema`.
///
/// `assigned` flags slots already populated directly; those may be absent
/// from the mapping even when required.
pub(crate) fn validate_mapping(
    registry: &Registry,
    schema: &Schema,
    map: &Map<String, Json>,
    assigned: &[bool],
    extra_key: Option<&str>,
) -> Result<()> {
    for (index, slot) in schema.slots().iter().enumerate() {
        let within = |err: DictableError| err.within(Segment::Field(slot.name().to_string()));
        match map.get(slot.key()).filter(|item| !item.is_null()) {
            Some(item) => slot
                .field()
                .validate_external(registry, item)
                .map_err(within)?,
            None => {
                let preset = assigned.get(index).copied().unwrap_or(false);
                if slot.field().is_required() && !preset {
                    debug!(entity = schema.name(), field = slot.name(), "required field missing");
                    return Err(within(missing_value()));
                }
            }
        }
    }

    if registry.config().strict_mode {
        for key in map.keys() {
            if schema.slot_by_key(key).is_none() && extra_key != Some(key.as_str()) {
                return Err(DictableError::invalid(format!(
                    "unknown field for entity {}",
                    schema.name()
                ))
                .within(Segment::Field(key.clone())));
            }
        }
    }
    Ok(())
}
