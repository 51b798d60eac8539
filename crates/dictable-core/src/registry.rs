use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::entity::{self, Entity, Init};
use crate::error::{DictableError, Result};
use crate::field::{Field, FieldKind};
use crate::schema::Schema;

/// Collects schemas before they are frozen into a [`Registry`].
pub struct RegistryBuilder {
    schemas: IndexMap<String, Arc<Schema>>,
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// Create an empty builder with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty builder with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: IndexMap::new(),
            config,
        }
    }

    /// Add a schema; entity names must be unique.
    pub fn register(&mut self, schema: Schema) -> Result<Arc<Schema>> {
        if self.schemas.contains_key(schema.name()) {
            return Err(DictableError::definition(
                schema.name(),
                "entity is registered twice",
            ));
        }
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Check cross-entity references and freeze the registry.
    pub fn build(self) -> Result<Registry> {
        for schema in self.schemas.values() {
            for slot in schema.slots() {
                check_references(&self.schemas, schema.name(), slot.name(), slot.field())?;
            }
        }
        debug!(
            entities = self.schemas.len(),
            strict_mode = self.config.strict_mode,
            "registry built"
        );
        Ok(Registry {
            schemas: self.schemas,
            config: self.config,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable set of entity schemas, keyed by name.
pub struct Registry {
    schemas: IndexMap<String, Arc<Schema>>,
    config: RegistryConfig,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry with no entities, for scalar-only conversions.
    pub fn empty() -> Self {
        Self {
            schemas: IndexMap::new(),
            config: RegistryConfig::default(),
        }
    }

    /// Look up a schema, failing on unknown names.
    pub fn schema(&self, name: &str) -> Result<&Arc<Schema>> {
        self.schemas
            .get(name)
            .ok_or_else(|| DictableError::UnknownEntity(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Entity names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Construct a registered entity.
    pub fn construct(&self, name: &str, init: Init) -> Result<Entity> {
        let schema = Arc::clone(self.schema(name)?);
        self.construct_with(&schema, init)
    }

    /// Construct an entity from any schema, e.g. a derived partial.
    ///
    /// Nested references resolve against this registry.
    pub fn construct_with(&self, schema: &Arc<Schema>, init: Init) -> Result<Entity> {
        let (raw, direct) = init.into_parts();
        entity::build(self, schema, direct, raw.as_ref(), None)
    }

    /// Construct a registered entity from a raw mapping alone.
    pub fn from_raw(&self, name: &str, raw: &Json) -> Result<Entity> {
        let schema = self.schema(name)?;
        entity::build(self, schema, Vec::new(), Some(raw), None)
    }

    /// The partial variant of a registered entity; not registered itself.
    pub fn partial(&self, name: &str) -> Result<Arc<Schema>> {
        Ok(Arc::new(self.schema(name)?.partial()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entities", &self.schemas.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

fn check_references(
    schemas: &IndexMap<String, Arc<Schema>>,
    entity: &str,
    attr: &str,
    field: &Field,
) -> Result<()> {
    for name in field.kind().referenced_entities() {
        if !schemas.contains_key(name) {
            return Err(DictableError::definition(
                entity,
                format!("field `{attr}` references unknown entity `{name}`"),
            ));
        }
    }
    match field.kind() {
        FieldKind::MultiType {
            entities,
            discriminator,
        } => {
            for member in entities.iter().filter_map(|name| schemas.get(name)) {
                if let Some(slot) = member.slot_by_key(discriminator) {
                    return Err(DictableError::definition(
                        entity,
                        format!(
                            "field `{attr}` discriminator `{discriminator}` collides with {}.{}",
                            member.name(),
                            slot.name()
                        ),
                    ));
                }
            }
            Ok(())
        }
        FieldKind::List(element) => check_references(schemas, entity, attr, element),
        FieldKind::Dict { key, value } => {
            check_references(schemas, entity, attr, key)?;
            check_references(schemas, entity, attr, value)
        }
        FieldKind::Union(members) => members
            .iter()
            .try_for_each(|member| check_references(schemas, entity, attr, member)),
        _ => Ok(()),
    }
}
