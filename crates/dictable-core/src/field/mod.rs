//! Field descriptors: one named slot's kind, requiredness, serialized key
//! and default.
//!
//! Conversion lives in `convert`, pre/post checks in `validate`.

mod convert;
mod enumeration;
mod hint;
mod kind;
pub(crate) mod validate;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{DictableError, Result};
use crate::value::Value;

pub use enumeration::Enumeration;
pub use hint::TypeHint;
pub use kind::{CustomCodec, EnumBy, FieldKind, DEFAULT_DISCRIMINATOR};

/// Produces a fresh default value on every construction.
#[derive(Clone)]
pub struct DefaultFactory {
    name: Arc<str>,
    make: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl DefaultFactory {
    pub fn new(name: impl Into<Arc<str>>, make: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            make: Arc::new(make),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn produce(&self) -> Value {
        (self.make)()
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DefaultFactory").field(&self.name).finish()
    }
}

/// Fallback used when a field is left unset.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// Cloned into every instance.
    Static(Value),
    /// Invoked once per instance.
    Factory(DefaultFactory),
}

/// Schema-level description of one named slot.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    key: Option<String>,
    default: Option<DefaultValue>,
    description: Option<String>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            key: None,
            default: None,
            description: None,
        }
    }

    pub fn str() -> Self {
        Self::new(FieldKind::Str)
    }

    pub fn int() -> Self {
        Self::new(FieldKind::Int)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn bool() -> Self {
        Self::new(FieldKind::Bool)
    }

    /// Epoch-millisecond integer on the wire, UTC timestamp in memory.
    pub fn datetime() -> Self {
        Self::new(FieldKind::Datetime)
    }

    /// Accepts any raw value unchanged.
    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    /// Nested entity, looked up by name in the registry.
    pub fn object(entity: impl Into<String>) -> Self {
        Self::new(FieldKind::Object(entity.into()))
    }

    pub fn list(element: Field) -> Self {
        Self::new(FieldKind::List(Box::new(element)))
    }

    /// String keys, values of any shape.
    pub fn dict() -> Self {
        Self::dict_of(Field::str(), Field::any())
    }

    pub fn dict_of(key: Field, value: Field) -> Self {
        Self::new(FieldKind::Dict {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    /// First member whose pre-check accepts the raw value wins.
    pub fn union(members: Vec<Field>) -> Self {
        Self::new(FieldKind::Union(members))
    }

    pub fn enumeration(enumeration: Arc<Enumeration>) -> Self {
        Self::new(FieldKind::Enum {
            enumeration,
            by: EnumBy::Value,
        })
    }

    /// Polymorphic entity selected by the `__type` discriminator.
    pub fn multi_type<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FieldKind::MultiType {
            entities: entities.into_iter().map(Into::into).collect(),
            discriminator: DEFAULT_DISCRIMINATOR.to_string(),
        })
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::new(FieldKind::Regex(Regex::new(pattern)?)))
    }

    /// Inclusive integer bounds; `None` leaves a side open.
    pub fn int_range(min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(FieldKind::IntRange { min, max })
    }

    /// Inclusive float bounds; `None` leaves a side open.
    pub fn float_range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(FieldKind::FloatRange { min, max })
    }

    pub fn custom(codec: Arc<dyn CustomCodec>) -> Self {
        Self::new(FieldKind::Custom(codec))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Serialized name, when it differs from the attribute name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    pub fn default_factory(
        mut self,
        name: impl Into<Arc<str>>,
        make: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Factory(DefaultFactory::new(name, make)));
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Enum fields convert by member name instead of member value.
    pub fn by_name(mut self) -> Self {
        if let FieldKind::Enum { by, .. } = &mut self.kind {
            *by = EnumBy::Name;
        }
        self
    }

    /// Override the discriminator key of a multi-type field.
    pub fn discriminator(mut self, key: impl Into<String>) -> Self {
        if let FieldKind::MultiType { discriminator, .. } = &mut self.kind {
            *discriminator = key.into();
        }
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn serialized_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Reject contradictory configuration on the field declared as `attr`.
    pub fn check_definition(&self, entity: &str, attr: &str) -> Result<()> {
        if self.required && self.default.is_some() {
            return Err(DictableError::definition(
                entity,
                format!("field `{attr}` is required and also has a default"),
            ));
        }
        Ok(())
    }
}

/// Resolve the value an unset field falls back to.
///
/// A required field carrying a default is a definition error. Static
/// defaults are cloned, factories invoked, and fields without either
/// resolve to `None`.
pub fn resolve_default(entity: &str, attr: &str, field: &Field) -> Result<Option<Value>> {
    field.check_definition(entity, attr)?;
    Ok(match field.default_value() {
        None => None,
        Some(DefaultValue::Static(value)) => Some(value.clone()),
        Some(DefaultValue::Factory(factory)) => Some(factory.produce()),
    })
}
