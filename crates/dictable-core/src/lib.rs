//! Declarative field descriptors and schema-bound entities.
//!
//! A [`Schema`] is an ordered table of [`Field`] descriptors, built once with
//! [`SchemaBuilder`]. A [`Registry`] owns every schema by name and converts
//! raw `serde_json::Value` trees into [`Entity`] instances and back,
//! validating raw input before conversion and in-memory values after it.
//!
//! Failures carry a [`FieldPath`] such as `avatar.size.gaps.[2]` so callers
//! can point at the offending leaf.

pub mod config;
pub mod entity;
pub mod error;
pub mod field;
pub mod path;
pub mod registry;
pub mod schema;
pub mod value;

pub use config::{OutputMode, RegistryConfig};
pub use entity::{Entity, Init};
pub use error::{DictableError, Result, ValidationError};
pub use field::{
    resolve_default, CustomCodec, DefaultFactory, DefaultValue, EnumBy, Enumeration, Field,
    FieldKind, TypeHint, DEFAULT_DISCRIMINATOR,
};
pub use path::{FieldPath, Segment};
pub use registry::{Registry, RegistryBuilder};
pub use schema::{
    FieldSlot, Origin, Schema, SchemaBuilder, SchemaTemplate, TemplateArg, PARTIAL_SUFFIX,
};
pub use value::{EnumMember, Value};
