//! Schema introspection for dictable entities.
//!
//! Derive declarative field specs for external consumers (form generators,
//! documentation), flatten self-referential schemas into a `$defs` table,
//! and export JSON Schema 2020-12 documents that compile into a
//! [`PayloadValidator`] for structural pre-flight checks.

pub mod config;
pub mod error;
pub mod export;
pub mod spec;
pub mod validator;

pub use config::ExportConfig;
pub use error::{Result, SchemaError};
pub use export::to_json_schema;
pub use spec::{definitions_spec, field_spec, input_spec, schema_spec, SpecStyle};
pub use validator::PayloadValidator;
