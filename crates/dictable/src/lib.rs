//! Declarative data models with validated conversion to and from JSON.
//!
//! # Crate Structure
//!
//! - [`core`]: field descriptors, schemas, the registry and entities
//! - [`schema`]: field specs and JSON Schema export (behind `schema` feature)
//! - [`document`]: JSON schema documents (behind `document` feature)

/// Re-export core model types.
pub mod core {
    pub use dictable_core::*;
}

/// Re-export introspection types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use dictable_schema::*;
}

/// Re-export schema document loading (requires `document` feature).
#[cfg(feature = "document")]
pub mod document {
    pub use dictable_document::*;
}

pub use dictable_core::{
    DictableError, Entity, Field, Init, OutputMode, Registry, RegistryBuilder, RegistryConfig,
    Schema, SchemaTemplate, TypeHint, Value,
};
