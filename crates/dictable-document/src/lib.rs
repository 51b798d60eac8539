//! Declarative schema documents.
//!
//! A JSON document declares enumerations and entities (fields, type hints,
//! inheritance, defaults) and loads into an immutable
//! [`Registry`](dictable_core::Registry).

pub mod config;
pub mod document;
pub mod error;
pub mod loader;

pub use config::LoaderConfig;
pub use document::{EntityDoc, FieldDoc, KindDoc, SchemaDocument};
pub use error::{DocumentError, Result};
pub use loader::{load_file, load_str, load_value};
