use std::fmt;

use dictable_core::{Registry, Schema};
use jsonschema::Validator;
use serde_json::Value as Json;
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Result, SchemaError};
use crate::export::to_json_schema;

/// Compiled JSON Schema for one entity, used as a structural pre-flight.
///
/// Coarser than the entity's own checks: integers written as `1.0` and
/// regex dialect differences are judged by the JSON Schema rules.
pub struct PayloadValidator {
    entity: String,
    validator: Validator,
}

impl PayloadValidator {
    /// Export and compile the schema of `schema`.
    pub fn compile(registry: &Registry, schema: &Schema, config: &ExportConfig) -> Result<Self> {
        let document = to_json_schema(registry, schema, config)?;
        Self::from_document(schema.name(), &document)
    }

    /// Compile an already exported document.
    pub fn from_document(entity: &str, document: &Json) -> Result<Self> {
        let validator = jsonschema::validator_for(document)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;
        debug!(entity, "compiled payload validator");
        Ok(Self {
            entity: entity.to_string(),
            validator,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Validate a parsed payload, reporting the first error and up to three
    /// more.
    pub fn validate(&self, payload: &Json) -> Result<()> {
        let mut errors = self.validator.iter_errors(payload);
        if let Some(first) = errors.next() {
            let mut message = first.to_string();
            for err in errors.take(3) {
                message.push_str("; ");
                message.push_str(&err.to_string());
            }
            return Err(SchemaError::ValidationFailed {
                entity: self.entity.clone(),
                message,
            });
        }
        Ok(())
    }

    /// Parse and validate raw JSON bytes.
    pub fn validate_slice(&self, payload: &[u8]) -> Result<()> {
        let value: Json = serde_json::from_slice(payload)?;
        self.validate(&value)
    }

    pub fn is_valid(&self, payload: &Json) -> bool {
        self.validator.is_valid(payload)
    }
}

impl fmt::Debug for PayloadValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadValidator")
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}
