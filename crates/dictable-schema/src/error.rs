use dictable_core::DictableError;

/// Errors that can occur during schema introspection and export.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A flat spec re-entered an entity already being expanded.
    #[error("entity {0} references itself; use the definitions spec")]
    Cyclic(String),

    /// The underlying model rejected a lookup or definition.
    #[error(transparent)]
    Model(#[from] DictableError),

    /// The exported JSON Schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// The payload failed JSON Schema validation.
    #[error("validation failed for {entity}: {message}")]
    ValidationFailed { entity: String, message: String },

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
