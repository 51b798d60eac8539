use dictable_core::DictableError;

/// Errors that can occur while loading a schema document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document could not be read.
    #[error("failed to load schema document: {0}")]
    LoadFailed(String),

    /// The document is not valid JSON or does not have the expected shape.
    #[error("schema document is not valid: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The declared entities do not form a valid model.
    #[error(transparent)]
    Model(#[from] DictableError),

    /// An enum field names an enumeration the document does not declare.
    #[error("field {entity}.{field} uses unknown enumeration {enumeration}")]
    UnknownEnumeration {
        entity: String,
        field: String,
        enumeration: String,
    },

    /// A default factory name with no built-in behind it.
    #[error("field {entity}.{field} uses unknown default factory {factory}")]
    UnknownFactory {
        entity: String,
        field: String,
        factory: String,
    },

    /// An entity extends an entity the document does not declare.
    #[error("entity {entity} extends unknown entity {parent}")]
    UnknownParent { entity: String, parent: String },

    /// Entities extend each other in a loop.
    #[error("inheritance cycle through entity {0}")]
    InheritanceCycle(String),

    /// A declared default does not fit its field.
    #[error("invalid default for {entity}.{field}: {message}")]
    InvalidDefault {
        entity: String,
        field: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, DocumentError>;
