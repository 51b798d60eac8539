use std::fmt;

use crate::path::{FieldPath, Segment};

/// A data failure: raw input or an in-memory value broke a field's contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    path: FieldPath,
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: FieldPath::new(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record the parent segment the failure was reached through.
    pub fn within(mut self, parent: Segment) -> Self {
        self.path = self.path.prefixed(parent);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while defining schemas or converting values.
#[derive(Debug, thiserror::Error)]
pub enum DictableError {
    /// Contradictory or unresolvable schema configuration.
    #[error("schema definition error on {entity}: {message}")]
    SchemaDefinition { entity: String, message: String },

    /// A value failed validation at the carried path.
    #[error("validation failed{}", located(.0))]
    Validation(#[from] ValidationError),

    /// A conversion the engine has no rule for.
    #[error("not implemented: {0}")]
    Unsupported(String),

    /// A regex field was declared with an invalid pattern.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// No entity with this name is registered.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// A direct assignment named an attribute the entity does not declare.
    #[error("entity {entity} has no field named {field}")]
    UnknownField { entity: String, field: String },
}

impl DictableError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(message))
    }

    pub(crate) fn definition(entity: &str, message: impl Into<String>) -> Self {
        Self::SchemaDefinition {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    /// Prefix the path of a validation failure; other errors pass through.
    pub fn within(self, parent: Segment) -> Self {
        match self {
            Self::Validation(err) => Self::Validation(err.within(parent)),
            other => other,
        }
    }

    /// The validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

fn located(err: &ValidationError) -> String {
    if err.path.is_empty() {
        format!(": {}", err.message)
    } else {
        format!(" at {err}")
    }
}

pub type Result<T> = std::result::Result<T, DictableError>;
