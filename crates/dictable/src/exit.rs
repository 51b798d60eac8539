use std::fmt;
use std::io;

use dictable_core::DictableError;
use dictable_document::DocumentError;
use dictable_schema::SchemaError;

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Failures of the model itself: bad data is 60, a bad schema or entity name is 64.
pub fn model_error(context: &str, err: DictableError) -> CliError {
    let code = match &err {
        DictableError::Validation(_) | DictableError::Unsupported(_) => DATA_INVALID,
        DictableError::SchemaDefinition { .. }
        | DictableError::UnknownEntity(_)
        | DictableError::InvalidPattern(_) => USAGE,
        DictableError::UnknownField { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// A schema document that cannot be read fails; one that cannot be loaded is a usage error.
pub fn document_error(context: &str, err: DocumentError) -> CliError {
    match err {
        DocumentError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        DocumentError::Model(err) => model_error(context, err),
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::Model(err) => model_error(context, err),
        SchemaError::ValidationFailed { .. } | SchemaError::InvalidJson(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SchemaError::Cyclic(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SchemaError::CompileFailed(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
