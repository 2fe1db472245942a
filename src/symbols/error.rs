use thiserror::Error;

/// A failure to find something the type checker should have recorded in the symbol table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("class not found: '{0}'")]
    ClassNotFound(String),
    #[error("field '{field}' does not exist in the hierarchy of '{class}'")]
    FieldNotFound { class: String, field: String },
    #[error("function not found: '{0}'")]
    FunctionNotFound(String),
    #[error("method '{method}' does not exist in the hierarchy of '{class}'")]
    MethodNotFound { class: String, method: String },
    #[error("unknown identifier: '{0}'")]
    UnknownIdentifier(String),
    #[error("variable '{0}' has no storage offset assigned")]
    NoStorage(String),
    #[error("class '{0}' inherits from itself")]
    InheritanceCycle(String),
}
