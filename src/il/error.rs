use thiserror::Error;

use crate::{span::Span, symbols::LookupError};

/// Construct a new error result.
pub fn error<S>(kind: GenerateErrorKind, span: Span) -> Result<S, GenerateError> {
    Err(GenerateError::new(kind, span))
}

/// An error as produced by the TAC generator. Generation of the whole unit stops at the first
/// error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} (at {span})")]
pub struct GenerateError {
    kind: GenerateErrorKind,
    span: Span,
}
impl GenerateError {
    pub fn new(kind: GenerateErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn kind(&self) -> &GenerateErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateErrorKind {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("expression '{0}' does not evaluate to an object")]
    NotAnObject(String),
    #[error("expression '{0}' does not evaluate to an array")]
    NotAnArray(String),
    #[error("'this' used outside of a method")]
    ThisOutsideMethod,
    #[error("cannot assign to '{0}'")]
    InvalidAssignTarget(String),
    #[error("class '{class}' is declared with base {declared:?}, but recorded with base {recorded:?}")]
    InconsistentBase {
        class: String,
        declared: Option<String>,
        recorded: Option<String>,
    },
}

pub trait AddSpan {
    type Annotated;

    fn add_span(self, span: Span) -> Self::Annotated;
}

impl<O> AddSpan for Result<O, GenerateErrorKind> {
    type Annotated = Result<O, GenerateError>;

    fn add_span(self, span: Span) -> Self::Annotated {
        self.map_err(|kind| GenerateError::new(kind, span))
    }
}

impl<O> AddSpan for Result<O, LookupError> {
    type Annotated = Result<O, GenerateError>;

    fn add_span(self, span: Span) -> Self::Annotated {
        self.map_err(|err| GenerateError::new(err.into(), span))
    }
}

#[cfg(test)]
mod tests {
    use crate::span::Bytes;

    use super::*;

    #[test]
    fn lookup_errors_keep_their_message() {
        let span = Span::new(Bytes::new(3), Bytes::new(7));
        let result: Result<(), _> = Err(LookupError::ClassNotFound("Point".to_string()));

        let err = result.add_span(span).unwrap_err();

        assert_eq!("class not found: 'Point' (at 3..7)", err.to_string());
        assert_eq!(span, err.span());
    }
}
