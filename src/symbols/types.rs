//! Resolved source-language types.
use std::fmt::{self, Display, Formatter};

/// A type as resolved by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    String,
    Boolean,
    Null,
    Void,
    Array(Box<Type>),
    /// An instance of the class with the given name.
    Class(String),
    Function(Vec<Type>, Box<Type>),
}
impl Type {
    pub fn array_of(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn class<S: Into<String>>(name: S) -> Self {
        Type::Class(name.into())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Integer | Type::String | Type::Boolean | Type::Null | Type::Void
        )
    }

    pub fn as_class(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }
}
impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Type::Integer => f.write_str("integer"),
            Type::String => f.write_str("string"),
            Type::Boolean => f.write_str("boolean"),
            Type::Null => f.write_str("null"),
            Type::Void => f.write_str("void"),
            Type::Array(elem) => write!(f, "{}[]", elem),
            Type::Class(name) => f.write_str(name),
            Type::Function(params, ret) => {
                let params = params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({}) -> {}", params, ret)
            }
        }
    }
}
