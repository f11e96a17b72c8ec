use thiserror::Error;

use strata_types::TypeName;

/// Errors produced by type binding and scalar conversion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    #[error("unknown type: {0}")]
    UnknownType(TypeName),

    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("type {type_name} does not support property {property:?}")]
    UnknownProperty { type_name: String, property: String },

    #[error("cannot convert {value:?} to {expected}")]
    InvalidScalar { expected: String, value: String },

    #[error("property {property:?} rejected value: {reason}")]
    InvalidValue { property: String, reason: String },
}

pub type BindResult<T> = Result<T, BindError>;
