use std::sync::Arc;

use thiserror::Error;

use strata_bind::BindError;
use strata_pack::PackError;
use strata_types::{NameError, QualifiedName};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("invalid package name: {0}")]
    InvalidName(#[from] NameError),

    #[error("object not found: {0}")]
    ObjectNotFound(QualifiedName),

    #[error("cyclic base chain through {0}")]
    CyclicInheritance(QualifiedName),

    #[error("property {property:?} of {address} holds an unexpected value kind")]
    PropertyKindMismatch {
        address: QualifiedName,
        property: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("base resolution failed: {0}")]
    BaseResolution(Arc<StoreError>),

    #[error("package decode failed: {0}")]
    Pack(#[from] PackError),

    #[error("type binding failed: {0}")]
    Bind(#[from] BindError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
