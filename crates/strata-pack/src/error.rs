use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use strata_bind::BindError;
use strata_types::{FullName, QualifiedName};

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid package magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported package format version: {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt package data at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("unknown value tag: {0}")]
    InvalidValueTag(u8),

    #[error("unknown diff action: {0}")]
    UnknownDiffAction(u8),

    #[error("duplicate object address in package: {0}")]
    DuplicateObject(FullName),

    #[error("decode of {address} did not complete within {timeout:?}")]
    DecodeTimeout {
        address: QualifiedName,
        timeout: Duration,
    },

    #[error("background decode failed: {0}")]
    Background(Arc<PackError>),

    #[error("type binding failed: {0}")]
    Bind(#[from] BindError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type PackResult<T> = Result<T, PackError>;
