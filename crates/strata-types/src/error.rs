use thiserror::Error;

/// Errors produced by name and identifier operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid package name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}
