//! Foundation types for Strata.
//!
//! This crate provides the addressing primitives, the configuration value
//! model, and the concurrency utilities used throughout the Strata system.
//! Every other Strata crate depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`FullName`] — namespace-qualified object name (ordinal comparison)
//! - [`QualifiedName`] — a `FullName` plus its owning package
//! - [`TypeName`] — provider-tagged type address; the provider tag does not
//!   participate in equality
//! - [`Value`] — closed sum type over everything a configuration property
//!   can hold: null, scalar, object reference, collection diff
//! - [`DiffItem`] — one add/remove operation against a collection property
//! - [`MemoCache`] — concurrent compute-once map

pub mod error;
pub mod ident;
pub mod memo;
pub mod name;
pub mod value;

pub use error::NameError;
pub use ident::validate_package_name;
pub use memo::MemoCache;
pub use name::{FullName, QualifiedName, TypeName};
pub use value::{DiffAction, DiffItem, ObjectPtr, Value};
