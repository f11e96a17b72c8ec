//! Type-binder capability for Strata.
//!
//! The configuration core never inspects language runtime metadata. Instead
//! it consumes this capability: a [`TypeBinder`] maps a [`TypeName`] to a
//! [`TypeDescriptor`], which exposes property metadata, scalar conversion,
//! and instance construction. Hosts implement these traits over whatever
//! reflection or code generation they have; the core only calls through
//! them.
//!
//! # Key Types
//!
//! - [`TypeBinder`] — `bind(TypeName) -> TypeDescriptor`, the injection point
//! - [`TypeDescriptor`] / [`PropertyDescriptor`] — property names, kinds,
//!   defaults, and instance construction
//! - [`ScalarKind`] — the invariant-form scalar converter
//! - [`BoundInstance`] / [`PropertyValue`] — host-side constructed objects
//! - [`SimpleBinder`] — in-memory registry used by the test suites and for
//!   embedding
//! - [`MemoBinder`] — compute-once caching wrapper around any binder
//!
//! [`TypeName`]: strata_types::TypeName

pub mod descriptor;
pub mod error;
pub mod simple;
pub mod traits;

pub use descriptor::{PropertyDescriptor, PropertyKind, PropertyValue, ScalarKind};
pub use error::{BindError, BindResult};
pub use simple::{SimpleBinder, SimpleInstance, SimpleType};
pub use traits::{BoundInstance, MemoBinder, TypeBinder, TypeDescriptor};
