//! Repository and workspace layer for Strata.
//!
//! This crate ties the system together: repositories load binary packages
//! through a byte-source provider, same-named packages across the
//! dependency chain combine into ordered overlays (difference packages),
//! and a [`Workspace`] materializes [`ConfigurationObject`]s whose values
//! fall back through part overlays, base chains, and declared defaults.
//!
//! # Resolution pipeline
//!
//! `Repository::get_package(name)` → combined [`Package`] →
//! `Package::part_layers(address)` → parts opened through the
//! [`TypeBinder`](strata_bind::TypeBinder) capability →
//! `ConfigurationObject::get_value(property)` walks the base chain, and
//! collection properties materialize through the merge engine with
//! object pointers resolved back through the owning workspace.

pub mod error;
pub mod object;
pub mod package;
pub mod provider;
pub mod repository;
pub mod workspace;

pub use error::{StoreError, StoreResult};
pub use object::{ConfigurationObject, ResolvedValue, BASE_PROPERTY};
pub use package::{BinaryPackage, CombinedPackage, Package};
pub use provider::{DirectoryProvider, MemoryProvider, PackageProvider};
pub use repository::Repository;
pub use workspace::Workspace;
