use std::any::Any;
use std::sync::Arc;

use strata_types::{MemoCache, TypeName};

use crate::descriptor::{PropertyDescriptor, PropertyValue};
use crate::error::{BindError, BindResult};

/// Maps an external type name to a descriptor.
///
/// This is the single injection point between the configuration core and
/// whatever type system the host has. Implementations are expected to be
/// cheap to call repeatedly; wrap expensive binders in a [`MemoBinder`].
pub trait TypeBinder: Send + Sync {
    /// Bind a type name, failing with [`BindError::UnknownType`] when the
    /// name is not recognized.
    fn bind(&self, name: &TypeName) -> BindResult<Arc<dyn TypeDescriptor>>;
}

/// Describes one configuration type: its properties and how to construct
/// host instances of it.
pub trait TypeDescriptor: Send + Sync + std::fmt::Debug {
    fn type_name(&self) -> &TypeName;

    /// Every property this type declares.
    fn properties(&self) -> &[PropertyDescriptor];

    /// Look up one property by name.
    ///
    /// Distinguishes an empty name ([`BindError::EmptyPropertyName`]) from
    /// an unrecognized one ([`BindError::UnknownProperty`]).
    fn property(&self, name: &str) -> BindResult<&PropertyDescriptor> {
        if name.is_empty() {
            return Err(BindError::EmptyPropertyName);
        }
        self.properties()
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| BindError::UnknownProperty {
                type_name: self.type_name().to_string(),
                property: name.to_string(),
            })
    }

    /// Construct an empty host instance of this type.
    fn create_instance(&self) -> Box<dyn BoundInstance>;
}

/// A host object under construction from a configuration object.
pub trait BoundInstance: Send {
    fn type_name(&self) -> &TypeName;

    fn set_property(&mut self, name: &str, value: PropertyValue) -> BindResult<()>;

    fn get_property(&self, name: &str) -> Option<&PropertyValue>;

    /// Downcast hook for hosts that know the concrete instance type.
    fn as_any(&self) -> &dyn Any;
}

/// Caching wrapper: memoizes successful binds per type name.
///
/// Bind failures are not cached, so a binder that learns new types later
/// can still succeed on retry.
pub struct MemoBinder<B> {
    inner: B,
    cache: MemoCache<TypeName, Arc<dyn TypeDescriptor>>,
}

impl<B: TypeBinder> MemoBinder<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cache: MemoCache::new(),
        }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: TypeBinder> TypeBinder for MemoBinder<B> {
    fn bind(&self, name: &TypeName) -> BindResult<Arc<dyn TypeDescriptor>> {
        self.cache
            .get_or_try_insert_with(name, || self.inner.bind(name))
    }
}
