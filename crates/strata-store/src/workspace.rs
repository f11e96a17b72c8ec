use std::sync::Arc;

use tracing::debug;

use strata_bind::{
    BoundInstance, PropertyDescriptor, PropertyKind, PropertyValue, TypeBinder,
};
use strata_types::{MemoCache, QualifiedName};

use crate::error::{StoreError, StoreResult};
use crate::object::{ConfigurationObject, ResolvedValue};
use crate::repository::Repository;

/// Arena owning the live configuration objects of one repository view.
///
/// The workspace guarantees `(workspace, address) -> object` is a
/// bijection: every lookup of one address returns the identical `Arc`,
/// however many threads race on the first access.
pub struct Workspace {
    inner: Arc<WorkspaceInner>,
}

pub(crate) struct WorkspaceInner {
    repository: Arc<Repository>,
    binder: Arc<dyn TypeBinder>,
    objects: MemoCache<QualifiedName, Arc<ConfigurationObject>>,
}

impl Workspace {
    pub fn new(repository: Arc<Repository>, binder: Arc<dyn TypeBinder>) -> Self {
        Self {
            inner: Arc::new(WorkspaceInner {
                repository,
                binder,
                objects: MemoCache::new(),
            }),
        }
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.inner.repository
    }

    pub fn binder(&self) -> &Arc<dyn TypeBinder> {
        &self.inner.binder
    }

    /// Resolve an address to its configuration object, or `None` when
    /// neither the package nor the object exists.
    pub fn get_configuration_object(
        &self,
        key: &QualifiedName,
    ) -> StoreResult<Option<Arc<ConfigurationObject>>> {
        self.inner.resolve(key)
    }

    /// Resolve an address and construct a host instance from it through
    /// the type-binder capability, assigning every property the type
    /// descriptor declares.
    pub fn get_object(&self, key: &QualifiedName) -> StoreResult<Option<Box<dyn BoundInstance>>> {
        let Some(object) = self.inner.resolve(key)? else {
            return Ok(None);
        };
        let descriptor = object.descriptor();
        let mut instance = descriptor.create_instance();
        for property in descriptor.properties() {
            let value = object.get_value(property.name())?;
            let bound = bind_value(property, &value)?;
            instance.set_property(property.name(), bound)?;
        }
        Ok(Some(instance))
    }
}

impl WorkspaceInner {
    pub(crate) fn resolve(
        self: &Arc<Self>,
        key: &QualifiedName,
    ) -> StoreResult<Option<Arc<ConfigurationObject>>> {
        if let Some(existing) = self.objects.get(key) {
            return Ok(Some(existing));
        }

        let package = match self.repository.get_package(key.package()) {
            Ok(package) => package,
            Err(StoreError::PackageNotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let layers = package.part_layers(key.full_name());
        if layers.is_empty() {
            return Ok(None);
        }

        let object = self.objects.get_or_try_insert_with(key, || {
            for part in &layers {
                part.open(self.binder.as_ref())?;
            }
            let descriptor = layers
                .last()
                .and_then(|part| part.descriptor().cloned())
                .ok_or_else(|| StoreError::Internal("opened part has no descriptor".into()))?;
            debug!(address = %key, layers = layers.len(), "configuration object created");
            Ok::<_, StoreError>(Arc::new(ConfigurationObject::new(
                key.clone(),
                layers.clone(),
                descriptor,
                Arc::downgrade(self),
            )))
        })?;
        Ok(Some(object))
    }
}

/// Convert a materialized value into the shape the host instance takes,
/// running scalars through the property's declared converter.
fn bind_value(property: &PropertyDescriptor, value: &ResolvedValue) -> StoreResult<PropertyValue> {
    Ok(match value {
        ResolvedValue::Scalar(raw) => match property.kind() {
            PropertyKind::Scalar(kind) => kind.parse(raw)?,
            _ => PropertyValue::Text(raw.clone()),
        },
        other => bind_element(other)?,
    })
}

/// Collection elements carry no declared scalar kind; they bind as text.
fn bind_element(value: &ResolvedValue) -> StoreResult<PropertyValue> {
    Ok(match value {
        ResolvedValue::Null => PropertyValue::Null,
        ResolvedValue::Scalar(raw) => PropertyValue::Text(raw.clone()),
        ResolvedValue::Object(object) => PropertyValue::Reference(object.address().clone()),
        ResolvedValue::List(items) => PropertyValue::List(
            items
                .iter()
                .map(bind_element)
                .collect::<StoreResult<Vec<_>>>()?,
        ),
    })
}
