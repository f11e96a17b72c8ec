use std::collections::HashSet;
use std::sync::{Arc, Mutex, Weak};

use strata_bind::{BindError, PropertyKind, TypeDescriptor};
use strata_pack::ObjectPart;
use strata_types::{DiffItem, QualifiedName, Value};

use crate::error::{StoreError, StoreResult};
use crate::workspace::WorkspaceInner;

/// Reserved property carrying an object's base pointer. Parts without it
/// have no base; it never appears in a type descriptor's property list.
pub const BASE_PROPERTY: &str = "$base";

/// A property value with every object pointer resolved to a live object.
#[derive(Clone, Debug)]
pub enum ResolvedValue {
    Null,
    Scalar(String),
    Object(Arc<ConfigurationObject>),
    List(Vec<ResolvedValue>),
}

impl ResolvedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ResolvedValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ConfigurationObject>> {
        match self {
            ResolvedValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ResolvedValue]> {
        match self {
            ResolvedValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for ResolvedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedValue::Null, ResolvedValue::Null) => true,
            (ResolvedValue::Scalar(a), ResolvedValue::Scalar(b)) => a == b,
            // Objects compare by identity: one live object per address.
            (ResolvedValue::Object(a), ResolvedValue::Object(b)) => Arc::ptr_eq(a, b),
            (ResolvedValue::List(a), ResolvedValue::List(b)) => a == b,
            _ => false,
        }
    }
}

enum BaseSlot {
    Unresolved,
    Resolved(Option<Arc<ConfigurationObject>>),
    Failed(Arc<StoreError>),
}

/// A resolved configuration instance: an address, its part overlay, and a
/// lazily-resolved base object.
///
/// Created exactly once per `(workspace, address)` through the workspace
/// cache, so reference identity is meaningful. Parts are held most-base
/// first; local lookups scan most-derived first, then fall back through
/// the base chain, then to the property's declared default.
pub struct ConfigurationObject {
    address: QualifiedName,
    parts: Vec<Arc<ObjectPart>>,
    descriptor: Arc<dyn TypeDescriptor>,
    workspace: Weak<WorkspaceInner>,
    base: Mutex<BaseSlot>,
}

impl ConfigurationObject {
    pub(crate) fn new(
        address: QualifiedName,
        parts: Vec<Arc<ObjectPart>>,
        descriptor: Arc<dyn TypeDescriptor>,
        workspace: Weak<WorkspaceInner>,
    ) -> Self {
        Self {
            address,
            parts,
            descriptor,
            workspace,
            base: Mutex::new(BaseSlot::Unresolved),
        }
    }

    pub fn address(&self) -> &QualifiedName {
        &self.address
    }

    /// The bound type descriptor of the most-derived part.
    pub fn descriptor(&self) -> &Arc<dyn TypeDescriptor> {
        &self.descriptor
    }

    /// The base object, resolved on first access and cached.
    ///
    /// The outcome is cached either way: an unresolvable base address
    /// fails every call, never retried.
    pub fn base(&self) -> StoreResult<Option<Arc<ConfigurationObject>>> {
        let mut slot = self.base.lock().expect("base slot poisoned");
        match &*slot {
            BaseSlot::Resolved(base) => Ok(base.clone()),
            BaseSlot::Failed(err) => Err(resurface(err)),
            BaseSlot::Unresolved => match self.resolve_base() {
                Ok(base) => {
                    *slot = BaseSlot::Resolved(base.clone());
                    Ok(base)
                }
                Err(err) => {
                    let err = Arc::new(err);
                    *slot = BaseSlot::Failed(Arc::clone(&err));
                    Err(resurface(&err))
                }
            },
        }
    }

    /// Resolve a property value.
    ///
    /// Scalar and reference properties fall through locally-defined
    /// values, then the base chain, then the declared default. Collection
    /// properties materialize the diff items recorded along the whole
    /// chain through the merge engine.
    pub fn get_value(&self, property: &str) -> StoreResult<ResolvedValue> {
        if property.is_empty() {
            return Err(StoreError::Bind(BindError::EmptyPropertyName));
        }
        let descriptor_property = self.descriptor.property(property)?;

        if descriptor_property.kind() == PropertyKind::Collection {
            return self.materialize_collection(property, descriptor_property.default_value());
        }

        if let Some(value) = self.local_value(property) {
            let value = value.clone();
            return self.resolve_value(&value);
        }

        let mut visited = HashSet::new();
        visited.insert(self.address.clone());
        let mut cursor = self.base()?;
        while let Some(object) = cursor {
            if !visited.insert(object.address().clone()) {
                return Err(StoreError::CyclicInheritance(object.address().clone()));
            }
            if let Some(value) = object.local_value(property) {
                let value = value.clone();
                return self.resolve_value(&value);
            }
            cursor = object.base()?;
        }

        self.resolve_value(descriptor_property.default_value())
    }

    /// The most-derived locally-defined value for a property, ignoring
    /// the base chain and defaults.
    pub fn local_value(&self, property: &str) -> Option<&Value> {
        self.parts.iter().rev().find_map(|part| part.value(property))
    }

    fn materialize_collection(
        &self,
        property: &str,
        default: &Value,
    ) -> StoreResult<ResolvedValue> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let defined = self.collect_items(property, &mut visited, &mut items)?;
        if !defined {
            return self.resolve_value(default);
        }
        let resolved =
            strata_merge::merge_items(items, |value| self.resolve_value(&value))?;
        Ok(ResolvedValue::List(resolved))
    }

    /// Gather a collection property's diff items most-base-first along
    /// the base chain and the part overlay. Returns whether any part
    /// defined the property at all.
    fn collect_items(
        &self,
        property: &str,
        visited: &mut HashSet<QualifiedName>,
        out: &mut Vec<DiffItem>,
    ) -> StoreResult<bool> {
        if !visited.insert(self.address.clone()) {
            return Err(StoreError::CyclicInheritance(self.address.clone()));
        }
        let mut defined = false;
        if let Some(base) = self.base()? {
            defined |= base.collect_items(property, visited, out)?;
        }
        for part in &self.parts {
            match part.value(property) {
                Some(Value::Collection(found)) => {
                    defined = true;
                    out.extend(found.iter().cloned());
                }
                Some(_) => {
                    return Err(StoreError::PropertyKindMismatch {
                        address: self.address.clone(),
                        property: property.to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(defined)
    }

    fn resolve_value(&self, value: &Value) -> StoreResult<ResolvedValue> {
        match value {
            Value::Null => Ok(ResolvedValue::Null),
            Value::Scalar(s) => Ok(ResolvedValue::Scalar(s.clone())),
            Value::Reference(ptr) => match ptr.target() {
                None => Ok(ResolvedValue::Null),
                Some(target) => {
                    let workspace = self.workspace()?;
                    match workspace.resolve(target)? {
                        Some(object) => Ok(ResolvedValue::Object(object)),
                        None => Err(StoreError::ObjectNotFound(target.clone())),
                    }
                }
            },
            Value::Collection(items) => {
                let resolved = strata_merge::merge_items(items.iter().cloned(), |v| {
                    self.resolve_value(&v)
                })?;
                Ok(ResolvedValue::List(resolved))
            }
        }
    }

    fn resolve_base(&self) -> StoreResult<Option<Arc<ConfigurationObject>>> {
        let value = match self.local_value(BASE_PROPERTY) {
            None => return Ok(None),
            Some(value) => value.clone(),
        };
        let ptr = match value {
            Value::Reference(ptr) => ptr,
            _ => {
                return Err(StoreError::PropertyKindMismatch {
                    address: self.address.clone(),
                    property: BASE_PROPERTY.to_string(),
                });
            }
        };
        let target = match ptr.target() {
            None => return Ok(None),
            Some(target) => target.clone(),
        };
        let workspace = self.workspace()?;
        match workspace.resolve(&target)? {
            Some(base) => Ok(Some(base)),
            None => Err(StoreError::ObjectNotFound(target)),
        }
    }

    fn workspace(&self) -> StoreResult<Arc<WorkspaceInner>> {
        self.workspace
            .upgrade()
            .ok_or_else(|| StoreError::Internal("workspace dropped".into()))
    }
}

impl std::fmt::Debug for ConfigurationObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationObject")
            .field("address", &self.address)
            .field("parts", &self.parts.len())
            .finish()
    }
}

/// Re-surface a cached base-resolution failure. Address-shaped failures
/// keep their variant; everything else wraps the shared original.
fn resurface(err: &Arc<StoreError>) -> StoreError {
    match err.as_ref() {
        StoreError::ObjectNotFound(address) => StoreError::ObjectNotFound(address.clone()),
        StoreError::CyclicInheritance(address) => {
            StoreError::CyclicInheritance(address.clone())
        }
        _ => StoreError::BaseResolution(Arc::clone(err)),
    }
}
