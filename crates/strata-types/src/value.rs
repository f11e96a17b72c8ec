use serde::{Deserialize, Serialize};

use crate::name::QualifiedName;

/// A reference to another configuration object by address.
///
/// `None` is the explicit "points at nothing" sentinel, distinct from a
/// property holding [`Value::Null`]. Resolving a pointer is idempotent:
/// resolving the same target twice yields the same live object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPtr {
    target: Option<QualifiedName>,
}

impl ObjectPtr {
    /// A pointer to the given object address.
    pub fn to(target: QualifiedName) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// The "none" sentinel.
    pub fn none() -> Self {
        Self { target: None }
    }

    pub fn target(&self) -> Option<&QualifiedName> {
        self.target.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.target.is_none()
    }
}

/// The action recorded by one collection diff entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffAction {
    Add,
    Remove,
}

/// One recorded mutation of a collection-valued property.
///
/// Diff items are produced by the codec and consumed once by the merge
/// engine; the payload uses the same value model recursively.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffItem {
    pub action: DiffAction,
    pub value: Value,
}

impl DiffItem {
    pub fn add(value: Value) -> Self {
        Self {
            action: DiffAction::Add,
            value,
        }
    }

    pub fn remove(value: Value) -> Self {
        Self {
            action: DiffAction::Remove,
            value,
        }
    }
}

/// Everything a configuration property can hold.
///
/// One case per codec tag. Scalars carry their invariant string form; the
/// binder's converter turns them into host values when an object is bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Scalar(String),
    Reference(ObjectPtr),
    Collection(Vec<DiffItem>),
}

impl Value {
    pub fn scalar(value: impl Into<String>) -> Self {
        Value::Scalar(value.into())
    }

    pub fn reference(target: QualifiedName) -> Self {
        Value::Reference(ObjectPtr::to(target))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ObjectPtr> {
        match self {
            Value::Reference(ptr) => Some(ptr),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[DiffItem]> {
        match self {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }
}
