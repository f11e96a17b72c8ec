use strata_types::{QualifiedName, Value};

use crate::error::{BindError, BindResult};

/// A host-side property value, produced when a configuration object is
/// bound to an instance.
///
/// References are delivered as addresses; the host decides how deeply to
/// follow them.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Reference(QualifiedName),
    List(Vec<PropertyValue>),
}

/// The scalar converter: parses and formats the invariant string form.
///
/// The invariant form is culture-independent: decimal integers, `.` as the
/// float separator, and lowercase `true`/`false` booleans. `parse` and
/// `format` round-trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
}

impl ScalarKind {
    /// Parse the invariant string form into a typed [`PropertyValue`].
    pub fn parse(&self, raw: &str) -> BindResult<PropertyValue> {
        let invalid = || BindError::InvalidScalar {
            expected: format!("{self:?}"),
            value: raw.to_string(),
        };
        match self {
            ScalarKind::Text => Ok(PropertyValue::Text(raw.to_string())),
            ScalarKind::Integer => raw
                .parse::<i64>()
                .map(PropertyValue::Integer)
                .map_err(|_| invalid()),
            ScalarKind::Float => raw
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| invalid()),
            ScalarKind::Boolean => match raw {
                "true" => Ok(PropertyValue::Boolean(true)),
                "false" => Ok(PropertyValue::Boolean(false)),
                _ => Err(invalid()),
            },
        }
    }

    /// Format a typed value back into the invariant string form.
    pub fn format(&self, value: &PropertyValue) -> BindResult<String> {
        let mismatch = || BindError::InvalidScalar {
            expected: format!("{self:?}"),
            value: format!("{value:?}"),
        };
        match (self, value) {
            (ScalarKind::Text, PropertyValue::Text(s)) => Ok(s.clone()),
            (ScalarKind::Integer, PropertyValue::Integer(i)) => Ok(i.to_string()),
            (ScalarKind::Float, PropertyValue::Float(f)) => Ok(f.to_string()),
            (ScalarKind::Boolean, PropertyValue::Boolean(b)) => Ok(b.to_string()),
            _ => Err(mismatch()),
        }
    }
}

/// What shape of value a property holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarKind),
    Reference,
    Collection,
}

/// Metadata for one property of a configuration type.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropertyKind,
    default: Value,
}

impl PropertyDescriptor {
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar(kind),
            default: Value::Null,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Reference,
            default: Value::Null,
        }
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Collection,
            default: Value::Collection(Vec::new()),
        }
    }

    /// Override the value returned when neither the object nor any base
    /// defines this property.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }
}
