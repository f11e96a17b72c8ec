use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use strata_types::TypeName;

use crate::descriptor::{PropertyDescriptor, PropertyValue};
use crate::error::{BindError, BindResult};
use crate::traits::{BoundInstance, TypeBinder, TypeDescriptor};

/// An in-memory type descriptor built from explicit property metadata.
///
/// Intended for tests and embedding; hosts with a real type system
/// implement [`TypeDescriptor`] over their own metadata instead.
#[derive(Clone, Debug)]
pub struct SimpleType {
    name: TypeName,
    properties: Vec<PropertyDescriptor>,
}

impl SimpleType {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}

impl TypeDescriptor for SimpleType {
    fn type_name(&self) -> &TypeName {
        &self.name
    }

    fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    fn create_instance(&self) -> Box<dyn BoundInstance> {
        Box::new(SimpleInstance {
            type_name: self.name.clone(),
            values: BTreeMap::new(),
        })
    }
}

/// Property-bag instance produced by [`SimpleType::create_instance`].
#[derive(Debug)]
pub struct SimpleInstance {
    type_name: TypeName,
    values: BTreeMap<String, PropertyValue>,
}

impl BoundInstance for SimpleInstance {
    fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> BindResult<()> {
        if name.is_empty() {
            return Err(BindError::EmptyPropertyName);
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    fn get_property(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory binder: a registry of [`SimpleType`] descriptors.
pub struct SimpleBinder {
    types: RwLock<HashMap<TypeName, Arc<SimpleType>>>,
}

impl SimpleBinder {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Register a type. Re-registering a name replaces the descriptor.
    pub fn register(&self, descriptor: SimpleType) {
        let mut types = self.types.write().expect("binder lock poisoned");
        types.insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    pub fn len(&self) -> usize {
        self.types.read().expect("binder lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SimpleBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeBinder for SimpleBinder {
    fn bind(&self, name: &TypeName) -> BindResult<Arc<dyn TypeDescriptor>> {
        let types = self.types.read().expect("binder lock poisoned");
        types
            .get(name)
            .cloned()
            .map(|t| t as Arc<dyn TypeDescriptor>)
            .ok_or_else(|| BindError::UnknownType(name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarKind;
    use strata_types::{FullName, Value};

    fn type_name(name: &str) -> TypeName {
        TypeName::new("host", FullName::new("App", name), "Core")
    }

    fn server_type() -> SimpleType {
        SimpleType::new(type_name("Server"))
            .with_property(
                PropertyDescriptor::scalar("port", ScalarKind::Integer)
                    .with_default(Value::scalar("8080")),
            )
            .with_property(PropertyDescriptor::reference("fallback"))
    }

    #[test]
    fn bind_registered_type() {
        let binder = SimpleBinder::new();
        binder.register(server_type());

        let descriptor = binder.bind(&type_name("Server")).unwrap();
        assert_eq!(descriptor.properties().len(), 2);
        assert_eq!(descriptor.property("port").unwrap().name(), "port");
    }

    #[test]
    fn bind_unknown_type_fails() {
        let binder = SimpleBinder::new();
        let err = binder.bind(&type_name("Nope")).unwrap_err();
        assert!(matches!(err, BindError::UnknownType(_)));
    }

    #[test]
    fn bind_ignores_provider_tag() {
        let binder = SimpleBinder::new();
        binder.register(server_type());

        let other_provider = TypeName::new("jvm", FullName::new("App", "Server"), "core");
        assert!(binder.bind(&other_provider).is_ok());
    }

    #[test]
    fn property_lookup_distinguishes_empty_from_unknown() {
        let binder = SimpleBinder::new();
        binder.register(server_type());
        let descriptor = binder.bind(&type_name("Server")).unwrap();

        assert!(matches!(
            descriptor.property("").unwrap_err(),
            BindError::EmptyPropertyName
        ));
        assert!(matches!(
            descriptor.property("nope").unwrap_err(),
            BindError::UnknownProperty { .. }
        ));
    }

    #[test]
    fn instance_set_and_get() {
        let binder = SimpleBinder::new();
        binder.register(server_type());
        let descriptor = binder.bind(&type_name("Server")).unwrap();

        let mut instance = descriptor.create_instance();
        instance
            .set_property("port", PropertyValue::Integer(9090))
            .unwrap();
        assert_eq!(
            instance.get_property("port"),
            Some(&PropertyValue::Integer(9090))
        );
        assert_eq!(instance.get_property("missing"), None);
    }

    #[test]
    fn instance_rejects_empty_property_name() {
        let descriptor = server_type();
        let mut instance = descriptor.create_instance();
        let err = instance
            .set_property("", PropertyValue::Null)
            .unwrap_err();
        assert!(matches!(err, BindError::EmptyPropertyName));
    }

    #[test]
    fn instance_downcasts() {
        let descriptor = server_type();
        let instance = descriptor.create_instance();
        assert!(instance.as_any().downcast_ref::<SimpleInstance>().is_some());
    }
}
