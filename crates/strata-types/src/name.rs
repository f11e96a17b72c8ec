use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A namespace-qualified object name.
///
/// Both components compare ordinally (case-sensitive). The fields are
/// `Arc<str>` so that names built from a package's decoded string table
/// share one allocation per distinct string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FullName {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl FullName {
    pub fn new(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualify this name with its owning package.
    pub fn in_package(&self, package: impl Into<Arc<str>>) -> QualifiedName {
        QualifiedName::new(self.clone(), package)
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A [`FullName`] plus the package that defines the object.
///
/// Package names compare case-insensitively (ASCII); namespace and name
/// remain ordinal. The `Hash` implementation matches: it hashes the
/// lowercased package so equal keys always land in the same bucket.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    name: FullName,
    package: Arc<str>,
}

impl QualifiedName {
    pub fn new(name: FullName, package: impl Into<Arc<str>>) -> Self {
        Self {
            name,
            package: package.into(),
        }
    }

    pub fn full_name(&self) -> &FullName {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        self.name.namespace()
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.package.eq_ignore_ascii_case(&other.package)
    }
}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for b in self.package.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.package)
    }
}

/// A type address: a provider tag, a full name, and the defining package.
///
/// The provider tag is a language-binding discriminator carried for the
/// binder's benefit; it does not participate in equality or hashing. Two
/// type names naming the same namespace/name/package are equal regardless
/// of provider. Package comparison is case-insensitive, as with
/// [`QualifiedName`].
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct TypeName {
    provider: Arc<str>,
    name: FullName,
    package: Arc<str>,
}

impl TypeName {
    pub fn new(
        provider: impl Into<Arc<str>>,
        name: FullName,
        package: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            provider: provider.into(),
            name,
            package: package.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn full_name(&self) -> &FullName {
        &self.name
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}

impl PartialEq for TypeName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.package.eq_ignore_ascii_case(&other.package)
    }
}

impl Hash for TypeName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for b in self.package.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full(ns: &str, name: &str) -> FullName {
        FullName::new(ns, name)
    }

    #[test]
    fn full_name_equality_is_ordinal() {
        assert_eq!(full("App.Web", "Cache"), full("App.Web", "Cache"));
        assert_ne!(full("App.Web", "Cache"), full("app.web", "Cache"));
        assert_ne!(full("App.Web", "Cache"), full("App.Web", "cache"));
    }

    #[test]
    fn full_name_display() {
        assert_eq!(full("App.Web", "Cache").to_string(), "App.Web.Cache");
    }

    #[test]
    fn qualified_name_package_is_case_insensitive() {
        let a = full("App", "X").in_package("Core");
        let b = full("App", "X").in_package("CORE");
        assert_eq!(a, b);
    }

    #[test]
    fn qualified_name_rest_is_case_sensitive() {
        let a = full("App", "X").in_package("Core");
        let b = full("app", "X").in_package("Core");
        assert_ne!(a, b);
    }

    #[test]
    fn qualified_name_hash_matches_equality() {
        let mut map = HashMap::new();
        map.insert(full("App", "X").in_package("Core"), 1);
        assert_eq!(map.get(&full("App", "X").in_package("cOrE")), Some(&1));
        assert_eq!(map.get(&full("App", "X").in_package("Other")), None);
    }

    #[test]
    fn type_name_provider_does_not_affect_equality() {
        let a = TypeName::new("clr", full("App", "CacheSettings"), "Core");
        let b = TypeName::new("jvm", full("App", "CacheSettings"), "core");
        assert_eq!(a, b);
    }

    #[test]
    fn type_name_hash_ignores_provider() {
        let mut map = HashMap::new();
        map.insert(TypeName::new("clr", full("App", "T"), "Core"), 7);
        assert_eq!(
            map.get(&TypeName::new("", full("App", "T"), "core")),
            Some(&7)
        );
    }

    #[test]
    fn type_name_distinct_packages_differ() {
        let a = TypeName::new("clr", full("App", "T"), "Core");
        let b = TypeName::new("clr", full("App", "T"), "Extras");
        assert_ne!(a, b);
    }

    #[test]
    fn qualified_name_display() {
        let qn = full("App.Web", "Cache").in_package("Core");
        assert_eq!(qn.to_string(), "App.Web.Cache@Core");
    }

    #[test]
    fn serde_roundtrip() {
        let qn = full("App", "X").in_package("Core");
        let json = serde_json::to_string(&qn).unwrap();
        let parsed: QualifiedName = serde_json::from_str(&json).unwrap();
        assert_eq!(qn, parsed);
    }
}
