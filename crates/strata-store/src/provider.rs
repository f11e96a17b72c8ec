use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// Byte-source capability for package content.
///
/// A repository asks its provider for raw package bytes by name; how the
/// bytes are stored (files, archives, memory) is the provider's business.
/// Name matching is case-insensitive, like package names everywhere else.
pub trait PackageProvider: Send + Sync {
    /// The raw bytes of the named package, or `None` if this provider has
    /// no package of that name.
    fn open_package(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Names of every package this provider can open.
    fn package_names(&self) -> StoreResult<Vec<String>>;
}

/// Discovers `<name>.<ext>` package files directly under a content path.
pub struct DirectoryProvider {
    root: PathBuf,
    extension: String,
}

impl DirectoryProvider {
    /// Default package file extension.
    pub const EXTENSION: &'static str = "scpk";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: Self::EXTENSION.to_string(),
        }
    }

    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn package_files(&self) -> StoreResult<Vec<(String, PathBuf)>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Internal(format!("content path enumeration failed: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
            if !matches_ext {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.push((stem.to_string(), path.to_path_buf()));
            }
        }
        Ok(found)
    }
}

impl PackageProvider for DirectoryProvider {
    fn open_package(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        for (stem, path) in self.package_files()? {
            if stem.eq_ignore_ascii_case(name) {
                debug!(package = name, path = %path.display(), "package file found");
                return Ok(Some(std::fs::read(path)?));
            }
        }
        Ok(None)
    }

    fn package_names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self
            .package_files()?
            .into_iter()
            .map(|(stem, _)| stem)
            .collect();
        names.sort();
        Ok(names)
    }
}

/// In-memory provider for tests and embedding.
pub struct MemoryProvider {
    packages: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            packages: RwLock::new(HashMap::new()),
        }
    }

    /// Register package bytes under a name; replaces any previous content.
    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        self.packages
            .write()
            .expect("provider lock poisoned")
            .insert(key, (name, bytes));
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageProvider for MemoryProvider {
    fn open_package(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let packages = self.packages.read().expect("provider lock poisoned");
        Ok(packages
            .get(&name.to_ascii_lowercase())
            .map(|(_, bytes)| bytes.clone()))
    }

    fn package_names(&self) -> StoreResult<Vec<String>> {
        let packages = self.packages.read().expect("provider lock poisoned");
        let mut names: Vec<String> = packages.values().map(|(name, _)| name.clone()).collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_roundtrip() {
        let provider = MemoryProvider::new();
        provider.insert("Core", vec![1, 2, 3]);

        assert_eq!(provider.open_package("Core").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(provider.open_package("core").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(provider.open_package("Other").unwrap(), None);
        assert_eq!(provider.package_names().unwrap(), vec!["Core"]);
    }

    #[test]
    fn directory_provider_discovers_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Core.scpk"), b"core-bytes").unwrap();
        std::fs::write(dir.path().join("Extras.scpk"), b"extra-bytes").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("Deep.scpk"), b"ignored").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert_eq!(
            provider.package_names().unwrap(),
            vec!["Core", "Extras"]
        );
        assert_eq!(
            provider.open_package("core").unwrap(),
            Some(b"core-bytes".to_vec())
        );
        assert_eq!(provider.open_package("Missing").unwrap(), None);
    }

    #[test]
    fn directory_provider_missing_root_is_an_error() {
        let provider = DirectoryProvider::new("/nonexistent/strata-content");
        assert!(provider.package_names().is_err());
    }
}
