use std::sync::Arc;

use tracing::{debug, info};

use strata_pack::{read_package, DecodeConfig};
use strata_types::{validate_package_name, MemoCache};

use crate::error::{StoreError, StoreResult};
use crate::package::{BinaryPackage, CombinedPackage, Package};
use crate::provider::PackageProvider;

/// A dependency-ordered source of packages.
///
/// Each repository owns a provider for its local package content and a
/// fixed, acyclic list of dependency repositories supplied at
/// construction. Same-named packages across the dependency chain combine
/// into an ordered overlay: the deepest repository is the most derived
/// and overrides the rest.
pub struct Repository {
    provider: Arc<dyn PackageProvider>,
    dependencies: Vec<Arc<Repository>>,
    depth: usize,
    decode: DecodeConfig,
    packages: MemoCache<String, Arc<dyn Package>>,
}

impl Repository {
    /// A repository with no dependencies (depth 0).
    pub fn new(provider: Arc<dyn PackageProvider>) -> Arc<Self> {
        Self::with_dependencies(provider, Vec::new())
    }

    pub fn with_dependencies(
        provider: Arc<dyn PackageProvider>,
        dependencies: Vec<Arc<Repository>>,
    ) -> Arc<Self> {
        Self::with_config(provider, dependencies, DecodeConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn PackageProvider>,
        dependencies: Vec<Arc<Repository>>,
        decode: DecodeConfig,
    ) -> Arc<Self> {
        let depth = dependencies
            .iter()
            .map(|d| d.depth + 1)
            .max()
            .unwrap_or(0);
        Arc::new(Self {
            provider,
            dependencies,
            depth,
            decode,
            packages: MemoCache::new(),
        })
    }

    /// Distance from the deepest dependency: 0 with no dependencies, else
    /// one more than the deepest dependency.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn dependencies(&self) -> &[Arc<Repository>] {
        &self.dependencies
    }

    /// Load a package, combining same-named packages across the
    /// dependency chain.
    ///
    /// The result is cached per repository instance: repeated calls for
    /// one name return the identical package object.
    pub fn get_package(self: &Arc<Self>, name: &str) -> StoreResult<Arc<dyn Package>> {
        validate_package_name(name)?;
        self.packages
            .get_or_try_insert_with(&name.to_ascii_lowercase(), || self.load_package(name))
    }

    fn load_package(self: &Arc<Self>, name: &str) -> StoreResult<Arc<dyn Package>> {
        let chain = self.load_order();
        let mut layers: Vec<Arc<dyn Package>> = Vec::new();
        for repository in &chain {
            if let Some(bytes) = repository.provider.open_package(name)? {
                let decoded = read_package(name, bytes, &self.decode)?;
                debug!(
                    package = name,
                    depth = repository.depth,
                    objects = decoded.len(),
                    "package layer loaded"
                );
                layers.push(Arc::new(BinaryPackage::new(decoded)));
            }
        }

        match layers.len() {
            0 => Err(StoreError::PackageNotFound(name.to_string())),
            1 => Ok(layers.pop().expect("one layer")),
            n => {
                info!(package = name, layers = n, "combining difference packages");
                Ok(Arc::new(CombinedPackage::new(name, layers)))
            }
        }
    }

    /// Every repository reachable from this one, de-duplicated by
    /// instance and sorted ascending by depth: lowest depth is the most
    /// base, highest the most derived.
    fn load_order(self: &Arc<Self>) -> Vec<Arc<Repository>> {
        let mut collected: Vec<Arc<Repository>> = Vec::new();
        collect_reachable(self, &mut collected);
        collected.sort_by_key(|r| r.depth);
        collected
    }
}

fn collect_reachable(repository: &Arc<Repository>, out: &mut Vec<Arc<Repository>>) {
    if out.iter().any(|seen| Arc::ptr_eq(seen, repository)) {
        return;
    }
    for dependency in &repository.dependencies {
        collect_reachable(dependency, out);
    }
    out.push(Arc::clone(repository));
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("depth", &self.depth)
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;

    fn empty_repo() -> Arc<Repository> {
        Repository::new(Arc::new(MemoryProvider::new()))
    }

    #[test]
    fn depth_of_leaf_is_zero() {
        assert_eq!(empty_repo().depth(), 0);
    }

    #[test]
    fn depth_is_one_plus_deepest_dependency() {
        let base = empty_repo();
        let mid = Repository::with_dependencies(
            Arc::new(MemoryProvider::new()),
            vec![Arc::clone(&base)],
        );
        let top = Repository::with_dependencies(
            Arc::new(MemoryProvider::new()),
            vec![Arc::clone(&base), Arc::clone(&mid)],
        );
        assert_eq!(mid.depth(), 1);
        assert_eq!(top.depth(), 2);
    }

    #[test]
    fn invalid_package_name_is_rejected() {
        let repo = empty_repo();
        let err = repo.get_package("2bad").unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
        let err = repo.get_package("").unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[test]
    fn missing_package_is_not_found() {
        let repo = empty_repo();
        let err = repo.get_package("Core").unwrap_err();
        assert!(matches!(err, StoreError::PackageNotFound(_)));
    }

    #[test]
    fn load_order_is_depth_ascending_and_deduplicated() {
        // Diamond: top depends on left and right, both depend on base.
        let base = empty_repo();
        let left = Repository::with_dependencies(
            Arc::new(MemoryProvider::new()),
            vec![Arc::clone(&base)],
        );
        let right = Repository::with_dependencies(
            Arc::new(MemoryProvider::new()),
            vec![Arc::clone(&base)],
        );
        let top = Repository::with_dependencies(
            Arc::new(MemoryProvider::new()),
            vec![Arc::clone(&left), Arc::clone(&right)],
        );

        let order = top.load_order();
        assert_eq!(order.len(), 4);
        assert!(Arc::ptr_eq(&order[0], &base));
        assert!(Arc::ptr_eq(order.last().unwrap(), &top));
        for pair in order.windows(2) {
            assert!(pair[0].depth() <= pair[1].depth());
        }
    }
}
