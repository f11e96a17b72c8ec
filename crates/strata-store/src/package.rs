use std::collections::HashSet;
use std::sync::Arc;

use strata_pack::{DecodedPackage, ObjectPart};
use strata_types::FullName;

/// A named collection of configuration object parts.
pub trait Package: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// The most-derived part for an address, if any package layer defines
    /// the object.
    fn part(&self, address: &FullName) -> Option<Arc<ObjectPart>>;

    /// Every part defined for an address, most-base first. For a single
    /// package this is zero or one entries; a combined package yields the
    /// whole overlay, which is how difference packages layer onto their
    /// base definitions.
    fn part_layers(&self, address: &FullName) -> Vec<Arc<ObjectPart>>;

    /// Addresses of every object defined by any layer.
    fn addresses(&self) -> Vec<FullName>;
}

/// A package backed by one decoded pack buffer.
pub struct BinaryPackage {
    decoded: DecodedPackage,
}

impl BinaryPackage {
    pub fn new(decoded: DecodedPackage) -> Self {
        Self { decoded }
    }
}

impl std::fmt::Debug for BinaryPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryPackage")
            .field("name", &self.name())
            .finish()
    }
}

impl Package for BinaryPackage {
    fn name(&self) -> &str {
        self.decoded.package_name()
    }

    fn part(&self, address: &FullName) -> Option<Arc<ObjectPart>> {
        self.decoded.part(address).cloned()
    }

    fn part_layers(&self, address: &FullName) -> Vec<Arc<ObjectPart>> {
        self.decoded.part(address).cloned().into_iter().collect()
    }

    fn addresses(&self) -> Vec<FullName> {
        self.decoded
            .parts()
            .iter()
            .map(|p| p.address().full_name().clone())
            .collect()
    }
}

/// Same-named packages from a dependency chain, combined into an ordered
/// overlay. Layers are held lowest-depth (most base) first; lookups walk
/// them so the highest-depth layer's parts take precedence.
pub struct CombinedPackage {
    name: String,
    layers: Vec<Arc<dyn Package>>,
}

impl CombinedPackage {
    pub fn new(name: impl Into<String>, layers: Vec<Arc<dyn Package>>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl std::fmt::Debug for CombinedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedPackage")
            .field("name", &self.name)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl Package for CombinedPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn part(&self, address: &FullName) -> Option<Arc<ObjectPart>> {
        self.layers.iter().rev().find_map(|layer| layer.part(address))
    }

    fn part_layers(&self, address: &FullName) -> Vec<Arc<ObjectPart>> {
        self.layers
            .iter()
            .flat_map(|layer| layer.part_layers(address))
            .collect()
    }

    fn addresses(&self) -> Vec<FullName> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for layer in &self.layers {
            for address in layer.addresses() {
                if seen.insert(address.clone()) {
                    out.push(address);
                }
            }
        }
        out
    }
}
