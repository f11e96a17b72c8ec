use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use strata_types::{FullName, QualifiedName, TypeName};

use crate::config::DecodeConfig;
use crate::error::{PackError, PackResult};
use crate::format::{Cursor, MAGIC, VERSION};
use crate::part::{DecodeShared, DecodeTables, DecodedType, ObjectPart};

/// A package whose index has been read; data blocks arrive from the
/// background decode task and individual parts block on [`ObjectPart::open`].
pub struct DecodedPackage {
    package: Arc<str>,
    parts: Vec<Arc<ObjectPart>>,
    by_name: HashMap<FullName, usize>,
}

impl DecodedPackage {
    pub fn package_name(&self) -> &str {
        &self.package
    }

    pub fn parts(&self) -> &[Arc<ObjectPart>] {
        &self.parts
    }

    /// Look up a part by object address.
    pub fn part(&self, address: &FullName) -> Option<&Arc<ObjectPart>> {
        self.by_name.get(address).map(|&i| &self.parts[i])
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl std::fmt::Debug for DecodedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedPackage")
            .field("package", &self.package)
            .field("objects", &self.parts.len())
            .finish()
    }
}

/// Read a package buffer.
///
/// The header, primary string table, and object index are parsed
/// synchronously; the call returns as soon as the part placeholders
/// exist. Type table, secondary strings, and data blocks are decoded by a
/// background task, and any failure there is captured and re-surfaced
/// from the affected parts' `open` calls instead of being thrown here.
pub fn read_package(
    package: &str,
    bytes: Vec<u8>,
    config: &DecodeConfig,
) -> PackResult<DecodedPackage> {
    let package: Arc<str> = Arc::from(package);
    let mut cur = Cursor::new(&bytes);

    let magic = cur.take(4)?;
    if magic != MAGIC {
        return Err(PackError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into_owned(),
            actual: String::from_utf8_lossy(magic).into_owned(),
        });
    }
    let version = cur.read_u32_be()?;
    if version != VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }

    // Primary string table: the namespaces object addresses need, interned
    // so every address sharing a namespace shares one allocation.
    let primary_count = cur.read_varint()? as usize;
    let mut primary: Vec<Arc<str>> = Vec::with_capacity(primary_count);
    for _ in 0..primary_count {
        primary.push(Arc::from(cur.read_string()?));
    }

    // Object index: address rows plus cumulative end offsets into the
    // forthcoming data region.
    let object_count = cur.read_varint()? as usize;
    let mut addresses = Vec::with_capacity(object_count);
    let mut by_name = HashMap::with_capacity(object_count);
    let mut ranges = Vec::with_capacity(object_count);
    let mut prev_end = 0usize;
    for i in 0..object_count {
        let ns_index = cur.read_varint()?;
        let namespace = ns_index
            .checked_sub(1)
            .and_then(|n| primary.get(n as usize))
            .cloned()
            .ok_or_else(|| PackError::Corrupt {
                offset: cur.pos(),
                reason: format!("namespace index {ns_index} out of range"),
            })?;
        let name = cur.read_string()?;
        let end = cur.read_varint()? as usize;
        if end < prev_end {
            return Err(PackError::Corrupt {
                offset: cur.pos(),
                reason: format!("object end offset {end} precedes previous end {prev_end}"),
            });
        }
        let full_name = FullName::new(namespace, name);
        if by_name.insert(full_name.clone(), i).is_some() {
            return Err(PackError::DuplicateObject(full_name));
        }
        addresses.push(QualifiedName::new(full_name, Arc::clone(&package)));
        ranges.push((prev_end, end));
        prev_end = end;
    }

    let sync_end = cur.pos();
    let shared = Arc::new(DecodeShared::new(addresses.clone(), config.open_timeout));
    let parts: Vec<Arc<ObjectPart>> = addresses
        .iter()
        .enumerate()
        .map(|(i, address)| Arc::new(ObjectPart::new(address.clone(), i, Arc::clone(&shared))))
        .collect();

    debug!(package = %package, objects = object_count, "package index read");

    {
        let shared = Arc::clone(&shared);
        let package = Arc::clone(&package);
        thread::Builder::new()
            .name(format!("strata-decode-{package}"))
            .spawn(move || {
                match decode_deferred(&bytes, sync_end, primary, &ranges) {
                    Ok((tables, slices)) => {
                        debug!(package = %package, "data blocks decoded");
                        shared.complete(tables, slices);
                    }
                    Err(err) => {
                        warn!(package = %package, error = %err, "background decode failed");
                        shared.fail(err);
                    }
                }
            })?;
    }

    Ok(DecodedPackage {
        package,
        parts,
        by_name,
    })
}

/// Read a package file; the package name is the file stem.
pub fn read_package_file(path: &Path, config: &DecodeConfig) -> PackResult<DecodedPackage> {
    let package = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PackError::Internal(format!("package path has no UTF-8 stem: {path:?}")))?
        .to_string();
    let bytes = std::fs::read(path)?;
    read_package(&package, bytes, config)
}

/// Deferred phase: type table, secondary strings, then data-block slicing.
fn decode_deferred(
    bytes: &[u8],
    start: usize,
    primary: Vec<Arc<str>>,
    ranges: &[(usize, usize)],
) -> PackResult<(DecodeTables, Vec<Vec<u8>>)> {
    let mut cur = Cursor::new(bytes);
    cur.take(start)?;

    // Type table rows hold raw indices; they are resolved against the
    // combined table once the secondary strings have been read.
    struct RawType {
        provider: u64,
        namespace: u64,
        name: u64,
        package: u64,
        properties: Vec<u64>,
    }

    let type_count = cur.read_varint()? as usize;
    let mut raw_types = Vec::with_capacity(type_count);
    for _ in 0..type_count {
        let provider = cur.read_varint()?;
        let namespace = cur.read_varint()?;
        let name = cur.read_varint()?;
        let package = cur.read_varint()?;
        let property_count = cur.read_varint()? as usize;
        let mut properties = Vec::with_capacity(property_count);
        for _ in 0..property_count {
            properties.push(cur.read_varint()?);
        }
        raw_types.push(RawType {
            provider,
            namespace,
            name,
            package,
            properties,
        });
    }

    let secondary_count = cur.read_varint()? as usize;
    let mut strings = primary;
    strings.reserve(secondary_count);
    for _ in 0..secondary_count {
        strings.push(Arc::from(cur.read_string()?));
    }

    let tables_offset = cur.pos();
    let mut tables = DecodeTables {
        strings,
        types: Vec::with_capacity(type_count),
    };
    for raw in raw_types {
        let name = TypeName::new(
            tables.lookup(raw.provider, tables_offset)?,
            FullName::new(
                tables.lookup(raw.namespace, tables_offset)?,
                tables.lookup(raw.name, tables_offset)?,
            ),
            tables.lookup(raw.package, tables_offset)?,
        );
        let properties = raw
            .properties
            .iter()
            .map(|&idx| tables.lookup(idx, tables_offset))
            .collect::<PackResult<Vec<Arc<str>>>>()?;
        tables.types.push(DecodedType { name, properties });
    }

    let data_start = cur.pos();
    let data = &bytes[data_start..];
    let expected = ranges.last().map(|&(_, end)| end).unwrap_or(0);
    if data.len() != expected {
        return Err(PackError::Corrupt {
            offset: data_start,
            reason: format!("data region is {} bytes, index expects {expected}", data.len()),
        });
    }

    let slices = ranges
        .iter()
        .map(|&(start, end)| data[start..end].to_vec())
        .collect();

    Ok((tables, slices))
}
