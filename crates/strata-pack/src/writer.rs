use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::debug;

use strata_types::{FullName, TypeName, Value};

use crate::error::{PackError, PackResult};
use crate::format::{
    encode_varint, write_string, ACTION_ADD, ACTION_REMOVE, MAGIC, TAG_COLLECTION,
    TAG_EXTERNAL_REF, TAG_INTERNAL_REF, TAG_NULL, TAG_SCALAR, VERSION,
};

/// Session-scoped string interner producing dense 1-based indices
/// (0 is reserved for null). Indices are append-only: once assigned, an
/// index never changes for the rest of the encode session.
#[derive(Default)]
struct StringInterner {
    strings: Vec<String>,
    index: HashMap<String, u64>,
}

impl StringInterner {
    fn intern(&mut self, s: &str) -> u64 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        self.strings.push(s.to_string());
        let idx = self.strings.len() as u64;
        self.index.insert(s.to_string(), idx);
        idx
    }
}

/// Per-type accumulator: only the properties actually referenced by some
/// object of the type make it into the table, in first-use order.
struct TypeEntry {
    name: TypeName,
    properties: Vec<String>,
    positions: HashMap<String, u64>,
}

impl TypeEntry {
    fn property_position(&mut self, property: &str) -> u64 {
        if let Some(&pos) = self.positions.get(property) {
            return pos;
        }
        let pos = self.properties.len() as u64;
        self.properties.push(property.to_string());
        self.positions.insert(property.to_string(), pos);
        pos
    }
}

struct WriterEntry {
    address: FullName,
    type_name: TypeName,
    values: BTreeMap<String, Value>,
}

/// Builds a binary package from object parts.
///
/// Values must already be in their invariant string form; the writer
/// records them verbatim. References whose target lives in this package
/// are written as cheap internal ordinals, everything else as full
/// namespace/name/package string indices.
pub struct PackageWriter {
    package: String,
    entries: Vec<WriterEntry>,
}

impl PackageWriter {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            entries: Vec::new(),
        }
    }

    /// Queue one object's locally-defined values.
    pub fn add_object(
        &mut self,
        address: FullName,
        type_name: TypeName,
        values: BTreeMap<String, Value>,
    ) {
        self.entries.push(WriterEntry {
            address,
            type_name,
            values,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// Encode the queued objects into a single package buffer.
    pub fn finish(self) -> PackResult<Vec<u8>> {
        let mut interner = StringInterner::default();

        // Primary string region: exactly the namespaces needed to resolve
        // object addresses. Interned first so the synchronous index read
        // never touches the secondary region.
        let mut ns_indices = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            ns_indices.push(interner.intern(entry.address.namespace()));
        }
        let primary_len = interner.strings.len();

        // Internal-reference ordinals are 1-based object index positions.
        let mut ordinals: HashMap<FullName, u64> = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if ordinals
                .insert(entry.address.clone(), (i + 1) as u64)
                .is_some()
            {
                return Err(PackError::DuplicateObject(entry.address.clone()));
            }
        }

        // Scan pass: collect referenced types and their used properties.
        let mut types: Vec<TypeEntry> = Vec::new();
        let mut type_index: HashMap<TypeName, usize> = HashMap::new();
        let mut entry_types = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let slot = *type_index.entry(entry.type_name.clone()).or_insert_with(|| {
                types.push(TypeEntry {
                    name: entry.type_name.clone(),
                    properties: Vec::new(),
                    positions: HashMap::new(),
                });
                types.len() - 1
            });
            for property in entry.values.keys() {
                types[slot].property_position(property);
            }
            entry_types.push(slot);
        }

        // Write pass: serialize every data block into a scratch buffer,
        // recording cumulative end offsets for the object index.
        let mut data = Vec::new();
        let mut end_offsets = Vec::with_capacity(self.entries.len());
        for (entry, &slot) in self.entries.iter().zip(&entry_types) {
            encode_varint(&mut data, (slot + 1) as u64);
            encode_varint(&mut data, entry.values.len() as u64);
            for (property, value) in &entry.values {
                let position = types[slot].property_position(property);
                encode_varint(&mut data, position);
                encode_value(&mut data, value, &mut interner, &ordinals, &self.package);
            }
            end_offsets.push(data.len() as u64);
        }

        // Assemble the sections in physical order. Type-table strings are
        // interned here, before the secondary region is snapshotted below.
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());

        encode_varint(&mut out, primary_len as u64);
        for s in &interner.strings[..primary_len] {
            write_string(&mut out, s);
        }

        encode_varint(&mut out, self.entries.len() as u64);
        for (entry, (&ns_idx, &end)) in self
            .entries
            .iter()
            .zip(ns_indices.iter().zip(&end_offsets))
        {
            encode_varint(&mut out, ns_idx);
            write_string(&mut out, entry.address.name());
            encode_varint(&mut out, end);
        }

        let mut type_section = Vec::new();
        encode_varint(&mut type_section, types.len() as u64);
        for ty in &types {
            encode_varint(&mut type_section, interner.intern(ty.name.provider()));
            encode_varint(
                &mut type_section,
                interner.intern(ty.name.full_name().namespace()),
            );
            encode_varint(
                &mut type_section,
                interner.intern(ty.name.full_name().name()),
            );
            encode_varint(&mut type_section, interner.intern(ty.name.package()));
            encode_varint(&mut type_section, ty.properties.len() as u64);
            for property in &ty.properties {
                encode_varint(&mut type_section, interner.intern(property));
            }
        }
        out.extend_from_slice(&type_section);

        let secondary = &interner.strings[primary_len..];
        encode_varint(&mut out, secondary.len() as u64);
        for s in secondary {
            write_string(&mut out, s);
        }

        out.extend_from_slice(&data);

        debug!(
            package = %self.package,
            objects = self.entries.len(),
            types = types.len(),
            strings = interner.strings.len(),
            bytes = out.len(),
            "package encoded"
        );
        Ok(out)
    }

    /// Encode and write to disk.
    pub fn write_to(self, path: &Path) -> PackResult<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn encode_value(
    buf: &mut Vec<u8>,
    value: &Value,
    interner: &mut StringInterner,
    ordinals: &HashMap<FullName, u64>,
    package: &str,
) {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Scalar(s) => {
            buf.push(TAG_SCALAR);
            write_string(buf, s);
        }
        Value::Reference(ptr) => match ptr.target() {
            None => {
                buf.push(TAG_INTERNAL_REF);
                encode_varint(buf, 0);
            }
            Some(target)
                if target.package().eq_ignore_ascii_case(package)
                    && ordinals.contains_key(target.full_name()) =>
            {
                buf.push(TAG_INTERNAL_REF);
                encode_varint(buf, ordinals[target.full_name()]);
            }
            Some(target) => {
                buf.push(TAG_EXTERNAL_REF);
                encode_varint(buf, interner.intern(target.namespace()));
                encode_varint(buf, interner.intern(target.name()));
                encode_varint(buf, interner.intern(target.package()));
            }
        },
        Value::Collection(items) => {
            buf.push(TAG_COLLECTION);
            encode_varint(buf, items.len() as u64);
            for item in items {
                buf.push(match item.action {
                    strata_types::DiffAction::Add => ACTION_ADD,
                    strata_types::DiffAction::Remove => ACTION_REMOVE,
                });
                encode_value(buf, &item.value, interner, ordinals, package);
            }
        }
    }
}
