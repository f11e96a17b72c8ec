use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

use tracing::debug;

use strata_bind::{TypeBinder, TypeDescriptor};
use strata_types::{DiffItem, FullName, ObjectPtr, QualifiedName, TypeName, Value};

use crate::error::{PackError, PackResult};
use crate::format::{
    Cursor, ACTION_ADD, ACTION_REMOVE, TAG_COLLECTION, TAG_EXTERNAL_REF, TAG_INTERNAL_REF,
    TAG_NULL, TAG_SCALAR,
};

/// One decoded type-table row.
pub(crate) struct DecodedType {
    pub(crate) name: TypeName,
    pub(crate) properties: Vec<Arc<str>>,
}

/// The transient decode context: the combined string table and the type
/// table. Shared read-mostly by every part of one package and released
/// once the last part has been opened.
pub(crate) struct DecodeTables {
    pub(crate) strings: Vec<Arc<str>>,
    pub(crate) types: Vec<DecodedType>,
}

impl DecodeTables {
    /// Resolve a dense 1-based string index (0 is null and never valid
    /// where a string is required).
    pub(crate) fn lookup(&self, index: u64, offset: usize) -> PackResult<Arc<str>> {
        index
            .checked_sub(1)
            .and_then(|i| self.strings.get(i as usize))
            .cloned()
            .ok_or_else(|| PackError::Corrupt {
                offset,
                reason: format!("string index {index} out of range"),
            })
    }
}

pub(crate) enum Slot {
    Pending,
    Ready(Vec<u8>),
    Failed,
}

pub(crate) struct FillState {
    pub(crate) slots: Vec<Slot>,
    pub(crate) error: Option<Arc<PackError>>,
}

/// State shared between a package's parts and its background decode task.
pub(crate) struct DecodeShared {
    state: Mutex<FillState>,
    filled: Condvar,
    context: Mutex<Option<Arc<DecodeTables>>>,
    remaining: AtomicUsize,
    timeout: Duration,
    addresses: Vec<QualifiedName>,
}

impl DecodeShared {
    pub(crate) fn new(
        addresses: Vec<QualifiedName>,
        timeout: Duration,
    ) -> Self {
        let count = addresses.len();
        Self {
            state: Mutex::new(FillState {
                slots: (0..count).map(|_| Slot::Pending).collect(),
                error: None,
            }),
            filled: Condvar::new(),
            context: Mutex::new(None),
            remaining: AtomicUsize::new(count),
            timeout,
            addresses,
        }
    }

    /// Background success path: publish the decode context and every
    /// part's data slice, then wake all waiters.
    pub(crate) fn complete(&self, tables: DecodeTables, slices: Vec<Vec<u8>>) {
        if !self.addresses.is_empty() {
            let mut context = self.context.lock().expect("decode context poisoned");
            *context = Some(Arc::new(tables));
        }
        let mut state = self.state.lock().expect("decode state poisoned");
        for (slot, data) in state.slots.iter_mut().zip(slices) {
            *slot = Slot::Ready(data);
        }
        drop(state);
        self.filled.notify_all();
    }

    /// Background failure path: capture the error and fill every still
    /// pending slot so no waiter hangs; the error re-surfaces when those
    /// parts are opened.
    pub(crate) fn fail(&self, error: PackError) {
        let mut state = self.state.lock().expect("decode state poisoned");
        state.error = Some(Arc::new(error));
        for slot in &mut state.slots {
            if matches!(slot, Slot::Pending) {
                *slot = Slot::Failed;
            }
        }
        drop(state);
        self.filled.notify_all();
    }
}

struct OpenedPart {
    descriptor: Arc<dyn TypeDescriptor>,
    values: BTreeMap<String, Value>,
}

/// The locally-defined data for one configuration object.
///
/// Created as a placeholder when the package index is read; its raw bytes
/// arrive from the background decode task, and its values materialize on
/// the first [`open`](Self::open). Values absent from a part are inherited
/// through the object's base chain, never duplicated here.
pub struct ObjectPart {
    address: QualifiedName,
    ordinal: usize,
    shared: Arc<DecodeShared>,
    opened: OnceLock<Result<OpenedPart, Arc<PackError>>>,
}

impl ObjectPart {
    pub(crate) fn new(address: QualifiedName, ordinal: usize, shared: Arc<DecodeShared>) -> Self {
        Self {
            address,
            ordinal,
            shared,
            opened: OnceLock::new(),
        }
    }

    pub fn address(&self) -> &QualifiedName {
        &self.address
    }

    pub fn is_open(&self) -> bool {
        matches!(self.opened.get(), Some(Ok(_)))
    }

    /// Block until this part's data is available, then decode it and bind
    /// its type through `binder`.
    ///
    /// Re-opening an already-open part is a no-op; concurrent opens decode
    /// once. A timeout or decode failure is terminal for this part.
    pub fn open(&self, binder: &dyn TypeBinder) -> PackResult<()> {
        let outcome = self.opened.get_or_init(|| {
            let result = self.open_inner(binder);
            // This part's open has completed, successfully or not; when
            // the last part completes, the decode context is released.
            if self.shared.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                let mut context = self.shared.context.lock().expect("decode context poisoned");
                *context = None;
                debug!(package = %self.address.package(), "decode context released");
            }
            result
        });
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(resurface(err)),
        }
    }

    /// The bound type descriptor. `None` until opened.
    pub fn descriptor(&self) -> Option<&Arc<dyn TypeDescriptor>> {
        match self.opened.get() {
            Some(Ok(opened)) => Some(&opened.descriptor),
            _ => None,
        }
    }

    /// A locally-defined property value. `None` when the part is not open
    /// or does not define the property.
    pub fn value(&self, property: &str) -> Option<&Value> {
        match self.opened.get() {
            Some(Ok(opened)) => opened.values.get(property),
            _ => None,
        }
    }

    /// Names of the locally-defined properties. Empty until opened.
    pub fn property_names(&self) -> Vec<&str> {
        match self.opened.get() {
            Some(Ok(opened)) => opened.values.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn open_inner(&self, binder: &dyn TypeBinder) -> Result<OpenedPart, Arc<PackError>> {
        let data = self.wait_for_data()?;
        let tables = {
            let context = self.shared.context.lock().expect("decode context poisoned");
            context.clone().ok_or_else(|| {
                Arc::new(PackError::Internal(
                    "decode context released before open".into(),
                ))
            })?
        };
        decode_record(&data, &tables, &self.shared.addresses, binder).map_err(Arc::new)
    }

    fn wait_for_data(&self) -> Result<Vec<u8>, Arc<PackError>> {
        let deadline = Instant::now() + self.shared.timeout;
        let mut state = self.shared.state.lock().expect("decode state poisoned");
        loop {
            match &mut state.slots[self.ordinal] {
                Slot::Ready(data) => return Ok(std::mem::take(data)),
                Slot::Failed => {
                    return Err(state.error.clone().unwrap_or_else(|| {
                        Arc::new(PackError::Internal("slot failed without error".into()))
                    }));
                }
                Slot::Pending => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Arc::new(PackError::DecodeTimeout {
                    address: self.address.clone(),
                    timeout: self.shared.timeout,
                }));
            }
            let (guard, _timed_out) = self
                .shared
                .filled
                .wait_timeout(state, deadline - now)
                .expect("decode state poisoned");
            state = guard;
        }
    }
}

impl std::fmt::Debug for ObjectPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPart")
            .field("address", &self.address)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Re-surface a stored failure without cloning the uncloneable: timeouts
/// keep their variant, everything else is wrapped as a background failure.
fn resurface(err: &Arc<PackError>) -> PackError {
    match err.as_ref() {
        PackError::DecodeTimeout { address, timeout } => PackError::DecodeTimeout {
            address: address.clone(),
            timeout: *timeout,
        },
        _ => PackError::Background(Arc::clone(err)),
    }
}

fn decode_record(
    data: &[u8],
    tables: &DecodeTables,
    addresses: &[QualifiedName],
    binder: &dyn TypeBinder,
) -> Result<OpenedPart, PackError> {
    let mut cur = Cursor::new(data);

    let type_index = cur.read_varint()? as usize;
    let ty = type_index
        .checked_sub(1)
        .and_then(|i| tables.types.get(i))
        .ok_or_else(|| PackError::Corrupt {
            offset: 0,
            reason: format!("type index {type_index} out of range"),
        })?;
    let descriptor = binder.bind(&ty.name)?;

    let count = cur.read_varint()?;
    let mut values = BTreeMap::new();
    for _ in 0..count {
        let position = cur.read_varint()? as usize;
        let name = ty.properties.get(position).ok_or_else(|| PackError::Corrupt {
            offset: cur.pos(),
            reason: format!("property position {position} out of range"),
        })?;
        let value = decode_value(&mut cur, tables, addresses)?;
        values.insert(name.to_string(), value);
    }
    if cur.remaining() > 0 {
        return Err(PackError::Corrupt {
            offset: cur.pos(),
            reason: "trailing bytes in object record".into(),
        });
    }

    Ok(OpenedPart { descriptor, values })
}

pub(crate) fn decode_value(
    cur: &mut Cursor<'_>,
    tables: &DecodeTables,
    addresses: &[QualifiedName],
) -> PackResult<Value> {
    let tag = cur.read_u8()?;
    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_SCALAR => Ok(Value::Scalar(cur.read_string()?)),
        TAG_EXTERNAL_REF => {
            let at = cur.pos();
            let ns = cur.read_varint()?;
            let name = cur.read_varint()?;
            let package = cur.read_varint()?;
            if ns == 0 && name == 0 && package == 0 {
                return Ok(Value::Reference(ObjectPtr::none()));
            }
            let target = FullName::new(tables.lookup(ns, at)?, tables.lookup(name, at)?)
                .in_package(tables.lookup(package, at)?);
            Ok(Value::Reference(ObjectPtr::to(target)))
        }
        TAG_INTERNAL_REF => {
            let ordinal = cur.read_varint()? as usize;
            if ordinal == 0 {
                return Ok(Value::Reference(ObjectPtr::none()));
            }
            let target = addresses.get(ordinal - 1).ok_or_else(|| PackError::Corrupt {
                offset: cur.pos(),
                reason: format!("object ordinal {ordinal} out of range"),
            })?;
            Ok(Value::Reference(ObjectPtr::to(target.clone())))
        }
        TAG_COLLECTION => {
            let count = cur.read_varint()?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let action = cur.read_u8()?;
                let value = decode_value(cur, tables, addresses)?;
                items.push(match action {
                    ACTION_ADD => DiffItem::add(value),
                    ACTION_REMOVE => DiffItem::remove(value),
                    other => return Err(PackError::UnknownDiffAction(other)),
                });
            }
            Ok(Value::Collection(items))
        }
        other => Err(PackError::InvalidValueTag(other)),
    }
}
