//! Synthetic tensor objects for exercising the formatter without a debugger.
//!
//! [`SyntheticTensor`] lays a tensor object out in [`MockMemory`] using the
//! default field layout from [`crate::metadata`], and hands back a
//! [`MockValue`] that implements [`ValueHandle`]. Every field lookup and
//! scalar read is counted so tests can assert how much work a render did.

use crate::dtype::ElementKind;
use crate::error::Error;
use crate::handle::{Address, Scalar, ScalarKind, ValueHandle};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const OBJECT_BASE: Address = Address(0x1000);
pub const SHAPE_BASE: Address = Address(0x2000);
pub const STRIDES_BASE: Address = Address(0x3000);
pub const DATA_BASE: Address = Address(0x10_0000);
/// Nothing is ever mapped here.
pub const UNMAPPED: Address = Address(0xdead_0000);

const SIZE_OFFSET: i128 = 0;
const NDIM_OFFSET: i128 = 8;
const DTYPE_OFFSET: i128 = 16;
const STORAGE_OFFSET_OFFSET: i128 = 24;
const DATA_OFFSET: i128 = 32;
const OBJECT_LEN: usize = 40;

/// Sparse little-endian memory made of mapped regions.
#[derive(Debug, Default, Clone)]
pub struct MockMemory {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, base: Address, bytes: Vec<u8>) {
        self.regions.insert(base.0, bytes);
    }

    /// The `len` bytes at `address`, if all of them are mapped in one region.
    pub fn read(&self, address: Address, len: u64) -> Option<&[u8]> {
        let (&start, bytes) = self.regions.range(..=address.0).next_back()?;
        let begin = usize::try_from(address.0 - start).ok()?;
        let end = begin.checked_add(usize::try_from(len).ok()?)?;
        bytes.get(begin..end)
    }
}

/// A value in [`MockMemory`] with named children.
#[derive(Debug, Clone)]
pub struct MockValue {
    name: String,
    memory: Arc<MockMemory>,
    address: Option<Address>,
    fields: BTreeMap<String, MockValue>,
    reads: Arc<AtomicUsize>,
}

impl MockValue {
    pub fn new(name: &str, memory: Arc<MockMemory>, address: Option<Address>) -> Self {
        Self {
            name: name.to_string(),
            memory,
            address,
            fields: BTreeMap::new(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds a child that shares this value's memory and read counter.
    pub fn with_field(mut self, name: &str, address: Option<Address>) -> Self {
        let child = MockValue {
            name: name.to_string(),
            memory: Arc::clone(&self.memory),
            address,
            fields: BTreeMap::new(),
            reads: Arc::clone(&self.reads),
        };
        self.fields.insert(name.to_string(), child);
        self
    }

    /// Field lookups plus scalar reads performed through this value and its
    /// children.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset_reads(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }

    pub fn as_handle(&self) -> Option<&dyn ValueHandle> {
        Some(self as &dyn ValueHandle)
    }
}

impl ValueHandle for MockValue {
    fn field(&self, name: &str) -> Result<Box<dyn ValueHandle + '_>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.fields.get(name) {
            Some(field) => Ok(Box::new(field)),
            None => Err(Error::FieldMissing(name.to_string())),
        }
    }

    fn read_scalar(&self, kind: ScalarKind, address: Address) -> Result<Scalar, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.memory
            .read(address, kind.size_in_bytes())
            .and_then(|bytes| kind.decode_le(bytes))
            .ok_or(Error::MemoryUnreadable { address })
    }

    fn address(&self) -> Result<Address, Error> {
        self.address.ok_or_else(|| Error::FieldUnreadable {
            field: self.name.clone(),
            reason: "value has no load address".to_string(),
        })
    }
}

/// How one field of a synthetic tensor is presented.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec<T> {
    Value(T),
    /// The object layout has no such field.
    Missing,
    /// The field exists but its memory cannot be read.
    Unreadable,
}

impl<T> FieldSpec<T> {
    fn value(&self) -> Option<&T> {
        match self {
            FieldSpec::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Builder for a tensor object laid out in mock memory.
#[derive(Debug, Clone)]
pub struct SyntheticTensor {
    size: FieldSpec<i64>,
    ndim: FieldSpec<i64>,
    shape: FieldSpec<Vec<i64>>,
    strides: FieldSpec<Vec<i64>>,
    storage_offset: FieldSpec<i64>,
    dtype: FieldSpec<i64>,
    data: FieldSpec<Address>,
    buffer: Vec<u8>,
}

impl Default for SyntheticTensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticTensor {
    /// An object with no fields at all.
    pub fn new() -> Self {
        Self {
            size: FieldSpec::Missing,
            ndim: FieldSpec::Missing,
            shape: FieldSpec::Missing,
            strides: FieldSpec::Missing,
            storage_offset: FieldSpec::Missing,
            dtype: FieldSpec::Missing,
            data: FieldSpec::Missing,
            buffer: Vec::new(),
        }
    }

    /// A contiguous float32 tensor holding `values` with `shape`.
    pub fn float32(values: &[f32], shape: &[i64]) -> Self {
        Self::new()
            .size(values.len() as i64)
            .shape(shape)
            .dtype(ElementKind::Float32)
            .data_f32(values)
    }

    pub fn size(mut self, count: i64) -> Self {
        self.size = FieldSpec::Value(count);
        self
    }

    /// Sets the shape and the matching dimension count.
    pub fn shape(mut self, dims: &[i64]) -> Self {
        self.shape = FieldSpec::Value(dims.to_vec());
        self.ndim = FieldSpec::Value(dims.len() as i64);
        self
    }

    /// Overrides the dimension count independently of the shape.
    pub fn ndim(mut self, ndim: i64) -> Self {
        self.ndim = FieldSpec::Value(ndim);
        self
    }

    pub fn strides(mut self, strides: &[i64]) -> Self {
        self.strides = FieldSpec::Value(strides.to_vec());
        self
    }

    pub fn storage_offset(mut self, offset: i64) -> Self {
        self.storage_offset = FieldSpec::Value(offset);
        self
    }

    pub fn dtype(mut self, kind: ElementKind) -> Self {
        self.dtype = match kind.scalar_type_code() {
            Some(code) => FieldSpec::Value(code),
            // 5 is half precision, which the formatter cannot decode
            None => FieldSpec::Value(5),
        };
        self
    }

    pub fn dtype_code(mut self, code: i64) -> Self {
        self.dtype = FieldSpec::Value(code);
        self
    }

    /// Places `bytes` in the data buffer and points `data` at it.
    pub fn data_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.buffer = bytes;
        self.data = FieldSpec::Value(DATA_BASE);
        self
    }

    pub fn data_f32(self, values: &[f32]) -> Self {
        self.data_bytes(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    pub fn data_f64(self, values: &[f64]) -> Self {
        self.data_bytes(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    pub fn data_i32(self, values: &[i32]) -> Self {
        self.data_bytes(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    pub fn data_i64(self, values: &[i64]) -> Self {
        self.data_bytes(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    pub fn data_u8(self, values: &[u8]) -> Self {
        self.data_bytes(values.to_vec())
    }

    pub fn data_bool(self, values: &[bool]) -> Self {
        self.data_bytes(values.iter().map(|&b| b as u8).collect())
    }

    /// `data` holds a null pointer.
    pub fn null_data(mut self) -> Self {
        self.data = FieldSpec::Value(Address::NULL);
        self
    }

    /// `data` holds a pointer into unmapped memory.
    pub fn dangling_data(mut self) -> Self {
        self.data = FieldSpec::Value(UNMAPPED);
        self
    }

    /// Removes a field from the layout. Names: `size`, `ndim`, `shape`,
    /// `strides`, `storage_offset`, `dtype`, `data`.
    pub fn missing(mut self, field: &str) -> Self {
        self.set_spec(field, Spec::Missing);
        self
    }

    /// Keeps a field in the layout but makes its memory unreadable.
    pub fn unreadable(mut self, field: &str) -> Self {
        self.set_spec(field, Spec::Unreadable);
        self
    }

    fn set_spec(&mut self, field: &str, spec: Spec) {
        fn apply<T>(slot: &mut FieldSpec<T>, spec: Spec) {
            *slot = match spec {
                Spec::Missing => FieldSpec::Missing,
                Spec::Unreadable => FieldSpec::Unreadable,
            };
        }
        match field {
            "size" => apply(&mut self.size, spec),
            "ndim" => apply(&mut self.ndim, spec),
            "shape" => apply(&mut self.shape, spec),
            "strides" => apply(&mut self.strides, spec),
            "storage_offset" => apply(&mut self.storage_offset, spec),
            "dtype" => apply(&mut self.dtype, spec),
            "data" => apply(&mut self.data, spec),
            other => panic!("SyntheticTensor has no field named '{}'", other),
        }
    }

    /// Lays the object out in fresh memory and returns a handle to it.
    pub fn build(&self) -> MockValue {
        let mut object = vec![0u8; OBJECT_LEN];
        let mut put = |offset: i128, bytes: &[u8]| {
            let start = offset as usize;
            object[start..start + bytes.len()].copy_from_slice(bytes);
        };
        if let Some(v) = self.size.value() {
            put(SIZE_OFFSET, &v.to_le_bytes());
        }
        if let Some(v) = self.ndim.value() {
            put(NDIM_OFFSET, &v.to_le_bytes());
        }
        if let Some(v) = self.dtype.value() {
            put(DTYPE_OFFSET, &(*v as i8).to_le_bytes());
        }
        if let Some(v) = self.storage_offset.value() {
            put(STORAGE_OFFSET_OFFSET, &v.to_le_bytes());
        }
        if let Some(v) = self.data.value() {
            put(DATA_OFFSET, &v.0.to_le_bytes());
        }

        let mut memory = MockMemory::new();
        memory.map(OBJECT_BASE, object);
        if let Some(dims) = self.shape.value() {
            memory.map(SHAPE_BASE, dims.iter().flat_map(|d| d.to_le_bytes()).collect());
        }
        if let Some(strides) = self.strides.value() {
            memory.map(STRIDES_BASE, strides.iter().flat_map(|s| s.to_le_bytes()).collect());
        }
        if !self.buffer.is_empty() {
            memory.map(DATA_BASE, self.buffer.clone());
        }

        let field_address = |base: Address, offset: i128| base.offset(offset);
        let mut value = MockValue::new("tensor", Arc::new(memory), Some(OBJECT_BASE));
        let layout = [
            ("size", spec_kind(&self.size), field_address(OBJECT_BASE, SIZE_OFFSET)),
            ("ndim", spec_kind(&self.ndim), field_address(OBJECT_BASE, NDIM_OFFSET)),
            ("shape", spec_kind(&self.shape), Some(SHAPE_BASE)),
            ("strides", spec_kind(&self.strides), Some(STRIDES_BASE)),
            (
                "storage_offset",
                spec_kind(&self.storage_offset),
                field_address(OBJECT_BASE, STORAGE_OFFSET_OFFSET),
            ),
            ("dtype", spec_kind(&self.dtype), field_address(OBJECT_BASE, DTYPE_OFFSET)),
            ("data", spec_kind(&self.data), field_address(OBJECT_BASE, DATA_OFFSET)),
        ];
        for (name, spec, address) in layout {
            value = match spec {
                Some(Spec::Missing) => value,
                Some(Spec::Unreadable) => value.with_field(name, Some(UNMAPPED)),
                None => value.with_field(name, address),
            };
        }
        value
    }
}

#[derive(Debug, Clone, Copy)]
enum Spec {
    Missing,
    Unreadable,
}

/// `None` for a present, readable field.
fn spec_kind<T>(spec: &FieldSpec<T>) -> Option<Spec> {
    match spec {
        FieldSpec::Value(_) => None,
        FieldSpec::Missing => Some(Spec::Missing),
        FieldSpec::Unreadable => Some(Spec::Unreadable),
    }
}
