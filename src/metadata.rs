//! Structural metadata recovered from a tensor object in target memory.
//!
//! Default layout, looked up by field name on the object:
//!
//! | logical field    | names tried                         | read as            |
//! |------------------|-------------------------------------|--------------------|
//! | element count    | `size`, `numel`, `numel_`           | `i64`              |
//! | dimension count  | `ndim`, `dim`                       | `i64`              |
//! | shape            | `shape`, `sizes`                    | inline `[i64; ndim]` |
//! | strides          | `strides`                           | inline `[i64; ndim]` |
//! | storage offset   | `storage_offset`, `storage_offset_` | `i64`              |
//! | element kind     | `dtype`, `scalar_type`, `data_type_`| `i8` c10 ScalarType |
//! | data             | `data`, `data_ptr`                  | pointer            |
//!
//! Only the element count is mandatory. Every other field degrades to a
//! default or to omission when it is absent or unreadable.

use crate::dtype::ElementKind;
use crate::error::Error;
use crate::handle::{Address, ScalarKind, ValueHandle};

/// Element counts above this are treated as a corrupted object.
pub const SANITY_CEILING: u64 = 1_000_000_000_000;
/// Dimension counts above this are treated as a malformed shape.
pub const MAX_NDIM: i64 = 64;

pub const SIZE_FIELDS: &[&str] = &["size", "numel", "numel_"];
pub const NDIM_FIELDS: &[&str] = &["ndim", "dim"];
pub const SHAPE_FIELDS: &[&str] = &["shape", "sizes"];
pub const STRIDE_FIELDS: &[&str] = &["strides"];
pub const OFFSET_FIELDS: &[&str] = &["storage_offset", "storage_offset_"];
pub const DTYPE_FIELDS: &[&str] = &["dtype", "scalar_type", "data_type_"];
pub const DATA_FIELDS: &[&str] = &["data", "data_ptr"];

/// Everything extracted from one tensor object. Each optional piece keeps
/// the reason it could not be read so rendering can decide what to omit.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorMetadata {
    pub element_count: u64,
    pub shape: Result<Vec<u64>, Error>,
    pub element_kind: ElementKind,
    pub data_pointer: Result<Address, Error>,
    pub strides: Result<Vec<i64>, Error>,
    pub storage_offset: Result<i64, Error>,
}

/// How the data is laid out for rendering after shape normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub dims: Vec<u64>,
    /// Whether the shape annotation is trustworthy enough to display.
    pub annotate: bool,
    /// Element strides, one per dim; `Err` when the layout cannot be trusted
    /// for element reads.
    pub strides: Result<Vec<i64>, Error>,
}

/// Reads the tensor's metadata through `handle`.
///
/// Returns `Err` only when the element count cannot be established or is
/// implausible; in that case the object is rendered as unreadable and no
/// further fields are touched.
pub fn extract(handle: &dyn ValueHandle) -> Result<TensorMetadata, Error> {
    let (element_count, shape) = match read_int(handle, SIZE_FIELDS, ScalarKind::I64) {
        Ok(count) => {
            let count = validate_count(count)?;
            (count, read_shape(handle))
        }
        Err(Error::FieldMissing(_field)) => {
            // Without a count field the shape product stands in for it.
            debug_println!("'{}' missing, deriving element count from shape", _field);
            let shape = read_shape(handle)?;
            let count = shape_product(&shape)
                .ok_or(Error::SanityCeilingExceeded(i128::MAX))
                .and_then(|p| validate_count(p as i128))?;
            (count, Ok(shape))
        }
        Err(e) => return Err(e),
    };

    let element_kind = match read_int(handle, DTYPE_FIELDS, ScalarKind::I8) {
        Ok(code) => i64::try_from(code)
            .map(ElementKind::from_scalar_type_code)
            .unwrap_or(ElementKind::Unknown),
        Err(_e) => {
            debug_println!("element kind unavailable: {}", _e);
            ElementKind::Unknown
        }
    };

    let data_pointer = read_pointer(handle, DATA_FIELDS);
    let strides = match &shape {
        Ok(dims) => read_dim_array(handle, STRIDE_FIELDS, dims.len()),
        Err(e) => Err(e.clone()),
    };
    let storage_offset = read_int(handle, OFFSET_FIELDS, ScalarKind::I64).and_then(|v| {
        i64::try_from(v).map_err(|_| Error::FieldUnreadable {
            field: OFFSET_FIELDS[0].to_string(),
            reason: format!("offset {} out of range", v),
        })
    });

    Ok(TensorMetadata {
        element_count,
        shape,
        element_kind,
        data_pointer,
        strides,
        storage_offset,
    })
}

impl TensorMetadata {
    /// Reconciles the declared shape with the element count.
    ///
    /// A missing shape becomes a 1-D shape of `element_count` and is still
    /// annotated. A shape that is unreadable, malformed or disagrees with the
    /// count is dropped in favour of a flat, unannotated rendering.
    pub fn layout(&self) -> Layout {
        match &self.shape {
            Ok(dims) if shape_product(dims) == Some(self.element_count as u128) => {
                let strides = match &self.strides {
                    Ok(s) if s.len() == dims.len() => Ok(s.clone()),
                    Ok(s) => Err(Error::FieldUnreadable {
                        field: STRIDE_FIELDS[0].to_string(),
                        reason: format!("{} strides for {} dims", s.len(), dims.len()),
                    }),
                    Err(Error::FieldMissing(_)) => Ok(contiguous_strides(dims)),
                    Err(e) => Err(e.clone()),
                };
                Layout {
                    dims: dims.clone(),
                    annotate: true,
                    strides,
                }
            }
            Ok(dims) => {
                debug_println!(
                    "{}",
                    Error::ShapeMismatch {
                        shape: dims.clone(),
                        product: shape_product(dims).unwrap_or(u128::MAX),
                        count: self.element_count,
                    }
                );
                self.flat_layout(false)
            }
            Err(Error::FieldMissing(_)) => self.flat_layout(true),
            Err(_e) => {
                debug_println!("shape dropped: {}", _e);
                self.flat_layout(false)
            }
        }
    }

    fn flat_layout(&self, annotate: bool) -> Layout {
        Layout {
            dims: vec![self.element_count],
            annotate,
            strides: Ok(vec![1]),
        }
    }
}

fn validate_count(count: i128) -> Result<u64, Error> {
    if count < 0 || count > SANITY_CEILING as i128 {
        debug_println!("element count {} is implausible", count);
        return Err(Error::SanityCeilingExceeded(count));
    }
    Ok(count as u64)
}

/// Product of the dims, `None` on overflow.
pub fn shape_product(dims: &[u64]) -> Option<u128> {
    dims.iter()
        .try_fold(1u128, |acc, &d| acc.checked_mul(d as u128))
}

/// Row-major strides, in elements, for `dims`.
pub fn contiguous_strides(dims: &[u64]) -> Vec<i64> {
    let mut strides = vec![1i64; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1].saturating_mul(dims[i + 1].min(i64::MAX as u64) as i64);
    }
    strides
}

/// Finds the first of `names` present on `handle`.
fn lookup<'h>(
    handle: &'h dyn ValueHandle,
    names: &[&'static str],
) -> Result<(&'static str, Box<dyn ValueHandle + 'h>), Error> {
    for &name in names {
        match handle.field(name) {
            Ok(field) => return Ok((name, field)),
            Err(Error::FieldMissing(_)) => continue,
            Err(e) => return Err(e.in_field(name)),
        }
    }
    Err(Error::FieldMissing(names[0].to_string()))
}

fn read_int(handle: &dyn ValueHandle, names: &[&'static str], kind: ScalarKind) -> Result<i128, Error> {
    let (name, field) = lookup(handle, names)?;
    let value = field.read_self(kind).map_err(|e| e.in_field(name))?;
    value.as_i128().ok_or_else(|| Error::FieldUnreadable {
        field: name.to_string(),
        reason: format!("expected an integer, read {:?}", value),
    })
}

fn read_pointer(handle: &dyn ValueHandle, names: &[&'static str]) -> Result<Address, Error> {
    let (name, field) = lookup(handle, names)?;
    let value = field
        .read_self(ScalarKind::Pointer)
        .map_err(|e| e.in_field(name))?;
    value.as_address().ok_or_else(|| Error::FieldUnreadable {
        field: name.to_string(),
        reason: format!("expected a pointer, read {:?}", value),
    })
}

fn read_shape(handle: &dyn ValueHandle) -> Result<Vec<u64>, Error> {
    // Probe the shape field first so a layout without one reads as missing
    // rather than as a shape of unknown rank.
    lookup(handle, SHAPE_FIELDS)?;
    let ndim = read_int(handle, NDIM_FIELDS, ScalarKind::I64).map_err(|e| Error::FieldUnreadable {
        field: SHAPE_FIELDS[0].to_string(),
        reason: format!("dimension count unavailable: {}", e),
    })?;
    if ndim < 0 || ndim > MAX_NDIM as i128 {
        return Err(Error::FieldUnreadable {
            field: NDIM_FIELDS[0].to_string(),
            reason: format!("{} dimensions", ndim),
        });
    }
    read_dim_array(handle, SHAPE_FIELDS, ndim as usize)?
        .into_iter()
        .map(|d| {
            u64::try_from(d).map_err(|_| Error::FieldUnreadable {
                field: SHAPE_FIELDS[0].to_string(),
                reason: format!("negative dimension {}", d),
            })
        })
        .collect()
}

/// Reads `len` consecutive `i64`s starting at the field's own address.
fn read_dim_array(handle: &dyn ValueHandle, names: &[&'static str], len: usize) -> Result<Vec<i64>, Error> {
    let (name, field) = lookup(handle, names)?;
    let base = field.address().map_err(|e| e.in_field(name))?;
    let width = ScalarKind::I64.size_in_bytes() as i128;
    (0..len)
        .map(|i| {
            let address = base
                .offset(i as i128 * width)
                .ok_or(Error::MemoryUnreadable { address: base })?;
            let value = field
                .read_scalar(ScalarKind::I64, address)
                .map_err(|e| e.in_field(name))?;
            value
                .as_i128()
                .and_then(|v| i64::try_from(v).ok())
                .ok_or_else(|| Error::FieldUnreadable {
                    field: name.to_string(),
                    reason: format!("entry {} is not an integer", i),
                })
        })
        .collect()
}
