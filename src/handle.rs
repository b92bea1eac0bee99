//! Introspection interface onto a value living in the inspected process.
//!
//! The host debugger owns the memory-reading primitives; this module only
//! describes the capabilities the formatter consumes. Every method is
//! fallible because the target may be paged out, half constructed or simply
//! not the layout we expect.

use crate::error::Error;
use std::fmt;

/// An address in the inspected process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Address {
    pub const NULL: Address = Address(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Byte offset from this address. `None` on overflow or underflow.
    pub fn offset(&self, bytes: i128) -> Option<Address> {
        let target = (self.0 as i128).checked_add(bytes)?;
        u64::try_from(target).ok().map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// What to read at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// A target pointer (64-bit).
    Pointer,
}

impl ScalarKind {
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            ScalarKind::Bool | ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 | ScalarKind::Pointer => 8,
        }
    }

    /// Decodes a little-endian byte slice of exactly `size_in_bytes()` bytes.
    pub fn decode_le(&self, bytes: &[u8]) -> Option<Scalar> {
        if bytes.len() as u64 != self.size_in_bytes() {
            return None;
        }
        let scalar = match self {
            ScalarKind::Bool => Scalar::Bool(bytes[0] != 0),
            ScalarKind::I8 => Scalar::Int(bytes[0] as i8 as i64),
            ScalarKind::I16 => Scalar::Int(i16::from_le_bytes(bytes.try_into().ok()?) as i64),
            ScalarKind::I32 => Scalar::Int(i32::from_le_bytes(bytes.try_into().ok()?) as i64),
            ScalarKind::I64 => Scalar::Int(i64::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::U8 => Scalar::UInt(bytes[0] as u64),
            ScalarKind::U16 => Scalar::UInt(u16::from_le_bytes(bytes.try_into().ok()?) as u64),
            ScalarKind::U32 => Scalar::UInt(u32::from_le_bytes(bytes.try_into().ok()?) as u64),
            ScalarKind::U64 => Scalar::UInt(u64::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::F32 => Scalar::Float(f32::from_le_bytes(bytes.try_into().ok()?) as f64),
            ScalarKind::F64 => Scalar::Float(f64::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::Pointer => {
                Scalar::Pointer(Address(u64::from_le_bytes(bytes.try_into().ok()?)))
            }
        };
        Some(scalar)
    }
}

/// A value read out of target memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Pointer(Address),
}

impl Scalar {
    /// Integer view of the scalar; floats and pointers have none.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::Bool(b) => Some(b as i128),
            Scalar::Int(v) => Some(v as i128),
            Scalar::UInt(v) => Some(v as i128),
            Scalar::Float(_) | Scalar::Pointer(_) => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match *self {
            Scalar::Pointer(a) => Some(a),
            Scalar::UInt(v) => Some(Address(v)),
            Scalar::Int(v) => u64::try_from(v).ok().map(Address),
            _ => None,
        }
    }
}

/// Read-only capability over one value in the inspected process.
///
/// Implementations wrap the host debugger's value object (for LLDB, an
/// `SBValue`). A handle is only valid for the duration of one formatter call
/// and must not be retained.
pub trait ValueHandle {
    /// Looks up a named member. Absent members yield `Error::FieldMissing`.
    fn field(&self, name: &str) -> Result<Box<dyn ValueHandle + '_>, Error>;

    /// Reads one scalar of `kind` at `address` in the inspected process.
    fn read_scalar(&self, kind: ScalarKind, address: Address) -> Result<Scalar, Error>;

    /// Load address of this value.
    fn address(&self) -> Result<Address, Error>;

    /// Reads this value itself as a scalar of `kind`.
    fn read_self(&self, kind: ScalarKind) -> Result<Scalar, Error> {
        let address = self.address()?;
        self.read_scalar(kind, address)
    }
}

impl<T: ValueHandle + ?Sized> ValueHandle for &T {
    fn field(&self, name: &str) -> Result<Box<dyn ValueHandle + '_>, Error> {
        (**self).field(name)
    }

    fn read_scalar(&self, kind: ScalarKind, address: Address) -> Result<Scalar, Error> {
        (**self).read_scalar(kind, address)
    }

    fn address(&self) -> Result<Address, Error> {
        (**self).address()
    }
}
