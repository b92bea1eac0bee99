//! Element kinds a tensor summary knows how to decode.

use crate::handle::ScalarKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Bool,
    Unknown,
}

impl ElementKind {
    /// Maps a c10 `ScalarType` discriminant (the `int8_t` stored in a tensor's
    /// type metadata) to an element kind. Kinds this formatter cannot decode,
    /// such as half precision, complex and quantized types, become `Unknown`.
    pub fn from_scalar_type_code(code: i64) -> Self {
        match code {
            0 => ElementKind::UInt8,
            1 => ElementKind::Int8,
            2 => ElementKind::Int16,
            3 => ElementKind::Int32,
            4 => ElementKind::Int64,
            6 => ElementKind::Float32,
            7 => ElementKind::Float64,
            11 => ElementKind::Bool,
            27 => ElementKind::UInt16,
            28 => ElementKind::UInt32,
            29 => ElementKind::UInt64,
            _ => ElementKind::Unknown,
        }
    }

    /// The c10 `ScalarType` discriminant for this kind, if it has one.
    pub fn scalar_type_code(&self) -> Option<i64> {
        match self {
            ElementKind::UInt8 => Some(0),
            ElementKind::Int8 => Some(1),
            ElementKind::Int16 => Some(2),
            ElementKind::Int32 => Some(3),
            ElementKind::Int64 => Some(4),
            ElementKind::Float32 => Some(6),
            ElementKind::Float64 => Some(7),
            ElementKind::Bool => Some(11),
            ElementKind::UInt16 => Some(27),
            ElementKind::UInt32 => Some(28),
            ElementKind::UInt64 => Some(29),
            ElementKind::Unknown => None,
        }
    }

    /// Width of one element in target memory.
    pub fn size_in_bytes(&self) -> Option<u64> {
        self.scalar_kind().map(|k| k.size_in_bytes())
    }

    /// The read request used to fetch one element, or `None` for `Unknown`.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            ElementKind::Float32 => Some(ScalarKind::F32),
            ElementKind::Float64 => Some(ScalarKind::F64),
            ElementKind::Int8 => Some(ScalarKind::I8),
            ElementKind::Int16 => Some(ScalarKind::I16),
            ElementKind::Int32 => Some(ScalarKind::I32),
            ElementKind::Int64 => Some(ScalarKind::I64),
            ElementKind::UInt8 => Some(ScalarKind::U8),
            ElementKind::UInt16 => Some(ScalarKind::U16),
            ElementKind::UInt32 => Some(ScalarKind::U32),
            ElementKind::UInt64 => Some(ScalarKind::U64),
            ElementKind::Bool => Some(ScalarKind::Bool),
            ElementKind::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ElementKind::Unknown)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementKind::Float32 => write!(f, "float32"),
            ElementKind::Float64 => write!(f, "float64"),
            ElementKind::Int8 => write!(f, "int8"),
            ElementKind::Int16 => write!(f, "int16"),
            ElementKind::Int32 => write!(f, "int32"),
            ElementKind::Int64 => write!(f, "int64"),
            ElementKind::UInt8 => write!(f, "uint8"),
            ElementKind::UInt16 => write!(f, "uint16"),
            ElementKind::UInt32 => write!(f, "uint32"),
            ElementKind::UInt64 => write!(f, "uint64"),
            ElementKind::Bool => write!(f, "bool"),
            ElementKind::Unknown => write!(f, "unknown"),
        }
    }
}
