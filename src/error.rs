use crate::handle::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Field missing: {0}")]
    FieldMissing(String),

    #[error("Field unreadable: {field} ({reason})")]
    FieldUnreadable { field: String, reason: String },

    #[error("Memory unreadable at {address}")]
    MemoryUnreadable { address: Address },

    #[error("Shape mismatch: shape {shape:?} has {product} elements, object declares {count}")]
    ShapeMismatch {
        shape: Vec<u64>,
        product: u128,
        count: u64,
    },

    #[error("Element count {0} exceeds the sanity ceiling")]
    SanityCeilingExceeded(i128),

    #[error("Invalid option {key}: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Invalid type pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Type summary registration failed: {0}")]
    RegistrationFailed(String),
}

impl Error {
    /// Wraps a failure observed while reading `field` into `FieldUnreadable`,
    /// leaving `FieldMissing` untouched.
    pub(crate) fn in_field(self, field: &str) -> Error {
        match self {
            Error::FieldMissing(_) => self,
            Error::FieldUnreadable { .. } => self,
            other => Error::FieldUnreadable {
                field: field.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
