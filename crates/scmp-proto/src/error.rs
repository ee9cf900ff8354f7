//! Error types for wire encoding and decoding.

use thiserror::Error;

/// Errors produced while encoding or decoding wire structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Unexpected end of buffer: needed {needed} more bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Trailing data: {0} bytes left after decoding")]
    TrailingData(usize),

    #[error("Malformed message: expected type {expected}, got {actual}")]
    MalformedMessage { expected: u16, actual: u16 },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(u16),

    #[error("Field {field} too long: {len} bytes, max {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl WireError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        WireError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for wire operations.
pub type WireResult<T> = Result<T, WireError>;
