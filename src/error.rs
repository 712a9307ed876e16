//! Error types for decoding and validating protobuf messages.

use alloc::vec::Vec;
use core::fmt;

use crate::WireType;

/// Errors of the wire decoder and path navigator.
///
/// These are returned on the first problem found. Nothing is decoded
/// partially.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The field tag could not be decoded or holds an invalid field number.
    #[error(transparent)]
    MalformedTag(TagError),

    /// A varint did not terminate within 10 bytes.
    #[error("integer overflow")]
    IntegerOverflow,

    /// The data ended in the middle of a value.
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,

    /// Not enough bytes left for a fixed width value.
    #[error("need {needed} bytes but only {remaining} remain")]
    TooShort { needed: usize, remaining: usize },

    /// A length prefix that cannot be represented as a slice length.
    #[error("negative length found during unmarshaling: {0}")]
    NegativeLength(u64),

    /// Wire types 6 and 7 are not defined.
    #[error("illegal wire type {0}")]
    UnknownWireType(u8),

    /// A numeric decode was requested for a length-prefixed value or group marker.
    #[error("wire type {0:?} does not hold a number")]
    NotScalar(WireType),

    /// The value has a different encoding than the caller asked for.
    #[error("expected wire type {expected:?}, found {found:?}")]
    UnexpectedWireType { expected: WireType, found: WireType },

    /// The field number does not occur in the scanned bytes.
    #[error("field {0} not found")]
    FieldNotFound(u32),

    /// None of the candidate field numbers occur in the scanned bytes.
    #[error("none of the fields {0:?} found")]
    NoneFound(Vec<u32>),

    /// A path needs at least one field number.
    #[error("empty path")]
    EmptyPath,
}

/// Why a field tag is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// Field number 0 or above [`MAX_FIELD_NUMBER`](crate::MAX_FIELD_NUMBER).
    #[error("illegal tag {field_number} (wire type {wire_type})")]
    FieldNumber { field_number: u64, wire_type: u8 },

    /// The tag varint did not terminate within 10 bytes.
    #[error("illegal tag: varint overflow")]
    Overflow,
}

/// Protocol violations found by the occupancy bookkeeping of a [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A non-repeated field was read more than once.
    #[error("field {0} accessed more than once")]
    DuplicateAccess(u32),

    /// A field was read both as a single value and as a repeated one.
    #[error("field {0} accessed as both single and repeated")]
    MixedAccess(u32),

    /// A field read as a single value occurs several times on the wire.
    #[error("field {field_number} read once but found {count} times")]
    DuplicateField { field_number: u32, count: usize },

    /// Iteration over a repeated field was started but never finished.
    #[error("repeated field {0} was never closed")]
    UnfinishedRepeats(u32),
}

/// Any error recorded by a [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// More than one error, in the order they were recorded.
    #[error("{}", DisplayList(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    /// Folds a list of errors into nothing, the only error or [`Error::Multiple`].
    pub(crate) fn resolve(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Error::Multiple(errors)),
        }
    }

    /// All individual errors. A single error yields itself.
    pub fn causes(&self) -> &[Error] {
        match self {
            Error::Multiple(errors) => errors,
            other => core::slice::from_ref(other),
        }
    }
}

struct DisplayList<'a>(&'a [Error]);

impl fmt::Display for DisplayList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{i}: {err}")?;
        }
        Ok(())
    }
}
