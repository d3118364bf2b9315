// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::state::IntegrityLevel;

pub type ElementsResult<T> = core::result::Result<T, ElementsError>;

/// The kind of language exception a caller should throw for an
/// [`ElementsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    /// Internal failure; not produced by user-visible semantics.
    Error,
    RangeError,
    TypeError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementsError {
    /// A backing store would need more slots than the soft maximum allows.
    OutOfMemory { requested: u64, limit: u64 },
    InvalidLength(u64),
    IndexOutOfRange(u64),
    InvalidRange { start: u64, end: u64, length: u64 },
    FrozenElement(u64),
    LengthNotWritable,
    NotExtensible(u64),
    SealedElement(u64),
    RangeEditNotAllowed(IntegrityLevel),
    /// An in-bounds fast path was used on an index outside the fast range.
    OutOfBoundsFastAccess(u64),
    /// A kind-specific path was used for a write that requires a transition.
    UnsupportedOperation(&'static str),
    InvariantViolation(String),
}

impl ElementsError {
    pub fn exception_type(&self) -> ExceptionType {
        match self {
            Self::OutOfMemory { .. }
            | Self::InvalidLength(_)
            | Self::IndexOutOfRange(_)
            | Self::InvalidRange { .. } => ExceptionType::RangeError,
            Self::FrozenElement(_)
            | Self::LengthNotWritable
            | Self::NotExtensible(_)
            | Self::SealedElement(_)
            | Self::RangeEditNotAllowed(_) => ExceptionType::TypeError,
            Self::OutOfBoundsFastAccess(_)
            | Self::UnsupportedOperation(_)
            | Self::InvariantViolation(_) => ExceptionType::Error,
        }
    }
}

impl core::fmt::Display for ElementsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory { requested, limit } => write!(
                f,
                "Out of memory: requested {requested} elements, limit is {limit}"
            ),
            Self::InvalidLength(length) => write!(f, "Invalid array length {length}"),
            Self::IndexOutOfRange(index) => write!(f, "Array index {index} out of range"),
            Self::InvalidRange { start, end, length } => write!(
                f,
                "Invalid range {start}..{end} for array of length {length}"
            ),
            Self::FrozenElement(index) => {
                write!(f, "Cannot assign to element {index} of a frozen array")
            }
            Self::LengthNotWritable => f.write_str("Cannot assign to read only property 'length'"),
            Self::NotExtensible(index) => {
                write!(f, "Cannot add element {index}, array is not extensible")
            }
            Self::SealedElement(index) => {
                write!(f, "Cannot delete element {index} of a sealed array")
            }
            Self::RangeEditNotAllowed(level) => {
                write!(f, "Cannot insert or remove elements of a {level} array")
            }
            Self::OutOfBoundsFastAccess(index) => {
                write!(f, "Index {index} is outside the in-bounds fast range")
            }
            Self::UnsupportedOperation(operation) => {
                write!(f, "Unsupported operation: {operation}")
            }
            Self::InvariantViolation(message) => {
                write!(f, "Array invariant violated: {message}")
            }
        }
    }
}

impl core::error::Error for ElementsError {}
