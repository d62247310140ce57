// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::kind::ElementKind;

use std::error::Error;
use std::fmt;

/// An error produced by array, view, matrix or histogram operations.
///
/// Errors carry enough context (indices, lengths, kinds) to be diagnosed from
/// the `Display` output alone, without allocation.
#[derive(Clone, PartialEq)]
pub struct ArrayError
{
    repr: Repr,
}

/// Error category of an [`ArrayError`].
///
/// This enumeration is not exhaustive.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind
{
    /// an index or index range outside `0..length`
    IndexOutOfBounds,
    /// a malformed argument (negative count, bad dimension, unknown mode, ...)
    InvalidArgument,
    /// source arrays of a view do not have equal lengths, or a matrix shape
    /// does not match its backing array
    SizeMismatch,
    /// a bulk transfer buffer of the wrong element kind
    ArrayStore,
    /// a write through an immutable array or view
    UnallowedMutation,
    /// a counter or length that cannot grow further
    Overflow,
    /// removing a value from an empty histogram bar
    UnderflowDisbalance,
    /// an element kind outside the registry
    UnsupportedElementKind,
    /// a long-running operation cancelled through its context handle
    Cancelled,
}

#[derive(Clone, PartialEq)]
enum Repr
{
    IndexOutOfBounds { index: i64, len: u64 },
    RangeOutOfBounds { from: i64, to: i64, len: u64 },
    InvalidArgument { what: &'static str },
    SizeMismatch { expected: u64, actual: u64 },
    ArrayStore { expected: ElementKind, actual: ElementKind },
    UnallowedMutation,
    Overflow,
    UnderflowDisbalance { value: u64 },
    UnsupportedElementKind,
    Cancelled,
}

impl ArrayError
{
    /// Return the [`ErrorKind`] of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind
    {
        match self.repr {
            Repr::IndexOutOfBounds { .. } | Repr::RangeOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            Repr::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Repr::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Repr::ArrayStore { .. } => ErrorKind::ArrayStore,
            Repr::UnallowedMutation => ErrorKind::UnallowedMutation,
            Repr::Overflow => ErrorKind::Overflow,
            Repr::UnderflowDisbalance { .. } => ErrorKind::UnderflowDisbalance,
            Repr::UnsupportedElementKind => ErrorKind::UnsupportedElementKind,
            Repr::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn index_out_of_bounds(index: i64, len: u64) -> Self
    {
        ArrayError { repr: Repr::IndexOutOfBounds { index, len } }
    }

    pub(crate) fn range_out_of_bounds(from: i64, to: i64, len: u64) -> Self
    {
        ArrayError { repr: Repr::RangeOutOfBounds { from, to, len } }
    }

    pub(crate) fn invalid_argument(what: &'static str) -> Self
    {
        ArrayError { repr: Repr::InvalidArgument { what } }
    }

    pub(crate) fn size_mismatch(expected: u64, actual: u64) -> Self
    {
        ArrayError { repr: Repr::SizeMismatch { expected, actual } }
    }

    pub(crate) fn array_store(expected: ElementKind, actual: ElementKind) -> Self
    {
        ArrayError { repr: Repr::ArrayStore { expected, actual } }
    }

    pub(crate) fn unallowed_mutation() -> Self
    {
        ArrayError { repr: Repr::UnallowedMutation }
    }

    pub(crate) fn overflow() -> Self
    {
        ArrayError { repr: Repr::Overflow }
    }

    pub(crate) fn underflow_disbalance(value: u64) -> Self
    {
        ArrayError { repr: Repr::UnderflowDisbalance { value } }
    }

    pub(crate) fn unsupported_element_kind() -> Self
    {
        ArrayError { repr: Repr::UnsupportedElementKind }
    }

    pub(crate) fn cancelled() -> Self
    {
        ArrayError { repr: Repr::Cancelled }
    }
}

impl Error for ArrayError {}

impl fmt::Display for ArrayError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "ArrayError/{:?}: ", self.kind())?;
        match self.repr {
            Repr::IndexOutOfBounds { index, len } => {
                write!(f, "index {} outside 0..{}", index, len)
            }
            Repr::RangeOutOfBounds { from, to, len } => {
                write!(f, "range {}..{} outside 0..{}", from, to, len)
            }
            Repr::InvalidArgument { what } => write!(f, "{}", what),
            Repr::SizeMismatch { expected, actual } => {
                write!(f, "mismatched lengths; expected: {}, but got: {}", expected, actual)
            }
            Repr::ArrayStore { expected, actual } => {
                write!(f, "mismatched buffer kind; expected: {:?}, but got: {:?}", expected, actual)
            }
            Repr::UnallowedMutation => write!(f, "array is immutable"),
            Repr::Overflow => write!(f, "counter overflow"),
            Repr::UnderflowDisbalance { value } => {
                write!(f, "excluding value {} from an empty bar", value)
            }
            Repr::UnsupportedElementKind => write!(f, "element kind outside the registry"),
            Repr::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl fmt::Debug for ArrayError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, ArrayError>;

#[test]
fn test_display()
{
    assert_eq!(
        ArrayError::index_out_of_bounds(7, 5).to_string(),
        "ArrayError/IndexOutOfBounds: index 7 outside 0..5"
    );
    assert_eq!(
        ArrayError::size_mismatch(10, 12).to_string(),
        "ArrayError/SizeMismatch: mismatched lengths; expected: 10, but got: 12"
    );
    assert_eq!(ArrayError::unallowed_mutation().kind(), ErrorKind::UnallowedMutation);
}

#[test]
fn test_sizes()
{
    use std::mem::size_of;
    assert!(size_of::<ArrayError>() <= 40);
}
