// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `lazyarray` crate provides lazy, composable virtual arrays of
//! primitive numeric elements, n-dimensional matrices over them, and summing
//! histograms.
//!
//! - [`Array`], [`UpdatableArray`], [`MutableArray`]:
//!   typed 1-D sequences with uniform scalar and bulk access, used through
//!   the shared handles [`ArrRef`], [`UpdRef`] and [`MutRef`].
//! - [`as_func_array`], [`as_coord_func_matrix`], [`as_updatable_func_array`]:
//!   views that compute elements on demand from a [`Func`] over source
//!   arrays, picked from a matrix of per-kind specializations (lookup
//!   tables, linear kernels, min/max reductions, differences).
//! - [`Matrix`]: n-dimensional shapes with tiled layouts and sub-matrix
//!   views continued by [`ContinuationMode`].
//! - [`SummingHistogram`]: incremental insert/remove with O(1)-amortized
//!   rank/value walks over a multi-level bar pyramid, and one-shot integral
//!   functions over plain bar slices.
//!
//! ## Highlights
//!
//! - Eight element kinds ([`ElementKind`]), with saturating or wrapping
//!   narrowing selected per view; bit arrays are stored packed, 64 per word.
//! - Views are cheap handles sharing their sources; nothing is computed or
//!   copied before an element is read.
//! - Bulk reads (`get_data`) run through pooled scratch buffers and
//!   specialized chunk kernels, bit-exact with the scalar getters.
//! - Writing through an updatable function view propagates back into the
//!   source arrays, with per-input clamping and long-precision policies.
//! - Copy-on-next-write arrays duplicate their storage at the first
//!   mutation; until then they share it.
//!
//! All fallible operations return [`ArrayError`] values; expected misuse
//! never panics. Long-running bulk operations poll a [`Context`] for
//! cancellation between chunks.

mod array;
mod context;
mod error;
mod func;
mod histogram;
mod kind;
mod matrix;
mod pool;

pub use crate::array::{
    copy_array, ArrRef, Array, ArrayFlags, BitMemArray, DataDst, DataSrc, MemArray, MutRef,
    MutableArray, ShiftedArray, SimpleMemoryModel, SubArray, SubArrayUpd, UpdRef, UpdatableArray,
};
pub use crate::context::{Context, NoContext};
pub use crate::error::{ArrayError, ErrorKind, Result};
pub use crate::func::{
    as_coord_func_matrix, as_func_array, as_updatable_func_array, n_copies, CoordFunc, FnFunc,
    Func, LinearFunc, MathFunc, UpdFunc, UpdatableMathFunc,
};
pub use crate::histogram::{
    integral_between_ranks, integral_between_values, precise_integral_between_ranks,
    precise_integral_between_values, CountOfValues, SummingHistogram,
};
pub use crate::kind::{
    BitK, ByteK, CharK, DoubleK, ElementKind, FloatK, IntK, Kind, LongK, Prim, ShortK,
};
pub use crate::matrix::{ContinuationMode, Matrix, TiledArray};

use std::sync::Arc;

/// Rotate an array circularly: element `i` of the result reads
/// `array[(i - shift) mod len]`.
pub fn as_shifted(array: &ArrRef, shift: i64) -> ArrRef
{
    Arc::new(ShiftedArray::new(array.clone_ref(), shift))
}
