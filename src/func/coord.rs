// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Coordinate-function matrices: element `i` is `f(coords(i))` where the
//! linear index decodes into row-major coordinates.

use std::any::Any;
use std::sync::Arc;

use crate::array::{check_index, ArrRef, Array, ArrayFlags, DataDst};
use crate::error::{ArrayError, Result};
use crate::kind::{
    BitK, ByteK, CharK, DoubleK, ElementKind, FloatK, IntK, Kind, LongK, Prim, ShortK,
};
use crate::matrix::{ContinuationMode, Matrix};

use super::compose::{conversion_view, for_kind};
use super::views::{checked_out, view_flags};
use super::Func;

/// A function of an n-dimensional coordinate vector.
#[derive(Clone)]
pub enum CoordFunc
{
    /// Any mathematical function; the arguments are the coordinates.
    Math(Func),
    /// An interpolation that returns the matrix elements at integer
    /// coordinates, continued outside by `continuation`.
    Interpolation
    {
        matrix: Matrix,
        continuation: ContinuationMode,
    },
}

/// Build a matrix whose element at coordinates `c` is `f(c)`.
///
/// An interpolation over a matrix of the requested shape and kind is
/// returned as that matrix's own array, made immutable; other shapes are
/// re-sliced through a sub-matrix first.
pub fn as_coord_func_matrix(
    truncate: bool,
    f: &CoordFunc,
    kind: ElementKind,
    dims: &[u64],
) -> Result<Matrix>
{
    if dims.is_empty() {
        return Err(ArrayError::invalid_argument("a matrix needs at least one dimension"));
    }
    match f {
        CoordFunc::Interpolation { matrix, continuation } => {
            if matrix.dims() == dims && matrix.array().kind() == kind {
                return Matrix::new(matrix.array().as_immutable(), dims);
            }
            if matrix.dim_count() != dims.len() {
                return Err(ArrayError::invalid_argument(
                    "interpolation rank differs from the requested shape",
                ));
            }
            let sliced = matrix.sub_matrix(&vec![0; dims.len()], dims, continuation.clone())?;
            if sliced.array().kind() == kind {
                Ok(sliced)
            } else {
                Matrix::new(conversion_view(truncate, sliced.array(), kind), dims)
            }
        }
        CoordFunc::Math(func) => {
            let array = for_kind!(kind, K => {
                Arc::new(CoordFuncArray::<K>::new(truncate, func.clone(), dims)?) as ArrRef
            });
            Matrix::new(array, dims)
        }
    }
}

/// The coord-func kernel: decode coordinates, batch-call the function.
pub struct CoordFuncArray<K: Kind>
{
    f: Func,
    dims: Arc<[u64]>,
    len: u64,
    truncate: bool,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> CoordFuncArray<K>
{
    pub(crate) fn new(truncate: bool, f: Func, dims: &[u64]) -> Result<Self>
    {
        let mut len: u64 = 1;
        for &d in dims {
            len = len.checked_mul(d).ok_or(ArrayError::overflow())?;
        }
        if len > i64::MAX as u64 {
            return Err(ArrayError::overflow());
        }
        Ok(CoordFuncArray { f, dims: dims.into(), len, truncate, _kind: std::marker::PhantomData })
    }

    fn decode(&self, index: u64, coords: &mut [f64])
    {
        let mut rest = index;
        for (slot, &d) in coords.iter_mut().zip(self.dims.iter()) {
            *slot = (rest % d) as f64;
            rest /= d;
        }
    }

    fn element(&self, index: u64) -> Result<K::Repr>
    {
        check_index(self.len, index)?;
        let mut coords = vec![0.0; self.dims.len()];
        self.decode(index, &mut coords);
        Ok(K::Repr::from_f64(self.f.get(&coords), self.truncate))
    }
}

impl<K: Kind> Clone for CoordFuncArray<K>
{
    fn clone(&self) -> Self
    {
        CoordFuncArray {
            f: self.f.clone(),
            dims: Arc::clone(&self.dims),
            len: self.len,
            truncate: self.truncate,
            _kind: std::marker::PhantomData,
        }
    }
}

impl<K: Kind> Array for CoordFuncArray<K>
{
    fn len(&self) -> u64
    {
        self.len
    }

    fn kind(&self) -> ElementKind
    {
        K::KIND
    }

    fn flags(&self) -> ArrayFlags
    {
        view_flags()
    }

    fn as_any(&self) -> &dyn Any
    {
        self
    }

    fn clone_ref(&self) -> ArrRef
    {
        Arc::new(self.clone())
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        Ok(self.element(index)?.to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        Ok(self.element(index)?.to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let out = checked_out::<K>(self.len, pos, dst, dst_off, count)?;
        if out.is_empty() {
            return Ok(());
        }
        // odometer decode: one division per chunk, increments afterwards
        let mut coords = vec![0.0; self.dims.len()];
        self.decode(pos, &mut coords);
        for slot in out.iter_mut() {
            *slot = K::Repr::from_f64(self.f.get(&coords), self.truncate);
            for (c, &d) in coords.iter_mut().zip(self.dims.iter()) {
                *c += 1.0;
                if *c < d as f64 {
                    break;
                }
                *c = 0.0;
            }
        }
        Ok(())
    }
}
