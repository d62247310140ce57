// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Matrices: an n-dimensional shape over a 1-D backing array, with tiling
//! and sub-matrix continuation views.
//!
//! Coordinates are row-major with the first dimension varying fastest:
//! `index = ((c_{n-1}·d_{n-2} + c_{n-2})·d_{n-3} + ...)·d_0 + c_0`.

use std::sync::Arc;

use crate::array::{ArrRef, Array, UpdRef};
use crate::error::{ArrayError, Result};

mod submatrix;
mod tiled;

pub use self::submatrix::ContinuationMode;
pub(crate) use self::submatrix::SubMatrixArray;
pub use self::tiled::TiledArray;

/// Multipliers for row-major encoding: `mults[k] = d_0·...·d_{k-1}`.
pub(crate) fn dim_multipliers(dims: &[u64]) -> Result<Vec<u64>>
{
    let mut mults = Vec::with_capacity(dims.len());
    let mut acc: u64 = 1;
    for &d in dims {
        mults.push(acc);
        acc = acc.checked_mul(d).ok_or(ArrayError::overflow())?;
    }
    if acc > i64::MAX as u64 {
        return Err(ArrayError::overflow());
    }
    Ok(mults)
}

pub(crate) fn checked_size(dims: &[u64]) -> Result<u64>
{
    let mut acc: u64 = 1;
    for &d in dims {
        acc = acc.checked_mul(d).ok_or(ArrayError::overflow())?;
    }
    if acc > i64::MAX as u64 {
        return Err(ArrayError::overflow());
    }
    Ok(acc)
}

/// An n-dimensional shape over a 1-D backing array.
///
/// A matrix is a cheap handle: the backing array is shared, and reads and
/// writes go straight through it.
pub struct Matrix
{
    array: ArrRef,
    dims: Arc<[u64]>,
}

impl Clone for Matrix
{
    fn clone(&self) -> Self
    {
        Matrix {
            array: self.array.clone_ref(),
            dims: Arc::clone(&self.dims),
        }
    }
}

impl Matrix
{
    /// Wrap `array` into the shape `dims`; the shape product must equal the
    /// array length.
    pub fn new(array: ArrRef, dims: &[u64]) -> Result<Matrix>
    {
        if dims.is_empty() {
            return Err(ArrayError::invalid_argument("a matrix needs at least one dimension"));
        }
        let size = checked_size(dims)?;
        if size != array.len() {
            return Err(ArrayError::size_mismatch(size, array.len()));
        }
        Ok(Matrix { array, dims: dims.into() })
    }

    pub fn array(&self) -> &ArrRef
    {
        &self.array
    }

    /// The backing array as an updatable handle, when it supports writes.
    pub fn updatable_array(&self) -> Result<UpdRef>
    {
        self.array.to_updatable()
    }

    pub fn dims(&self) -> &[u64]
    {
        &self.dims
    }

    pub fn dim_count(&self) -> usize
    {
        self.dims.len()
    }

    /// The `k`-th dimension; 1 beyond the actual rank.
    pub fn dim(&self, k: usize) -> u64
    {
        self.dims.get(k).copied().unwrap_or(1)
    }

    pub fn size(&self) -> u64
    {
        self.array.len()
    }

    /// Row-major linear index of in-range coordinates.
    pub fn index(&self, coords: &[u64]) -> Result<u64>
    {
        if coords.len() != self.dims.len() {
            return Err(ArrayError::invalid_argument("coordinate rank differs from the matrix rank"));
        }
        let mut index = 0u64;
        let mut mult = 1u64;
        for (&c, &d) in coords.iter().zip(self.dims.iter()) {
            if c >= d {
                return Err(ArrayError::index_out_of_bounds(c as i64, d));
            }
            index += c * mult;
            mult *= d;
        }
        Ok(index)
    }

    /// Row-major coordinates of a linear index.
    pub fn coords(&self, index: u64) -> Result<Vec<u64>>
    {
        if index >= self.size() {
            return Err(ArrayError::index_out_of_bounds(index as i64, self.size()));
        }
        let mut rest = index;
        let mut coords = Vec::with_capacity(self.dims.len());
        for &d in self.dims.iter() {
            coords.push(rest % d);
            rest /= d;
        }
        Ok(coords)
    }

    /// A matrix of the same shape whose backing array stores elements tile
    /// by tile. Partial tiles at the high edge keep their natural shape.
    pub fn tile(&self, tile_dims: &[u64]) -> Result<Matrix>
    {
        let upd = self.array.to_updatable().ok();
        let tiled = TiledArray::with_writer(self.array.clone_ref(), upd, &self.dims, tile_dims)?;
        Matrix::new(Arc::new(tiled), &self.dims)
    }

    /// Whether the backing array is a tiled view.
    pub fn is_tiled(&self) -> bool
    {
        self.array.as_any().downcast_ref::<TiledArray>().is_some()
    }

    pub fn tile_dims(&self) -> Option<Vec<u64>>
    {
        self.array
            .as_any()
            .downcast_ref::<TiledArray>()
            .map(|t| t.tile_dims().to_vec())
    }

    /// A sub-matrix view at `from` with shape `dims`, continued outside the
    /// base by `mode`.
    ///
    /// STRICT requires `from..from + dims` inside the base and fails
    /// construction otherwise; the other modes accept any offset.
    pub fn sub_matrix(&self, from: &[i64], dims: &[u64], mode: ContinuationMode) -> Result<Matrix>
    {
        let upd = self.array.to_updatable().ok();
        let sub = SubMatrixArray::new(self.array.clone_ref(), upd, &self.dims, from, dims, mode)?;
        Matrix::new(Arc::new(sub), dims)
    }
}

impl std::fmt::Debug for Matrix
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "Matrix({:?} of {:?})", &self.dims[..], self.array.kind())
    }
}
