// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tiled layout view.
//!
//! The backing array stores elements tile by tile, tiles in row-major order
//! of their grid coordinates, each tile packed row-major with its own
//! (possibly partial) extents. This view presents the natural row-major
//! index space on top of that layout.

use std::any::Any;
use std::sync::Arc;

use crate::array::{
    check_range, ArrRef, Array, ArrayFlags, DataDst, DataSrc, UpdRef, UpdatableArray,
};
use crate::error::{ArrayError, Result};
use crate::kind::ElementKind;

use super::{checked_size, dim_multipliers};

/// A view presenting natural row-major order over tiled backing storage.
pub struct TiledArray
{
    base: ArrRef,
    writer: Option<UpdRef>,
    dims: Arc<[u64]>,
    tile_dims: Arc<[u64]>,
    // mults[k] = d_0 ... d_{k-1}
    mults: Arc<[u64]>,
    len: u64,
}

impl Clone for TiledArray
{
    fn clone(&self) -> Self
    {
        TiledArray {
            base: self.base.clone_ref(),
            writer: self.writer.as_ref().map(|w| w.clone_upd()),
            dims: Arc::clone(&self.dims),
            tile_dims: Arc::clone(&self.tile_dims),
            mults: Arc::clone(&self.mults),
            len: self.len,
        }
    }
}

impl TiledArray
{
    pub(crate) fn new(base: ArrRef, dims: &[u64], tile_dims: &[u64]) -> Result<Self>
    {
        TiledArray::with_writer(base, None, dims, tile_dims)
    }

    pub(crate) fn with_writer(
        base: ArrRef,
        writer: Option<UpdRef>,
        dims: &[u64],
        tile_dims: &[u64],
    ) -> Result<Self>
    {
        if dims.is_empty() || dims.len() != tile_dims.len() {
            return Err(ArrayError::invalid_argument(
                "tile rank differs from the matrix rank",
            ));
        }
        if tile_dims.iter().any(|&t| t == 0) {
            return Err(ArrayError::invalid_argument("tile dimensions must be positive"));
        }
        let len = checked_size(dims)?;
        if len != base.len() {
            return Err(ArrayError::size_mismatch(len, base.len()));
        }
        let mults = dim_multipliers(dims)?;
        Ok(TiledArray {
            base,
            writer,
            dims: dims.into(),
            tile_dims: tile_dims.into(),
            mults: mults.into(),
            len,
        })
    }

    pub fn dims(&self) -> &[u64]
    {
        &self.dims
    }

    pub fn tile_dims(&self) -> &[u64]
    {
        &self.tile_dims
    }

    pub(crate) fn base(&self) -> &ArrRef
    {
        &self.base
    }

    /// Backing index of natural index `i`, plus the number of consecutive
    /// natural indices (including `i`) mapping to consecutive backing
    /// indices: the run to the end of the tile row.
    fn translate_run(&self, i: u64) -> (u64, u64)
    {
        let n = self.dims.len();
        // clipped extents and origins of the containing tile, per axis
        let mut extents = vec![0u64; n];
        let mut origins = vec![0u64; n];
        let mut in_tile = 0u64;
        let mut s_mult = 1u64;
        let mut run = 1u64;
        let mut rest = i;
        for k in 0..n {
            let c = rest % self.dims[k];
            rest /= self.dims[k];
            let origin = c / self.tile_dims[k] * self.tile_dims[k];
            let o = c - origin;
            let s = self.tile_dims[k].min(self.dims[k] - origin);
            extents[k] = s;
            origins[k] = origin;
            in_tile += o * s_mult;
            s_mult *= s;
            if k == 0 {
                run = s - o;
            }
        }
        // start(t) = sum_k origin_k · (d_0···d_{k-1}) · (s_{k+1}···s_{n-1}):
        // whole slabs of tiles left of this tile along every axis
        let mut start = 0u64;
        let mut suffix: u64 = 1;
        for k in (0..n).rev() {
            start += origins[k] * self.mults[k] * suffix;
            suffix *= extents[k];
        }
        (start + in_tile, run)
    }

    fn translate(&self, i: u64) -> u64
    {
        self.translate_run(i).0
    }

    fn writer(&self) -> Result<&dyn UpdatableArray>
    {
        match &self.writer {
            Some(w) => Ok(&**w),
            None => Err(ArrayError::unallowed_mutation()),
        }
    }
}

impl Array for TiledArray
{
    fn len(&self) -> u64
    {
        self.len
    }

    fn kind(&self) -> ElementKind
    {
        self.base.kind()
    }

    fn flags(&self) -> ArrayFlags
    {
        ArrayFlags {
            immutable: self.writer.is_none(),
            unresizable: true,
            lazy: self.base.flags().lazy,
            ..ArrayFlags::default()
        }
    }

    fn as_any(&self) -> &dyn Any
    {
        self
    }

    fn clone_ref(&self) -> ArrRef
    {
        Arc::new(self.clone())
    }

    fn to_updatable(&self) -> Result<UpdRef>
    {
        self.writer()?;
        Ok(Arc::new(self.clone()))
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_double(self.translate(index))
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_long(self.translate(index))
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        check_range(self.len, index, 1)?;
        self.base.get_bit(self.translate(index))
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        check_range(self.len, pos, count as u64)?;
        crate::array::check_buffer(dst.len(), dst_off, count)?;
        let mut done = 0usize;
        while done < count {
            let (j, run) = self.translate_run(pos + done as u64);
            let n = (run as usize).min(count - done);
            self.base.get_data(j, dst, dst_off + done, n)?;
            done += n;
        }
        Ok(())
    }
}

impl UpdatableArray for TiledArray
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.writer()?.set_double(self.translate(index), value)
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.writer()?.set_long(self.translate(index), value)
    }

    fn set_bit(&self, index: u64, value: bool) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.writer()?.set_bit(self.translate(index), value)
    }

    fn set_data(&self, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize) -> Result<()>
    {
        check_range(self.len, pos, count as u64)?;
        crate::array::check_buffer(src.len(), src_off, count)?;
        let writer = self.writer()?;
        let mut done = 0usize;
        while done < count {
            let (j, run) = self.translate_run(pos + done as u64);
            let n = (run as usize).min(count - done);
            writer.set_data(j, src, src_off + done, n)?;
            done += n;
        }
        Ok(())
    }

    fn fill(&self, pos: u64, count: u64, value: f64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        let writer = self.writer()?;
        let mut done = 0u64;
        while done < count {
            let (j, run) = self.translate_run(pos + done);
            let n = run.min(count - done);
            writer.fill(j, n, value)?;
            done += n;
        }
        Ok(())
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        let writer = self.writer.as_ref().map(|w| w.as_copy_on_next_write());
        let base = writer.as_ref().map_or_else(|| self.base.clone_ref(), |w| w.clone_ref());
        Arc::new(TiledArray {
            base,
            writer,
            dims: Arc::clone(&self.dims),
            tile_dims: Arc::clone(&self.tile_dims),
            mults: Arc::clone(&self.mults),
            len: self.len,
        })
    }
}
