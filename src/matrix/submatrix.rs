// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The sub-matrix indexer: translates a view index into a backing index
//! under a continuation mode.

use std::any::Any;
use std::sync::Arc;

use num_integer::mod_floor;

use crate::array::{
    check_buffer, check_range, scalar_get_data, scalar_set_data, ArrRef, Array, ArrayFlags,
    DataDst, DataSrc, UpdRef, UpdatableArray,
};
use crate::error::{ArrayError, Result};
use crate::kind::{ElementKind, Prim};

use super::{checked_size, dim_multipliers};

/// Policy for view coordinates that fall outside the base matrix.
#[derive(Clone, Debug, PartialEq)]
pub enum ContinuationMode
{
    /// Out-of-range coordinates are a construction-time error.
    Strict,
    /// Out-of-range reads yield the value; writes there are discarded.
    Constant(f64),
    /// Every coordinate is taken modulo its base dimension.
    Cyclic,
    /// The base is repeated as a flat sequence: the linear index is taken
    /// modulo the base length, ignoring row boundaries.
    PseudoCyclic,
    /// The half-sample even extension: each coordinate reflects within the
    /// period `2·dim`.
    MirrorCyclic,
}

/// Backing index of one view element, or outside.
enum Translated
{
    Inside(u64),
    Outside,
}

pub(crate) struct SubMatrixArray
{
    base: ArrRef,
    writer: Option<UpdRef>,
    base_dims: Arc<[u64]>,
    base_mults: Arc<[u64]>,
    base_len: u64,
    from: Arc<[i64]>,
    dims: Arc<[u64]>,
    mode: ContinuationMode,
    len: u64,
    outside_double: f64,
    outside_long: i64,
}

impl Clone for SubMatrixArray
{
    fn clone(&self) -> Self
    {
        SubMatrixArray {
            base: self.base.clone_ref(),
            writer: self.writer.as_ref().map(|w| w.clone_upd()),
            base_dims: Arc::clone(&self.base_dims),
            base_mults: Arc::clone(&self.base_mults),
            base_len: self.base_len,
            from: Arc::clone(&self.from),
            dims: Arc::clone(&self.dims),
            mode: self.mode.clone(),
            len: self.len,
            outside_double: self.outside_double,
            outside_long: self.outside_long,
        }
    }
}

impl SubMatrixArray
{
    pub(crate) fn new(
        base: ArrRef,
        writer: Option<UpdRef>,
        base_dims: &[u64],
        from: &[i64],
        dims: &[u64],
        mode: ContinuationMode,
    ) -> Result<Self>
    {
        if from.len() != base_dims.len() || dims.len() != base_dims.len() {
            return Err(ArrayError::invalid_argument(
                "sub-matrix rank differs from the base rank",
            ));
        }
        if mode == ContinuationMode::Strict {
            for ((&f, &d), &bd) in from.iter().zip(dims.iter()).zip(base_dims.iter()) {
                if f < 0 || d > bd || f as u64 > bd - d {
                    return Err(ArrayError::range_out_of_bounds(f, f + d as i64, bd));
                }
            }
        }
        let len = checked_size(dims)?;
        let cyclic = matches!(
            mode,
            ContinuationMode::Cyclic | ContinuationMode::PseudoCyclic | ContinuationMode::MirrorCyclic
        );
        if cyclic && len > 0 && base_dims.iter().any(|&d| d == 0) {
            return Err(ArrayError::invalid_argument(
                "cyclic continuation of an empty matrix",
            ));
        }
        let base_mults = dim_multipliers(base_dims)?;
        let outside = match mode {
            ContinuationMode::Constant(v) => v,
            _ => 0.0,
        };
        // the outside value behaves like a stored element of the base kind
        let (outside_double, outside_long) = narrowed_outside(base.kind(), outside);
        Ok(SubMatrixArray {
            base,
            writer,
            base_dims: base_dims.into(),
            base_mults: base_mults.into(),
            base_len: checked_size(base_dims)?,
            from: from.into(),
            dims: dims.into(),
            mode,
            len,
            outside_double,
            outside_long,
        })
    }

    fn translate(&self, index: u64) -> Translated
    {
        let mut rest = index;
        match &self.mode {
            ContinuationMode::Strict | ContinuationMode::Constant(_) => {
                let mut j = 0u64;
                for (k, &d) in self.dims.iter().enumerate() {
                    let c = rest % d;
                    rest /= d;
                    let x = self.from[k] + c as i64;
                    if x < 0 || x as u64 >= self.base_dims[k] {
                        return Translated::Outside;
                    }
                    j += x as u64 * self.base_mults[k];
                }
                Translated::Inside(j)
            }
            ContinuationMode::Cyclic => {
                let mut j = 0u64;
                for (k, &d) in self.dims.iter().enumerate() {
                    let c = rest % d;
                    rest /= d;
                    let x = mod_floor(self.from[k] as i128 + c as i128, self.base_dims[k] as i128);
                    j += x as u64 * self.base_mults[k];
                }
                Translated::Inside(j)
            }
            ContinuationMode::PseudoCyclic => {
                let len = self.base_len as i128;
                let mut acc: i128 = 0;
                for (k, &d) in self.dims.iter().enumerate() {
                    let c = rest % d;
                    rest /= d;
                    let term = (self.from[k] as i128 + c as i128) * self.base_mults[k] as i128;
                    acc += mod_floor(term, len);
                }
                Translated::Inside(mod_floor(acc, len) as u64)
            }
            ContinuationMode::MirrorCyclic => {
                let mut j = 0u64;
                for (k, &d) in self.dims.iter().enumerate() {
                    let c = rest % d;
                    rest /= d;
                    let period = 2 * self.base_dims[k] as i128;
                    let p = mod_floor(self.from[k] as i128 + c as i128, period);
                    let x = if (p as u64) < self.base_dims[k] {
                        p as u64
                    } else {
                        2 * self.base_dims[k] - 1 - p as u64
                    };
                    j += x * self.base_mults[k];
                }
                Translated::Inside(j)
            }
        }
    }

    /// In the constantly-continued modes, the longest run starting at `index`
    /// that maps to consecutive base indices (`Some`) or stays outside
    /// (`None`). Runs never cross a view row boundary.
    fn row_run(&self, index: u64) -> (Option<u64>, u64)
    {
        let d0 = self.dims[0];
        let c0 = index % d0;
        let row_left = d0 - c0;
        // axes above 0 decide outsideness for the whole row
        let mut rest = index / d0;
        let mut j_high = 0u64;
        let mut row_outside = false;
        for (k, &d) in self.dims.iter().enumerate().skip(1) {
            let c = rest % d;
            rest /= d;
            let x = self.from[k] + c as i64;
            if x < 0 || x as u64 >= self.base_dims[k] {
                row_outside = true;
            } else {
                j_high += x as u64 * self.base_mults[k];
            }
        }
        if row_outside {
            return (None, row_left);
        }
        let x0 = self.from[0] + c0 as i64;
        if x0 < 0 {
            // left padding until the base begins
            let pad = (-x0) as u64;
            return (None, pad.min(row_left));
        }
        let x0 = x0 as u64;
        if x0 >= self.base_dims[0] {
            return (None, row_left);
        }
        let inside = (self.base_dims[0] - x0).min(row_left);
        (Some(j_high + x0), inside)
    }

    fn is_constantly_continued(&self) -> bool
    {
        matches!(self.mode, ContinuationMode::Strict | ContinuationMode::Constant(_))
    }

    fn writer(&self) -> Result<&dyn UpdatableArray>
    {
        match &self.writer {
            Some(w) => Ok(&**w),
            None => Err(ArrayError::unallowed_mutation()),
        }
    }
}

/// The continuation constant as it would read back from an element of
/// `kind`: both the double and the long projections.
fn narrowed_outside(kind: ElementKind, v: f64) -> (f64, i64)
{
    match kind {
        ElementKind::Bit => {
            let b = v != 0.0;
            (b as u8 as f64, b as i64)
        }
        ElementKind::Char16 | ElementKind::U16 => {
            let x = u16::from_f64_wrap(v);
            (x.to_f64(), x.to_i64())
        }
        ElementKind::U8 => {
            let x = u8::from_f64_wrap(v);
            (x.to_f64(), x.to_i64())
        }
        ElementKind::I32 => {
            let x = i32::from_f64_wrap(v);
            (x.to_f64(), x.to_i64())
        }
        ElementKind::I64 => {
            let x = i64::from_f64_wrap(v);
            (x.to_f64(), x.to_i64())
        }
        ElementKind::F32 => {
            let x = v as f32;
            (x.to_f64(), x.to_i64())
        }
        ElementKind::F64 => (v, v as i64),
    }
}

impl Array for SubMatrixArray
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
            lazy: true,
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
        match self.translate(index) {
            Translated::Inside(j) => self.base.get_double(j),
            Translated::Outside => Ok(self.outside_double),
        }
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_range(self.len, index, 1)?;
        match self.translate(index) {
            Translated::Inside(j) => self.base.get_long(j),
            Translated::Outside => Ok(self.outside_long),
        }
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        check_range(self.len, index, 1)?;
        match self.translate(index) {
            Translated::Inside(j) => self.base.get_bit(j),
            Translated::Outside => Ok(self.outside_long != 0),
        }
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        if !self.is_constantly_continued() {
            return scalar_get_data(self, pos, dst, dst_off, count);
        }
        if dst.kind() != self.kind() {
            return Err(ArrayError::array_store(self.kind(), dst.kind()));
        }
        check_range(self.len, pos, count as u64)?;
        check_buffer(dst.len(), dst_off, count)?;
        let mut done = 0usize;
        while done < count {
            let at = pos + done as u64;
            let (mapped, run) = self.row_run(at);
            let n = (run as usize).min(count - done);
            match mapped {
                Some(j) => self.base.get_data(j, dst, dst_off + done, n)?,
                None => fill_dst(dst, dst_off + done, n, self.outside_double, self.outside_long),
            }
            done += n;
        }
        Ok(())
    }
}

/// Store the outside value into a destination slice range.
fn fill_dst(dst: &mut DataDst<'_>, off: usize, count: usize, double: f64, long: i64)
{
    match dst {
        DataDst::Bits(s) => s[off..off + count].fill(long != 0),
        DataDst::Chars(s) | DataDst::Shorts(s) => s[off..off + count].fill(long as u16),
        DataDst::Bytes(s) => s[off..off + count].fill(long as u8),
        DataDst::Ints(s) => s[off..off + count].fill(long as i32),
        DataDst::Longs(s) => s[off..off + count].fill(long),
        DataDst::Floats(s) => s[off..off + count].fill(double as f32),
        DataDst::Doubles(s) => s[off..off + count].fill(double),
    }
}

impl UpdatableArray for SubMatrixArray
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        match self.translate(index) {
            Translated::Inside(j) => self.writer()?.set_double(j, value),
            Translated::Outside => Ok(()),
        }
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        match self.translate(index) {
            Translated::Inside(j) => self.writer()?.set_long(j, value),
            Translated::Outside => Ok(()),
        }
    }

    fn set_bit(&self, index: u64, value: bool) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        match self.translate(index) {
            Translated::Inside(j) => self.writer()?.set_bit(j, value),
            Translated::Outside => Ok(()),
        }
    }

    fn set_data(&self, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize) -> Result<()>
    {
        if !self.is_constantly_continued() {
            return scalar_set_data(self, pos, src, src_off, count);
        }
        if src.kind() != self.kind() {
            return Err(ArrayError::array_store(self.kind(), src.kind()));
        }
        check_range(self.len, pos, count as u64)?;
        check_buffer(src.len(), src_off, count)?;
        let writer = self.writer()?;
        let mut done = 0usize;
        while done < count {
            let at = pos + done as u64;
            let (mapped, run) = self.row_run(at);
            let n = (run as usize).min(count - done);
            if let Some(j) = mapped {
                writer.set_data(j, src, src_off + done, n)?;
            }
            done += n;
        }
        Ok(())
    }

    fn fill(&self, pos: u64, count: u64, value: f64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        let writer = self.writer()?;
        if !self.is_constantly_continued() {
            for i in pos..pos + count {
                match self.translate(i) {
                    Translated::Inside(j) => writer.set_double(j, value)?,
                    Translated::Outside => {}
                }
            }
            return Ok(());
        }
        let mut done = 0u64;
        while done < count {
            let (mapped, run) = self.row_run(pos + done);
            let n = run.min(count - done);
            if let Some(j) = mapped {
                writer.fill(j, n, value)?;
            }
            done += n;
        }
        Ok(())
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        let writer = self.writer.as_ref().map(|w| w.as_copy_on_next_write());
        let base = writer.as_ref().map_or_else(|| self.base.clone_ref(), |w| w.clone_ref());
        let mut copy = self.clone();
        copy.base = base;
        copy.writer = writer;
        Arc::new(copy)
    }
}
