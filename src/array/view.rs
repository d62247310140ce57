// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Subarray and immutable wrappers: views that translate indices and drop
//! capabilities, delegating everything else to the base handle.

use std::any::Any;
use std::sync::Arc;

use crate::array::{
    check_range, ArrRef, Array, ArrayFlags, DataDst, DataSrc, UpdRef, UpdatableArray,
};
use crate::error::Result;
use crate::kind::ElementKind;

/// Translate a scan range of a view into base coordinates, returning the
/// clamped base `lo..hi`.
fn scan_range_in_base(offset: u64, len: u64, lo: i64, hi: i64) -> (i64, i64)
{
    let from = lo.max(0) as u64;
    let to = if hi < 0 { 0 } else { (hi as u64).min(len) };
    let to = to.max(from);
    ((offset + from) as i64, (offset + to) as i64)
}

/// A read-only view of the half-open range `from..to` of the base array.
pub struct SubArray
{
    base: ArrRef,
    offset: u64,
    len: u64,
}

impl SubArray
{
    pub fn new(base: ArrRef, from: u64, to: u64) -> Result<Self>
    {
        check_range(base.len(), from, to.saturating_sub(from))?;
        if from > to {
            return Err(crate::error::ArrayError::range_out_of_bounds(
                from as i64,
                to as i64,
                base.len(),
            ));
        }
        Ok(SubArray { base, offset: from, len: to - from })
    }
}

impl Array for SubArray
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
            unresizable: true,
            ..self.base.flags()
        }
    }

    fn as_any(&self) -> &dyn Any
    {
        self
    }

    fn clone_ref(&self) -> ArrRef
    {
        Arc::new(SubArray {
            base: self.base.clone_ref(),
            offset: self.offset,
            len: self.len,
        })
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_double(self.offset + index)
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_long(self.offset + index)
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        check_range(self.len, index, 1)?;
        self.base.get_bit(self.offset + index)
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        check_range(self.len, pos, count as u64)?;
        self.base.get_data(self.offset + pos, dst, dst_off, count)
    }

    fn get_bits(&self, pos: u64, dst: &mut [u64], dst_off: u64, count: u64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        self.base.get_bits(self.offset + pos, dst, dst_off, count)
    }

    fn subarray(&self, from: u64, to: u64) -> Result<ArrRef>
    {
        // flatten: a subarray of a subarray addresses the base directly
        check_range(self.len, from, to.saturating_sub(from).max(0))?;
        SubArray::new(self.base.clone_ref(), self.offset + from, self.offset + to)
            .map(|sub| Arc::new(sub) as ArrRef)
    }

    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let (base_lo, base_hi) = scan_range_in_base(self.offset, self.len, lo, hi);
        let found = self.base.index_of(base_lo, base_hi, value);
        if found < 0 {
            -1
        } else {
            found - self.offset as i64
        }
    }

    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let (base_lo, base_hi) = scan_range_in_base(self.offset, self.len, lo, hi);
        let found = self.base.last_index_of(base_lo, base_hi, value);
        if found < 0 {
            -1
        } else {
            found - self.offset as i64
        }
    }

    fn load_resources(&self)
    {
        self.base.load_resources();
    }

    fn flush_resources(&self)
    {
        self.base.flush_resources();
    }

    fn free_resources(&self)
    {
        self.base.free_resources();
    }
}

/// An updatable view of the half-open range `from..to` of the base array.
pub struct SubArrayUpd
{
    base: UpdRef,
    offset: u64,
    len: u64,
}

impl SubArrayUpd
{
    pub fn new(base: UpdRef, from: u64, to: u64) -> Result<Self>
    {
        check_range(base.len(), from, to.saturating_sub(from))?;
        if from > to {
            return Err(crate::error::ArrayError::range_out_of_bounds(
                from as i64,
                to as i64,
                base.len(),
            ));
        }
        Ok(SubArrayUpd { base, offset: from, len: to - from })
    }

    fn read_view(&self) -> SubArray
    {
        SubArray {
            base: self.base.clone_ref(),
            offset: self.offset,
            len: self.len,
        }
    }
}

impl Array for SubArrayUpd
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
            unresizable: true,
            ..self.base.flags()
        }
    }

    fn as_any(&self) -> &dyn Any
    {
        self
    }

    fn clone_ref(&self) -> ArrRef
    {
        Arc::new(self.read_view())
    }

    fn to_updatable(&self) -> Result<UpdRef>
    {
        Ok(self.clone_upd())
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_double(self.offset + index)
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_range(self.len, index, 1)?;
        self.base.get_long(self.offset + index)
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        check_range(self.len, index, 1)?;
        self.base.get_bit(self.offset + index)
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        check_range(self.len, pos, count as u64)?;
        self.base.get_data(self.offset + pos, dst, dst_off, count)
    }

    fn get_bits(&self, pos: u64, dst: &mut [u64], dst_off: u64, count: u64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        self.base.get_bits(self.offset + pos, dst, dst_off, count)
    }

    fn subarray(&self, from: u64, to: u64) -> Result<ArrRef>
    {
        self.read_view().subarray(from, to)
    }

    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        self.read_view().index_of(lo, hi, value)
    }

    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        self.read_view().last_index_of(lo, hi, value)
    }
}

impl UpdatableArray for SubArrayUpd
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(SubArrayUpd {
            base: self.base.clone_upd(),
            offset: self.offset,
            len: self.len,
        })
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.base.set_double(self.offset + index, value)
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.base.set_long(self.offset + index, value)
    }

    fn set_bit(&self, index: u64, value: bool) -> Result<()>
    {
        check_range(self.len, index, 1)?;
        self.base.set_bit(self.offset + index, value)
    }

    fn set_data(&self, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize) -> Result<()>
    {
        check_range(self.len, pos, count as u64)?;
        self.base.set_data(self.offset + pos, src, src_off, count)
    }

    fn set_bits(&self, pos: u64, src: &[u64], src_off: u64, count: u64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        self.base.set_bits(self.offset + pos, src, src_off, count)
    }

    fn fill(&self, pos: u64, count: u64, value: f64) -> Result<()>
    {
        check_range(self.len, pos, count)?;
        self.base.fill(self.offset + pos, count, value)
    }

    fn swap(&self, i: u64, j: u64) -> Result<()>
    {
        check_range(self.len, i, 1)?;
        check_range(self.len, j, 1)?;
        self.base.swap(self.offset + i, self.offset + j)
    }

    fn subarray_upd(&self, from: u64, to: u64) -> Result<UpdRef>
    {
        check_range(self.len, from, to.saturating_sub(from).max(0))?;
        SubArrayUpd::new(self.base.clone_upd(), self.offset + from, self.offset + to)
            .map(|sub| Arc::new(sub) as UpdRef)
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        Arc::new(SubArrayUpd {
            base: self.base.as_copy_on_next_write(),
            offset: self.offset,
            len: self.len,
        })
    }
}

/// A read-only wrapper detaching all write capabilities.
pub(crate) struct ImmutableView
{
    base: ArrRef,
}

impl ImmutableView
{
    pub(crate) fn new(base: ArrRef) -> Self
    {
        ImmutableView { base }
    }
}

impl Array for ImmutableView
{
    fn len(&self) -> u64
    {
        self.base.len()
    }

    fn kind(&self) -> ElementKind
    {
        self.base.kind()
    }

    fn flags(&self) -> ArrayFlags
    {
        ArrayFlags {
            immutable: true,
            unresizable: true,
            new_read_only_view: true,
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
        Arc::new(ImmutableView { base: self.base.clone_ref() })
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        self.base.get_double(index)
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        self.base.get_long(index)
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        self.base.get_bit(index)
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        self.base.get_data(pos, dst, dst_off, count)
    }

    fn get_bits(&self, pos: u64, dst: &mut [u64], dst_off: u64, count: u64) -> Result<()>
    {
        self.base.get_bits(pos, dst, dst_off, count)
    }

    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        self.base.index_of(lo, hi, value)
    }

    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        self.base.last_index_of(lo, hi, value)
    }

    fn as_immutable(&self) -> ArrRef
    {
        self.clone_ref()
    }
}

/// A circular rotation: element `i` reads `base[(i - shift) mod len]`.
///
/// The bulk path never translates per element: a read either copies a single
/// run or splits once at the wrap boundary.
pub struct ShiftedArray
{
    base: ArrRef,
    shift: u64,
}

impl ShiftedArray
{
    /// Rotate `base` right by `shift` positions (negative shifts rotate
    /// left).
    pub fn new(base: ArrRef, shift: i64) -> Self
    {
        let len = base.len();
        let shift = if len == 0 {
            0
        } else {
            num_integer::mod_floor(shift, len as i64) as u64
        };
        ShiftedArray { base, shift }
    }

    #[inline]
    fn translate(&self, index: u64) -> u64
    {
        let len = self.base.len();
        if index >= self.shift {
            index - self.shift
        } else {
            len - self.shift + index
        }
    }
}

impl Clone for ShiftedArray
{
    fn clone(&self) -> Self
    {
        ShiftedArray { base: self.base.clone_ref(), shift: self.shift }
    }
}

impl Array for ShiftedArray
{
    fn len(&self) -> u64
    {
        self.base.len()
    }

    fn kind(&self) -> ElementKind
    {
        self.base.kind()
    }

    fn flags(&self) -> ArrayFlags
    {
        ArrayFlags {
            immutable: true,
            unresizable: true,
            lazy: self.base.flags().lazy,
            new_read_only_view: true,
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

    fn get_double(&self, index: u64) -> Result<f64>
    {
        check_range(self.base.len(), index, 1)?;
        self.base.get_double(self.translate(index))
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_range(self.base.len(), index, 1)?;
        self.base.get_long(self.translate(index))
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        check_range(self.base.len(), index, 1)?;
        self.base.get_bit(self.translate(index))
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let len = self.base.len();
        check_range(len, pos, count as u64)?;
        crate::array::check_buffer(dst.len(), dst_off, count)?;
        let mut done = 0usize;
        while done < count {
            let j = self.translate(pos + done as u64);
            // copy up to the wrap boundary in one run
            let run = ((len - j) as usize).min(count - done);
            self.base.get_data(j, dst, dst_off + done, run)?;
            done += run;
        }
        Ok(())
    }
}
