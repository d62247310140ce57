// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The array trait hierarchy: typed 1-D sequences with uniform scalar and
//! bulk access.
//!
//! [`Array`] is the read capability, [`UpdatableArray`] adds element writes,
//! [`MutableArray`] adds length changes. All methods take `&self`: storage is
//! interior-mutable, and every array or view is a cheap handle sharing its
//! backing data through `Arc`. Handles are used through the [`ArrRef`],
//! [`UpdRef`] and [`MutRef`] aliases.

use std::any::Any;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{ArrayError, Result};
use crate::kind::{ElementKind, Prim};
use crate::pool::PoolItem;

mod bit;
mod mem;
mod view;

pub use self::bit::BitMemArray;
pub use self::mem::{MemArray, SimpleMemoryModel};
pub(crate) use self::view::ImmutableView;
pub use self::view::{ShiftedArray, SubArray, SubArrayUpd};

/// Shared handle to a read-only or read-mostly array.
pub type ArrRef = Arc<dyn Array>;
/// Shared handle to an updatable array.
pub type UpdRef = Arc<dyn UpdatableArray>;
/// Shared handle to a resizable array.
pub type MutRef = Arc<dyn MutableArray>;

/// Observable per-array properties.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayFlags
{
    /// No mutating method may succeed.
    pub immutable: bool,
    /// Length cannot change.
    pub unresizable: bool,
    /// The first mutating operation duplicates the backing storage.
    pub copy_on_next_write: bool,
    /// Elements are computed on demand; no per-element cost promise.
    pub lazy: bool,
    /// Freshly allocated storage, never shared yet.
    pub new: bool,
    /// A read-only view over somebody else's storage.
    pub new_read_only_view: bool,
}

/// A typed destination buffer for bulk reads.
///
/// `Chars` and `Shorts` use the same storage element but are distinct
/// variants: offering one to an array of the other kind is an
/// [`ArrayStore`](crate::ErrorKind::ArrayStore) error.
pub enum DataDst<'a>
{
    Bits(&'a mut [bool]),
    Chars(&'a mut [u16]),
    Bytes(&'a mut [u8]),
    Shorts(&'a mut [u16]),
    Ints(&'a mut [i32]),
    Longs(&'a mut [i64]),
    Floats(&'a mut [f32]),
    Doubles(&'a mut [f64]),
}

/// A typed source buffer for bulk writes.
pub enum DataSrc<'a>
{
    Bits(&'a [bool]),
    Chars(&'a [u16]),
    Bytes(&'a [u8]),
    Shorts(&'a [u16]),
    Ints(&'a [i32]),
    Longs(&'a [i64]),
    Floats(&'a [f32]),
    Doubles(&'a [f64]),
}

impl DataDst<'_>
{
    pub fn kind(&self) -> ElementKind
    {
        match self {
            DataDst::Bits(_) => ElementKind::Bit,
            DataDst::Chars(_) => ElementKind::Char16,
            DataDst::Bytes(_) => ElementKind::U8,
            DataDst::Shorts(_) => ElementKind::U16,
            DataDst::Ints(_) => ElementKind::I32,
            DataDst::Longs(_) => ElementKind::I64,
            DataDst::Floats(_) => ElementKind::F32,
            DataDst::Doubles(_) => ElementKind::F64,
        }
    }

    pub fn len(&self) -> usize
    {
        match self {
            DataDst::Bits(s) => s.len(),
            DataDst::Chars(s) => s.len(),
            DataDst::Bytes(s) => s.len(),
            DataDst::Shorts(s) => s.len(),
            DataDst::Ints(s) => s.len(),
            DataDst::Longs(s) => s.len(),
            DataDst::Floats(s) => s.len(),
            DataDst::Doubles(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl DataSrc<'_>
{
    pub fn kind(&self) -> ElementKind
    {
        match self {
            DataSrc::Bits(_) => ElementKind::Bit,
            DataSrc::Chars(_) => ElementKind::Char16,
            DataSrc::Bytes(_) => ElementKind::U8,
            DataSrc::Shorts(_) => ElementKind::U16,
            DataSrc::Ints(_) => ElementKind::I32,
            DataSrc::Longs(_) => ElementKind::I64,
            DataSrc::Floats(_) => ElementKind::F32,
            DataSrc::Doubles(_) => ElementKind::F64,
        }
    }

    pub fn len(&self) -> usize
    {
        match self {
            DataSrc::Bits(s) => s.len(),
            DataSrc::Chars(s) => s.len(),
            DataSrc::Bytes(s) => s.len(),
            DataSrc::Shorts(s) => s.len(),
            DataSrc::Ints(s) => s.len(),
            DataSrc::Longs(s) => s.len(),
            DataSrc::Floats(s) => s.len(),
            DataSrc::Doubles(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

#[inline]
pub(crate) fn check_index(len: u64, index: u64) -> Result<()>
{
    if index < len {
        Ok(())
    } else {
        Err(ArrayError::index_out_of_bounds(index as i64, len))
    }
}

#[inline]
pub(crate) fn check_range(len: u64, pos: u64, count: u64) -> Result<()>
{
    if pos <= len && count <= len - pos {
        Ok(())
    } else {
        Err(ArrayError::range_out_of_bounds(pos as i64, pos.wrapping_add(count) as i64, len))
    }
}

#[inline]
pub(crate) fn check_buffer(buf_len: usize, off: usize, count: usize) -> Result<()>
{
    if off <= buf_len && count <= buf_len - off {
        Ok(())
    } else {
        Err(ArrayError::range_out_of_bounds(off as i64, off.wrapping_add(count) as i64, buf_len as u64))
    }
}

/// Read capability: length, kind and on-demand element access.
///
/// `get_double` and `get_long` are the two canonical scalar getters; the
/// remaining getters have defaults expressed through them that preserve each
/// kind's exact external semantics (in particular, `get_int` of a floating
/// array narrows through `i64` first).
pub trait Array: Send + Sync
{
    fn len(&self) -> u64;
    fn kind(&self) -> ElementKind;
    fn flags(&self) -> ArrayFlags;
    fn as_any(&self) -> &dyn Any;
    /// A new shared handle over the same storage.
    fn clone_ref(&self) -> ArrRef;

    fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// `Some(c)` when every element of this array is the constant `c`
    /// by construction (an `n_copies`-style array).
    fn constant_value(&self) -> Option<f64>
    {
        None
    }

    fn get_double(&self, index: u64) -> Result<f64>;
    fn get_long(&self, index: u64) -> Result<i64>;

    fn get_int(&self, index: u64) -> Result<i32>
    {
        Ok(self.get_long(index)? as i32)
    }

    fn get_float(&self, index: u64) -> Result<f32>
    {
        Ok(self.get_double(index)? as f32)
    }

    fn get_bit(&self, index: u64) -> Result<bool>
    {
        Ok(self.get_double(index)? != 0.0)
    }

    /// Copy `count` elements starting at `pos` into `dst[dst_off..]`.
    ///
    /// The buffer kind must equal the array kind; no conversion happens here
    /// (build a view for that).
    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        scalar_get_data(self, pos, dst, dst_off, count)
    }

    /// Packed bulk read; bit arrays only. Bit `i` of the result occupies bit
    /// `(dst_off + i) % 64` of word `(dst_off + i) / 64`.
    fn get_bits(&self, pos: u64, dst: &mut [u64], dst_off: u64, count: u64) -> Result<()>
    {
        scalar_get_bits(self, pos, dst, dst_off, count)
    }

    /// A view of the half-open range `from..to`.
    fn subarray(&self, from: u64, to: u64) -> Result<ArrRef>
    {
        SubArray::new(self.clone_ref(), from, to).map(|sub| Arc::new(sub) as ArrRef)
    }

    /// First index in `max(lo,0)..min(len,hi)` holding `value`, or -1.
    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let (from, to) = clamp_scan_range(self.len(), lo, hi);
        for i in from..to {
            if matches!(self.get_double(i), Ok(v) if v == value) {
                return i as i64;
            }
        }
        -1
    }

    /// Last index in `max(lo,0)..min(len,hi)` holding `value`, or -1.
    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let (from, to) = clamp_scan_range(self.len(), lo, hi);
        for i in (from..to).rev() {
            if matches!(self.get_double(i), Ok(v) if v == value) {
                return i as i64;
            }
        }
        -1
    }

    /// A read-only view with the same read semantics.
    fn as_immutable(&self) -> ArrRef
    {
        Arc::new(ImmutableView::new(self.clone_ref()))
    }

    /// An updatable handle over the same storage, or
    /// [`UnallowedMutation`](crate::ErrorKind::UnallowedMutation) when this
    /// array does not support writes.
    fn to_updatable(&self) -> Result<UpdRef>
    {
        Err(ArrayError::unallowed_mutation())
    }

    // Resource hooks; meaningful only for arrays with external resources.
    // Views constructed as *parallel* (element i depends only on elements
    // near i of each source) propagate them to their sources.
    fn load_resources(&self) {}
    fn flush_resources(&self) {}
    fn free_resources(&self) {}
}

/// Write capability. Narrowing on `set_*` is the caller's contract: values
/// wrap to the element kind, no range error is reported.
pub trait UpdatableArray: Array
{
    /// A new updatable handle over the same storage.
    fn clone_upd(&self) -> UpdRef;

    fn set_double(&self, index: u64, value: f64) -> Result<()>;
    fn set_long(&self, index: u64, value: i64) -> Result<()>;

    fn set_int(&self, index: u64, value: i32) -> Result<()>
    {
        self.set_long(index, value as i64)
    }

    fn set_float(&self, index: u64, value: f32) -> Result<()>
    {
        self.set_double(index, value as f64)
    }

    fn set_bit(&self, index: u64, value: bool) -> Result<()>
    {
        self.set_long(index, value as i64)
    }

    /// Copy `count` elements from `src[src_off..]` into this array at `pos`.
    fn set_data(&self, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize) -> Result<()>
    {
        scalar_set_data(self, pos, src, src_off, count)
    }

    /// Packed bulk write; bit arrays only.
    fn set_bits(&self, pos: u64, src: &[u64], src_off: u64, count: u64) -> Result<()>
    {
        scalar_set_bits(self, pos, src, src_off, count)
    }

    /// Store `value` (narrowed to the element kind) into `pos..pos + count`.
    fn fill(&self, pos: u64, count: u64, value: f64) -> Result<()>
    {
        check_range(self.len(), pos, count)?;
        for i in pos..pos + count {
            self.set_double(i, value)?;
        }
        Ok(())
    }

    fn swap(&self, i: u64, j: u64) -> Result<()>
    {
        if self.kind().is_float() {
            let a = self.get_double(i)?;
            let b = self.get_double(j)?;
            self.set_double(i, b)?;
            self.set_double(j, a)
        } else {
            let a = self.get_long(i)?;
            let b = self.get_long(j)?;
            self.set_long(i, b)?;
            self.set_long(j, a)
        }
    }

    /// An updatable view of the half-open range `from..to`.
    fn subarray_upd(&self, from: u64, to: u64) -> Result<UpdRef>
    {
        SubArrayUpd::new(self.clone_upd(), from, to).map(|sub| Arc::new(sub) as UpdRef)
    }

    /// A handle that duplicates the backing storage at its first write.
    fn as_copy_on_next_write(&self) -> UpdRef;
}

/// Resize capability.
pub trait MutableArray: UpdatableArray
{
    /// A new resizable handle over the same storage.
    fn clone_mut(&self) -> MutRef;

    /// Grow (zero-filling) or shrink the array.
    fn set_len(&self, new_len: u64) -> Result<()>;
}

#[inline]
fn clamp_scan_range(len: u64, lo: i64, hi: i64) -> (u64, u64)
{
    let from = lo.max(0) as u64;
    let to = if hi < 0 { 0 } else { (hi as u64).min(len) };
    (from, to.max(from))
}

/// The scalar fallback behind the default `get_data`.
pub(crate) fn scalar_get_data<A: Array + ?Sized>(
    a: &A, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize,
) -> Result<()>
{
    if dst.kind() != a.kind() {
        return Err(ArrayError::array_store(a.kind(), dst.kind()));
    }
    check_range(a.len(), pos, count as u64)?;
    check_buffer(dst.len(), dst_off, count)?;
    match dst {
        DataDst::Bits(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_bit(pos + k as u64)?;
            }
        }
        DataDst::Chars(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_int(pos + k as u64)? as u16;
            }
        }
        DataDst::Bytes(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_int(pos + k as u64)? as u8;
            }
        }
        DataDst::Shorts(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_int(pos + k as u64)? as u16;
            }
        }
        DataDst::Ints(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_int(pos + k as u64)?;
            }
        }
        DataDst::Longs(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_long(pos + k as u64)?;
            }
        }
        DataDst::Floats(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_float(pos + k as u64)?;
            }
        }
        DataDst::Doubles(s) => {
            for k in 0..count {
                s[dst_off + k] = a.get_double(pos + k as u64)?;
            }
        }
    }
    Ok(())
}

/// The scalar fallback behind the default `set_data`.
pub(crate) fn scalar_set_data<A: UpdatableArray + ?Sized>(
    a: &A, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize,
) -> Result<()>
{
    if src.kind() != a.kind() {
        return Err(ArrayError::array_store(a.kind(), src.kind()));
    }
    check_range(a.len(), pos, count as u64)?;
    check_buffer(src.len(), src_off, count)?;
    match src {
        DataSrc::Bits(s) => {
            for k in 0..count {
                a.set_bit(pos + k as u64, s[src_off + k])?;
            }
        }
        DataSrc::Chars(s) => {
            for k in 0..count {
                a.set_long(pos + k as u64, s[src_off + k] as i64)?;
            }
        }
        DataSrc::Bytes(s) => {
            for k in 0..count {
                a.set_long(pos + k as u64, s[src_off + k] as i64)?;
            }
        }
        DataSrc::Shorts(s) => {
            for k in 0..count {
                a.set_long(pos + k as u64, s[src_off + k] as i64)?;
            }
        }
        DataSrc::Ints(s) => {
            for k in 0..count {
                a.set_long(pos + k as u64, s[src_off + k] as i64)?;
            }
        }
        DataSrc::Longs(s) => {
            for k in 0..count {
                a.set_long(pos + k as u64, s[src_off + k])?;
            }
        }
        DataSrc::Floats(s) => {
            for k in 0..count {
                a.set_double(pos + k as u64, s[src_off + k] as f64)?;
            }
        }
        DataSrc::Doubles(s) => {
            for k in 0..count {
                a.set_double(pos + k as u64, s[src_off + k])?;
            }
        }
    }
    Ok(())
}

/// Scalar packed read for any bit-kind array.
pub(crate) fn scalar_get_bits<A: Array + ?Sized>(
    a: &A, pos: u64, dst: &mut [u64], dst_off: u64, count: u64,
) -> Result<()>
{
    if a.kind() != ElementKind::Bit {
        return Err(ArrayError::invalid_argument("get_bits requires a bit array"));
    }
    check_range(a.len(), pos, count)?;
    check_range(dst.len() as u64 * 64, dst_off, count)?;
    for k in 0..count {
        let bit = a.get_bit(pos + k)?;
        let at = dst_off + k;
        let word = &mut dst[(at >> 6) as usize];
        let mask = 1u64 << (at & 63);
        if bit {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }
    Ok(())
}

/// Scalar packed write for any bit-kind updatable array.
pub(crate) fn scalar_set_bits<A: UpdatableArray + ?Sized>(
    a: &A, pos: u64, src: &[u64], src_off: u64, count: u64,
) -> Result<()>
{
    if a.kind() != ElementKind::Bit {
        return Err(ArrayError::invalid_argument("set_bits requires a bit array"));
    }
    check_range(a.len(), pos, count)?;
    check_range(src.len() as u64 * 64, src_off, count)?;
    for k in 0..count {
        let at = src_off + k;
        let bit = src[(at >> 6) as usize] >> (at & 63) & 1 != 0;
        a.set_bit(pos + k, bit)?;
    }
    Ok(())
}

fn copy_chunks<T: Prim + PoolItem>(
    ctx: &dyn Context,
    dest: &dyn UpdatableArray,
    src: &dyn Array,
    count: u64,
    wrap_dst: impl Fn(&mut [T]) -> DataDst<'_>,
    wrap_src: impl Fn(&[T]) -> DataSrc<'_>,
) -> Result<()>
{
    let mut buf = T::pool().acquire();
    let chunk = buf.len() as u64;
    let mut done = 0u64;
    while done < count {
        ctx.checked()?;
        let n = chunk.min(count - done) as usize;
        src.get_data(done, &mut wrap_dst(&mut buf[..n]), 0, n)?;
        dest.set_data(done, &wrap_src(&buf[..n]), 0, n)?;
        done += n as u64;
        ctx.update_progress(done, count);
    }
    Ok(())
}

/// Copy `min(dest.len(), src.len())` elements from `src` into `dest`.
///
/// The long-running bulk entry point: transfers run chunk by chunk through a
/// pooled buffer, polling `ctx` between chunks. Kinds must match.
pub fn copy_array(ctx: &dyn Context, dest: &dyn UpdatableArray, src: &dyn Array) -> Result<()>
{
    if dest.kind() != src.kind() {
        return Err(ArrayError::array_store(dest.kind(), src.kind()));
    }
    let count = dest.len().min(src.len());
    match dest.kind() {
        ElementKind::Bit => copy_chunks::<bool>(ctx, dest, src, count, |b| DataDst::Bits(b), |b| DataSrc::Bits(b)),
        ElementKind::Char16 => copy_chunks::<u16>(ctx, dest, src, count, |b| DataDst::Chars(b), |b| DataSrc::Chars(b)),
        ElementKind::U8 => copy_chunks::<u8>(ctx, dest, src, count, |b| DataDst::Bytes(b), |b| DataSrc::Bytes(b)),
        ElementKind::U16 => copy_chunks::<u16>(ctx, dest, src, count, |b| DataDst::Shorts(b), |b| DataSrc::Shorts(b)),
        ElementKind::I32 => copy_chunks::<i32>(ctx, dest, src, count, |b| DataDst::Ints(b), |b| DataSrc::Ints(b)),
        ElementKind::I64 => copy_chunks::<i64>(ctx, dest, src, count, |b| DataDst::Longs(b), |b| DataSrc::Longs(b)),
        ElementKind::F32 => copy_chunks::<f32>(ctx, dest, src, count, |b| DataDst::Floats(b), |b| DataSrc::Floats(b)),
        ElementKind::F64 => copy_chunks::<f64>(ctx, dest, src, count, |b| DataDst::Doubles(b), |b| DataSrc::Doubles(b)),
    }
}
