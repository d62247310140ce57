// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The specialized read views behind the composition layer, each with its
//! dedicated bulk kernel.
//!
//! Every kernel is chunked by the pool buffer length and produces bit-exact
//! agreement with the scalar getters of the same view. Integer pipelines stay
//! in `i64`; only the generic any-func path and the linear path pivot through
//! `f64`.

use std::any::Any;
use std::sync::Arc;

use crate::array::{check_buffer, check_index, check_range, ArrRef, Array, ArrayFlags, DataDst};
use crate::error::{ArrayError, Result};
use crate::kind::{ElementKind, Kind, Prim};
use crate::pool::PoolItem;

use super::Func;

pub(crate) fn view_flags() -> ArrayFlags
{
    ArrayFlags {
        immutable: true,
        unresizable: true,
        lazy: true,
        new_read_only_view: true,
        ..ArrayFlags::default()
    }
}

fn pull_typed<T: Prim + PoolItem>(
    src: &dyn Array,
    pos: u64,
    out: &mut [T],
    wrap: impl Fn(&mut [T]) -> DataDst<'_>,
) -> Result<()>
{
    let len = out.len();
    src.get_data(pos, &mut wrap(out), 0, len)
}

macro_rules! dispatch_pull {
    ($src:expr, $pos:expr, $out:expr, $conv:expr) => {{
        let src: &dyn Array = $src;
        let out = $out;
        match src.kind() {
            ElementKind::Bit => pull_converted::<bool, _>(src, $pos, out, |b| DataDst::Bits(b), $conv),
            ElementKind::Char16 => pull_converted::<u16, _>(src, $pos, out, |b| DataDst::Chars(b), $conv),
            ElementKind::U8 => pull_converted::<u8, _>(src, $pos, out, |b| DataDst::Bytes(b), $conv),
            ElementKind::U16 => pull_converted::<u16, _>(src, $pos, out, |b| DataDst::Shorts(b), $conv),
            ElementKind::I32 => pull_converted::<i32, _>(src, $pos, out, |b| DataDst::Ints(b), $conv),
            ElementKind::I64 => pull_converted::<i64, _>(src, $pos, out, |b| DataDst::Longs(b), $conv),
            ElementKind::F32 => pull_converted::<f32, _>(src, $pos, out, |b| DataDst::Floats(b), $conv),
            ElementKind::F64 => pull_converted::<f64, _>(src, $pos, out, |b| DataDst::Doubles(b), $conv),
        }
    }};
}

fn pull_converted<T: Prim + PoolItem, U: Copy>(
    src: &dyn Array,
    pos: u64,
    out: &mut [U],
    wrap: impl Fn(&mut [T]) -> DataDst<'_>,
    conv: impl Fn(T) -> U,
) -> Result<()>
{
    let mut buf = T::pool().acquire();
    let chunk = buf.len();
    let mut done = 0;
    while done < out.len() {
        let n = chunk.min(out.len() - done);
        pull_typed(src, pos + done as u64, &mut buf[..n], &wrap)?;
        for j in 0..n {
            out[done + j] = conv(buf[j]);
        }
        done += n;
    }
    Ok(())
}

/// Bulk-read any-kind `src` into an `f64` slice.
pub(crate) fn pull_doubles(src: &dyn Array, pos: u64, out: &mut [f64]) -> Result<()>
{
    dispatch_pull!(src, pos, out, |x: _| Prim::to_f64(x))
}

/// Bulk-read any-kind `src` into an `i64` slice with external semantics.
pub(crate) fn pull_longs(src: &dyn Array, pos: u64, out: &mut [i64]) -> Result<()>
{
    dispatch_pull!(src, pos, out, |x: _| Prim::to_i64(x))
}

/// Shared validation for every bulk kernel; returns the checked output slice.
pub(crate) fn checked_out<'a, 'b, K: Kind>(
    len: u64,
    pos: u64,
    dst: &'a mut DataDst<'b>,
    dst_off: usize,
    count: usize,
) -> Result<&'a mut [K::Repr]>
{
    if dst.kind() != K::KIND {
        return Err(ArrayError::array_store(K::KIND, dst.kind()));
    }
    check_buffer(dst.len(), dst_off, count)?;
    check_range(len, pos, count as u64)?;
    let out = K::dst_slice(dst).expect("kind checked above");
    Ok(&mut out[dst_off..dst_off + count])
}

/// An `n_copies`-style array: `len` copies of one value.
pub struct ConstantArray<K: Kind>
{
    len: u64,
    value: K::Repr,
}

impl<K: Kind> ConstantArray<K>
{
    pub(crate) fn new(len: u64, value: K::Repr) -> Self
    {
        ConstantArray { len, value }
    }
}

impl<K: Kind> Clone for ConstantArray<K>
{
    fn clone(&self) -> Self
    {
        ConstantArray { len: self.len, value: self.value }
    }
}

impl<K: Kind> Array for ConstantArray<K>
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

    fn constant_value(&self) -> Option<f64>
    {
        Some(self.value.to_f64())
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        check_index(self.len, index)?;
        Ok(self.value.to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_index(self.len, index)?;
        Ok(self.value.to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let out = checked_out::<K>(self.len, pos, dst, dst_off, count)?;
        out.fill(self.value);
        Ok(())
    }

    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let from = lo.max(0) as u64;
        let to = if hi < 0 { 0 } else { (hi as u64).min(self.len) };
        if from < to && self.value.to_f64() == value {
            from as i64
        } else {
            -1
        }
    }

    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let from = lo.max(0) as u64;
        let to = if hi < 0 { 0 } else { (hi as u64).min(self.len) };
        if from < to && self.value.to_f64() == value {
            to as i64 - 1
        } else {
            -1
        }
    }
}

/// A kind-conversion view: the identity function plus narrowing.
pub struct CastArray<K: Kind>
{
    src: ArrRef,
    truncate: bool,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> CastArray<K>
{
    pub(crate) fn new(truncate: bool, src: ArrRef) -> Self
    {
        CastArray { src, truncate, _kind: std::marker::PhantomData }
    }

    #[inline]
    fn element(&self, index: u64) -> Result<K::Repr>
    {
        if self.src.kind().is_float() {
            Ok(K::Repr::from_f64(self.src.get_double(index)?, self.truncate))
        } else {
            Ok(K::Repr::from_i64(self.src.get_long(index)?, self.truncate))
        }
    }
}

impl<K: Kind> Clone for CastArray<K>
{
    fn clone(&self) -> Self
    {
        CastArray { src: self.src.clone_ref(), truncate: self.truncate, _kind: std::marker::PhantomData }
    }
}

impl<K: Kind> Array for CastArray<K>
{
    fn len(&self) -> u64
    {
        self.src.len()
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
        let out = checked_out::<K>(self.src.len(), pos, dst, dst_off, count)?;
        let truncate = self.truncate;
        if self.src.kind().is_float() {
            let mut buf = <f64 as PoolItem>::pool().acquire();
            let chunk = buf.len();
            let mut done = 0;
            while done < out.len() {
                let n = chunk.min(out.len() - done);
                pull_doubles(&*self.src, pos + done as u64, &mut buf[..n])?;
                for j in 0..n {
                    out[done + j] = K::Repr::from_f64(buf[j], truncate);
                }
                done += n;
            }
        } else {
            let mut buf = <i64 as PoolItem>::pool().acquire();
            let chunk = buf.len();
            let mut done = 0;
            while done < out.len() {
                let n = chunk.min(out.len() - done);
                pull_longs(&*self.src, pos + done as u64, &mut buf[..n])?;
                for j in 0..n {
                    out[done + j] = K::Repr::from_i64(buf[j], truncate);
                }
                done += n;
            }
        }
        Ok(())
    }
}

/// The table kernel: a single source of at most 16 bits, any pure function,
/// precomputed into a lookup table at view construction.
pub struct TableArray<K: Kind>
{
    src: ArrRef,
    table: Arc<[K::Repr]>,
}

impl<K: Kind> TableArray<K>
{
    /// Precompute `table[v] = narrow(f(v))` over the source kind's domain.
    pub(crate) fn new(truncate: bool, f: &Func, src: ArrRef) -> Self
    {
        let bits = src.kind().bits_per_element();
        debug_assert!(bits <= 16, "table kernel requires a source of at most 16 bits");
        let table: Vec<K::Repr> = (0..1u32 << bits)
            .map(|v| K::Repr::from_f64(f.get(&[v as f64]), truncate))
            .collect();
        TableArray { src, table: table.into() }
    }
}

impl<K: Kind> Clone for TableArray<K>
{
    fn clone(&self) -> Self
    {
        TableArray { src: self.src.clone_ref(), table: Arc::clone(&self.table) }
    }
}

impl<K: Kind> Array for TableArray<K>
{
    fn len(&self) -> u64
    {
        self.src.len()
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
        Ok(self.table[self.src.get_int(index)? as usize].to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        Ok(self.table[self.src.get_int(index)? as usize].to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let out = checked_out::<K>(self.src.len(), pos, dst, dst_off, count)?;
        let table = &self.table;
        match self.src.kind() {
            ElementKind::Bit => {
                table_kernel::<bool, K>(&*self.src, pos, out, |b| DataDst::Bits(b), table, |x| x as usize)
            }
            ElementKind::U8 => {
                table_kernel::<u8, K>(&*self.src, pos, out, |b| DataDst::Bytes(b), table, |x| x as usize)
            }
            ElementKind::Char16 => {
                table_kernel::<u16, K>(&*self.src, pos, out, |b| DataDst::Chars(b), table, |x| x as usize)
            }
            ElementKind::U16 => {
                table_kernel::<u16, K>(&*self.src, pos, out, |b| DataDst::Shorts(b), table, |x| x as usize)
            }
            _ => unreachable!("table kernel requires a source of at most 16 bits"),
        }
    }
}

fn table_kernel<T: Prim + PoolItem, K: Kind>(
    src: &dyn Array,
    pos: u64,
    out: &mut [K::Repr],
    wrap: impl Fn(&mut [T]) -> DataDst<'_>,
    table: &[K::Repr],
    idx: impl Fn(T) -> usize,
) -> Result<()>
{
    let mut buf = T::pool().acquire();
    let chunk = buf.len();
    let mut done = 0;
    while done < out.len() {
        let n = chunk.min(out.len() - done);
        pull_typed(src, pos + done as u64, &mut buf[..n], &wrap)?;
        for j in 0..n {
            out[done + j] = table[idx(buf[j])];
        }
        done += n;
    }
    Ok(())
}

/// The linear kernel: `narrow(a_0·x_0 + ... + b)` per element.
pub struct LinearArray<K: Kind>
{
    a: Arc<[f64]>,
    b: f64,
    non_weighted: bool,
    xs: Arc<[ArrRef]>,
    truncate: bool,
    len: u64,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> LinearArray<K>
{
    pub(crate) fn new(truncate: bool, a: Arc<[f64]>, b: f64, xs: Arc<[ArrRef]>) -> Self
    {
        let len = xs[0].len();
        let non_weighted = a.windows(2).all(|w| w[0] == w[1]);
        LinearArray { a, b, non_weighted, xs, truncate, len, _kind: std::marker::PhantomData }
    }

    // Mirrors the bulk kernel's operation order exactly, so scalar reads and
    // bulk reads agree bit for bit.
    fn raw(&self, index: u64) -> Result<f64>
    {
        check_index(self.len, index)?;
        if self.non_weighted {
            let mut acc = 0.0;
            for x in self.xs.iter() {
                acc += x.get_double(index)?;
            }
            Ok(acc * self.a[0] + self.b)
        } else {
            let mut acc = self.b;
            for (c, x) in self.a.iter().zip(self.xs.iter()) {
                acc += c * x.get_double(index)?;
            }
            Ok(acc)
        }
    }
}

impl<K: Kind> Clone for LinearArray<K>
{
    fn clone(&self) -> Self
    {
        LinearArray {
            a: Arc::clone(&self.a),
            b: self.b,
            non_weighted: self.non_weighted,
            xs: Arc::clone(&self.xs),
            truncate: self.truncate,
            len: self.len,
            _kind: std::marker::PhantomData,
        }
    }
}

impl<K: Kind> Array for LinearArray<K>
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
        Ok(K::Repr::from_f64(self.raw(index)?, self.truncate).to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        Ok(K::Repr::from_f64(self.raw(index)?, self.truncate).to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let out = checked_out::<K>(self.len, pos, dst, dst_off, count)?;
        let mut acc = <f64 as PoolItem>::pool().acquire();
        let mut tmp = <f64 as PoolItem>::pool().acquire();
        let chunk = acc.len();
        let mut done = 0;
        while done < out.len() {
            let n = chunk.min(out.len() - done);
            let at = pos + done as u64;
            if self.non_weighted {
                // one accumulation pass, one final multiply
                acc[..n].fill(0.0);
                for x in self.xs.iter() {
                    pull_doubles(&**x, at, &mut tmp[..n])?;
                    for j in 0..n {
                        acc[j] += tmp[j];
                    }
                }
                let scale = self.a[0];
                for j in 0..n {
                    out[done + j] = K::Repr::from_f64(acc[j] * scale + self.b, self.truncate);
                }
            } else {
                acc[..n].fill(self.b);
                for (c, x) in self.a.iter().zip(self.xs.iter()) {
                    pull_doubles(&**x, at, &mut tmp[..n])?;
                    for j in 0..n {
                        acc[j] += c * tmp[j];
                    }
                }
                for j in 0..n {
                    out[done + j] = K::Repr::from_f64(acc[j], self.truncate);
                }
            }
            done += n;
        }
        Ok(())
    }
}

/// The N-ary min/max kernel over equal-kind sources.
pub struct MinMaxArray<K: Kind>
{
    max: bool,
    xs: Arc<[ArrRef]>,
    len: u64,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> MinMaxArray<K>
{
    pub(crate) fn new(max: bool, xs: Arc<[ArrRef]>) -> Self
    {
        let len = xs[0].len();
        MinMaxArray { max, xs, len, _kind: std::marker::PhantomData }
    }

    pub(crate) fn op(&self) -> bool
    {
        self.max
    }

    pub(crate) fn sources(&self) -> &[ArrRef]
    {
        &self.xs
    }

    fn fold(&self, a: K::Repr, b: K::Repr) -> K::Repr
    {
        if self.max {
            a.pmax(b)
        } else {
            a.pmin(b)
        }
    }

    // Sources share this view's kind, so the fold never narrows; integer
    // inputs stay in the i64 pipeline.
    fn element(&self, index: u64) -> Result<K::Repr>
    {
        check_index(self.len, index)?;
        let read = |x: &ArrRef| -> Result<K::Repr> {
            if K::KIND.is_float() {
                Ok(K::Repr::from_f64_wrap(x.get_double(index)?))
            } else {
                Ok(K::Repr::from_i64_wrap(x.get_long(index)?))
            }
        };
        let mut acc = read(&self.xs[0])?;
        for x in &self.xs[1..] {
            acc = self.fold(acc, read(x)?);
        }
        Ok(acc)
    }
}

impl<K: Kind> Clone for MinMaxArray<K>
{
    fn clone(&self) -> Self
    {
        MinMaxArray { max: self.max, xs: Arc::clone(&self.xs), len: self.len, _kind: std::marker::PhantomData }
    }
}

impl<K: Kind> Array for MinMaxArray<K>
where K::Repr: PoolItem
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
        let mut buf = <K::Repr as PoolItem>::pool().acquire();
        let chunk = buf.len();
        let mut done = 0;
        while done < out.len() {
            let n = chunk.min(out.len() - done);
            let at = pos + done as u64;
            let slot = &mut out[done..done + n];
            pull_typed(&*self.xs[0], at, &mut buf[..n], kind_dst::<K>)?;
            slot.copy_from_slice(&buf[..n]);
            for x in &self.xs[1..] {
                pull_typed(&**x, at, &mut buf[..n], kind_dst::<K>)?;
                for j in 0..n {
                    slot[j] = self.fold(slot[j], buf[j]);
                }
            }
            done += n;
        }
        Ok(())
    }
}

/// Build the `DataDst` variant matching `K` over a typed slice.
fn kind_dst<K: Kind>(s: &mut [K::Repr]) -> DataDst<'_>
{
    K::make_dst(s)
}

/// Which difference a [`DiffArray`] computes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DiffOp
{
    /// `|x - y|`; XOR on bits.
    Abs,
    /// `max(x - y, 0)` with saturation; AND-NOT on bits.
    Positive,
    /// `x - y` narrowed by the view policy.
    Plain,
}

/// The difference kernel over two equal-kind sources.
pub struct DiffArray<K: Kind>
{
    op: DiffOp,
    truncate: bool,
    x: ArrRef,
    y: ArrRef,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> DiffArray<K>
{
    pub(crate) fn new(op: DiffOp, truncate: bool, x: ArrRef, y: ArrRef) -> Self
    {
        DiffArray { op, truncate, x, y, _kind: std::marker::PhantomData }
    }

    #[inline]
    fn diff_long(&self, a: i64, b: i64) -> K::Repr
    {
        let d = a - b;
        match self.op {
            DiffOp::Positive => K::Repr::from_i64_sat(d.max(0)),
            DiffOp::Abs => K::Repr::from_i64(d.wrapping_abs(), self.truncate),
            DiffOp::Plain => K::Repr::from_i64(d, self.truncate),
        }
    }

    #[inline]
    fn diff_double(&self, a: f64, b: f64) -> K::Repr
    {
        let d = match self.op {
            DiffOp::Positive => (a - b).max(0.0),
            DiffOp::Abs => (a - b).abs(),
            DiffOp::Plain => a - b,
        };
        K::Repr::from_f64(d, self.truncate)
    }

    fn element(&self, index: u64) -> Result<K::Repr>
    {
        if K::KIND.is_float() {
            Ok(self.diff_double(self.x.get_double(index)?, self.y.get_double(index)?))
        } else {
            Ok(self.diff_long(self.x.get_long(index)?, self.y.get_long(index)?))
        }
    }
}

impl<K: Kind> Clone for DiffArray<K>
{
    fn clone(&self) -> Self
    {
        DiffArray {
            op: self.op,
            truncate: self.truncate,
            x: self.x.clone_ref(),
            y: self.y.clone_ref(),
            _kind: std::marker::PhantomData,
        }
    }
}

impl<K: Kind> Array for DiffArray<K>
where K::Repr: PoolItem
{
    fn len(&self) -> u64
    {
        self.x.len()
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
        check_index(self.x.len(), index)?;
        Ok(self.element(index)?.to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        check_index(self.x.len(), index)?;
        Ok(self.element(index)?.to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        let out = checked_out::<K>(self.x.len(), pos, dst, dst_off, count)?;
        let mut bufx = <K::Repr as PoolItem>::pool().acquire();
        let mut bufy = <K::Repr as PoolItem>::pool().acquire();
        let chunk = bufx.len();
        let mut done = 0;
        while done < out.len() {
            let n = chunk.min(out.len() - done);
            let at = pos + done as u64;
            pull_typed(&*self.x, at, &mut bufx[..n], kind_dst::<K>)?;
            pull_typed(&*self.y, at, &mut bufy[..n], kind_dst::<K>)?;
            if K::KIND.is_float() {
                for j in 0..n {
                    out[done + j] = self.diff_double(bufx[j].to_f64(), bufy[j].to_f64());
                }
            } else {
                for j in 0..n {
                    out[done + j] = self.diff_long(bufx[j].to_i64(), bufy[j].to_i64());
                }
            }
            done += n;
        }
        Ok(())
    }
}

/// The generic fallback: materialize arguments as `f64` and call the
/// function per element.
pub struct AnyFuncArray<K: Kind>
{
    f: Func,
    xs: Arc<[ArrRef]>,
    truncate: bool,
    len: u64,
    _kind: std::marker::PhantomData<K>,
}

impl<K: Kind> AnyFuncArray<K>
{
    pub(crate) fn new(truncate: bool, f: Func, xs: Arc<[ArrRef]>) -> Self
    {
        let len = xs[0].len();
        AnyFuncArray { f, xs, truncate, len, _kind: std::marker::PhantomData }
    }

    fn element(&self, index: u64) -> Result<K::Repr>
    {
        check_index(self.len, index)?;
        let mut args = Vec::with_capacity(self.xs.len());
        for x in self.xs.iter() {
            args.push(x.get_double(index)?);
        }
        Ok(K::Repr::from_f64(self.f.get(&args), self.truncate))
    }
}

impl<K: Kind> Clone for AnyFuncArray<K>
{
    fn clone(&self) -> Self
    {
        AnyFuncArray {
            f: self.f.clone(),
            xs: Arc::clone(&self.xs),
            truncate: self.truncate,
            len: self.len,
            _kind: std::marker::PhantomData,
        }
    }
}

impl<K: Kind> Array for AnyFuncArray<K>
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
        let mut bufs = Vec::with_capacity(self.xs.len());
        for _ in 0..self.xs.len() {
            bufs.push(<f64 as PoolItem>::pool().acquire());
        }
        let chunk = bufs.first().map_or(out.len().max(1), |b| b.len());
        let mut args = vec![0.0; self.xs.len()];
        let mut done = 0;
        while done < out.len() {
            let n = chunk.min(out.len() - done);
            let at = pos + done as u64;
            for (x, buf) in self.xs.iter().zip(bufs.iter_mut()) {
                pull_doubles(&**x, at, &mut buf[..n])?;
            }
            for j in 0..n {
                for (slot, buf) in args.iter_mut().zip(bufs.iter()) {
                    *slot = buf[j];
                }
                out[done + j] = K::Repr::from_f64(self.f.get(&args), self.truncate);
            }
            done += n;
        }
        Ok(())
    }
}
