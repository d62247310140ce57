// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Heap-backed arrays of the seven unpacked kinds, and their constructors.
//!
//! Storage lives in an `Arc<Vec<_>>` behind a reader-writer lock. A
//! copy-on-next-write handle clones the outer cell but shares the inner
//! `Arc`; the first write on either side goes through `Arc::make_mut`, which
//! duplicates the vector exactly when it is shared. Readers holding the lock
//! never observe a half-written copy transition.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::array::{
    check_buffer, check_index, check_range, ArrRef, Array, ArrayFlags, DataDst, DataSrc, MutRef,
    MutableArray, UpdRef, UpdatableArray,
};
use crate::error::{ArrayError, Result};
use crate::kind::{ByteK, CharK, DoubleK, ElementKind, FloatK, IntK, Kind, LongK, Prim, ShortK};

use super::bit::BitMemArray;

pub(crate) struct Cell<T>
{
    data: RwLock<Arc<Vec<T>>>,
    cow: AtomicBool,
}

impl<T: Prim> Cell<T>
{
    pub(crate) fn new(data: Vec<T>) -> Arc<Self>
    {
        Arc::new(Cell {
            data: RwLock::new(Arc::new(data)),
            cow: AtomicBool::new(false),
        })
    }

    pub(crate) fn read(&self) -> std::sync::RwLockReadGuard<'_, Arc<Vec<T>>>
    {
        self.data.read().expect("array storage lock poisoned")
    }

    /// Exclusive access, performing the copy-on-next-write transition first.
    pub(crate) fn write(&self) -> std::sync::RwLockWriteGuard<'_, Arc<Vec<T>>>
    {
        let mut guard = self.data.write().expect("array storage lock poisoned");
        if Arc::get_mut(&mut guard).is_none() {
            let copy = guard.as_ref().clone();
            *guard = Arc::new(copy);
        }
        self.cow.store(false, Ordering::Relaxed);
        guard
    }

    /// A sibling cell sharing the vector until either side writes.
    pub(crate) fn cow_clone(&self) -> Arc<Self>
    {
        Arc::new(Cell {
            data: RwLock::new(self.read().clone()),
            cow: AtomicBool::new(true),
        })
    }

    pub(crate) fn is_cow(&self) -> bool
    {
        self.cow.load(Ordering::Relaxed)
    }
}

/// A heap-backed array of one non-bit element kind.
pub struct MemArray<K: Kind>
{
    cell: Arc<Cell<K::Repr>>,
    unresizable: bool,
    _kind: PhantomData<K>,
}

impl<K: Kind> Clone for MemArray<K>
{
    fn clone(&self) -> Self
    {
        MemArray {
            cell: Arc::clone(&self.cell),
            unresizable: self.unresizable,
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> MemArray<K>
{
    /// A zero-filled array of `len` elements.
    pub fn zeroed(len: u64) -> Result<Self>
    {
        let len = usize::try_from(len)
            .ok()
            .filter(|&n| n as u64 <= i64::MAX as u64)
            .ok_or(ArrayError::overflow())?;
        Ok(MemArray::from_vec(vec![K::Repr::ZERO; len]))
    }

    pub fn from_vec(data: Vec<K::Repr>) -> Self
    {
        MemArray {
            cell: Cell::new(data),
            unresizable: false,
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> Array for MemArray<K>
{
    fn len(&self) -> u64
    {
        self.cell.read().len() as u64
    }

    fn kind(&self) -> ElementKind
    {
        K::KIND
    }

    fn flags(&self) -> ArrayFlags
    {
        ArrayFlags {
            unresizable: self.unresizable,
            copy_on_next_write: self.cell.is_cow(),
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
        Ok(Arc::new(self.clone()))
    }

    fn get_double(&self, index: u64) -> Result<f64>
    {
        let data = self.cell.read();
        check_index(data.len() as u64, index)?;
        Ok(data[index as usize].to_f64())
    }

    fn get_long(&self, index: u64) -> Result<i64>
    {
        let data = self.cell.read();
        check_index(data.len() as u64, index)?;
        Ok(data[index as usize].to_i64())
    }

    fn get_data(&self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize) -> Result<()>
    {
        if dst.kind() != K::KIND {
            return Err(ArrayError::array_store(K::KIND, dst.kind()));
        }
        check_buffer(dst.len(), dst_off, count)?;
        let data = self.cell.read();
        check_range(data.len() as u64, pos, count as u64)?;
        let out = K::dst_slice(dst).expect("kind checked above");
        out[dst_off..dst_off + count].copy_from_slice(&data[pos as usize..pos as usize + count]);
        Ok(())
    }

    fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let target = K::Repr::from_f64_wrap(value);
        if target.to_f64() != value {
            return -1;
        }
        let data = self.cell.read();
        let from = lo.max(0) as usize;
        let to = (hi.max(0) as u64).min(data.len() as u64) as usize;
        data[from.min(to)..to]
            .iter()
            .position(|&x| x == target)
            .map_or(-1, |k| (from + k) as i64)
    }

    fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
    {
        let target = K::Repr::from_f64_wrap(value);
        if target.to_f64() != value {
            return -1;
        }
        let data = self.cell.read();
        let from = lo.max(0) as usize;
        let to = (hi.max(0) as u64).min(data.len() as u64) as usize;
        data[from.min(to)..to]
            .iter()
            .rposition(|&x| x == target)
            .map_or(-1, |k| (from + k) as i64)
    }
}

impl<K: Kind> UpdatableArray for MemArray<K>
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        let mut guard = self.cell.write();
        check_index(guard.len() as u64, index)?;
        Arc::make_mut(&mut guard)[index as usize] = K::Repr::from_f64_wrap(value);
        Ok(())
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        let mut guard = self.cell.write();
        check_index(guard.len() as u64, index)?;
        Arc::make_mut(&mut guard)[index as usize] = K::Repr::from_i64_wrap(value);
        Ok(())
    }

    fn set_data(&self, pos: u64, src: &DataSrc<'_>, src_off: usize, count: usize) -> Result<()>
    {
        if src.kind() != K::KIND {
            return Err(ArrayError::array_store(K::KIND, src.kind()));
        }
        check_buffer(src.len(), src_off, count)?;
        let mut guard = self.cell.write();
        check_range(guard.len() as u64, pos, count as u64)?;
        let input = K::src_slice(src).expect("kind checked above");
        Arc::make_mut(&mut guard)[pos as usize..pos as usize + count]
            .copy_from_slice(&input[src_off..src_off + count]);
        Ok(())
    }

    fn fill(&self, pos: u64, count: u64, value: f64) -> Result<()>
    {
        let mut guard = self.cell.write();
        check_range(guard.len() as u64, pos, count)?;
        let v = K::Repr::from_f64_wrap(value);
        Arc::make_mut(&mut guard)[pos as usize..(pos + count) as usize].fill(v);
        Ok(())
    }

    fn swap(&self, i: u64, j: u64) -> Result<()>
    {
        let mut guard = self.cell.write();
        check_index(guard.len() as u64, i)?;
        check_index(guard.len() as u64, j)?;
        Arc::make_mut(&mut guard).swap(i as usize, j as usize);
        Ok(())
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        Arc::new(MemArray::<K> {
            cell: self.cell.cow_clone(),
            unresizable: self.unresizable,
            _kind: PhantomData,
        })
    }
}

impl<K: Kind> MutableArray for MemArray<K>
{
    fn clone_mut(&self) -> MutRef
    {
        Arc::new(self.clone())
    }

    fn set_len(&self, new_len: u64) -> Result<()>
    {
        if self.unresizable {
            return Err(ArrayError::unallowed_mutation());
        }
        let new_len = usize::try_from(new_len)
            .ok()
            .filter(|&n| n as u64 <= i64::MAX as u64)
            .ok_or(ArrayError::overflow())?;
        let mut guard = self.cell.write();
        Arc::make_mut(&mut guard).resize(new_len, K::Repr::ZERO);
        Ok(())
    }
}

/// The in-memory memory model: plain heap vectors, no external resources.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimpleMemoryModel;

impl SimpleMemoryModel
{
    /// A zero-filled resizable array of the requested kind.
    pub fn new_array(self, kind: ElementKind, len: u64) -> Result<MutRef>
    {
        Ok(match kind {
            ElementKind::Bit => Arc::new(BitMemArray::zeroed(len)?),
            ElementKind::Char16 => Arc::new(MemArray::<CharK>::zeroed(len)?),
            ElementKind::U8 => Arc::new(MemArray::<ByteK>::zeroed(len)?),
            ElementKind::U16 => Arc::new(MemArray::<ShortK>::zeroed(len)?),
            ElementKind::I32 => Arc::new(MemArray::<IntK>::zeroed(len)?),
            ElementKind::I64 => Arc::new(MemArray::<LongK>::zeroed(len)?),
            ElementKind::F32 => Arc::new(MemArray::<FloatK>::zeroed(len)?),
            ElementKind::F64 => Arc::new(MemArray::<DoubleK>::zeroed(len)?),
        })
    }

    pub fn from_bits(self, data: &[bool]) -> MutRef
    {
        Arc::new(BitMemArray::from_bools(data))
    }

    pub fn from_chars(self, data: &[u16]) -> MutRef
    {
        Arc::new(MemArray::<CharK>::from_vec(data.to_vec()))
    }

    pub fn from_bytes(self, data: &[u8]) -> MutRef
    {
        Arc::new(MemArray::<ByteK>::from_vec(data.to_vec()))
    }

    pub fn from_shorts(self, data: &[u16]) -> MutRef
    {
        Arc::new(MemArray::<ShortK>::from_vec(data.to_vec()))
    }

    pub fn from_ints(self, data: &[i32]) -> MutRef
    {
        Arc::new(MemArray::<IntK>::from_vec(data.to_vec()))
    }

    pub fn from_longs(self, data: &[i64]) -> MutRef
    {
        Arc::new(MemArray::<LongK>::from_vec(data.to_vec()))
    }

    pub fn from_floats(self, data: &[f32]) -> MutRef
    {
        Arc::new(MemArray::<FloatK>::from_vec(data.to_vec()))
    }

    pub fn from_doubles(self, data: &[f64]) -> MutRef
    {
        Arc::new(MemArray::<DoubleK>::from_vec(data.to_vec()))
    }
}
