// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Two-way function views: reading composes the function, writing pushes the
//! changed result back into the source arrays.
//!
//! Store-back policies per input kind: bounded integer inputs clamp to their
//! possible range when the view truncates, `I64` inputs go through `set_long`
//! to keep 64-bit precision, everything else stores the plain double.

use std::any::Any;
use std::sync::Arc;

use crate::array::{check_index, ArrRef, Array, ArrayFlags, DataDst, UpdRef, UpdatableArray};
use crate::error::{ArrayError, Result};
use crate::kind::{
    BitK, ByteK, CharK, DoubleK, ElementKind, FloatK, IntK, Kind, LongK, Prim, ShortK,
};

use super::compose::for_kind;
use super::views::{AnyFuncArray, CastArray, LinearArray};
use super::{LinearFunc, UpdFunc};

/// Build a two-way view of `f(x_0[i], ...)` with elements of the requested
/// kind. Writes propagate through `f.set` (or the inverted linear map) into
/// the sources.
pub fn as_updatable_func_array(
    truncate: bool,
    f: &UpdFunc,
    kind: ElementKind,
    xs: &[UpdRef],
) -> Result<UpdRef>
{
    if xs.is_empty() {
        return Err(ArrayError::invalid_argument("an updatable view needs at least one argument"));
    }
    let len = xs[0].len();
    for x in xs {
        if x.len() != len {
            return Err(ArrayError::size_mismatch(len, x.len()));
        }
    }
    match f {
        UpdFunc::Identity => {
            if xs.len() != 1 {
                return Err(ArrayError::invalid_argument("the identity takes exactly one argument"));
            }
            Ok(for_kind!(kind, K => {
                Arc::new(UpdatableCastArray::<K>::new(truncate, xs[0].clone_upd())) as UpdRef
            }))
        }
        UpdFunc::Linear(lf) => {
            if xs.len() != 1 || lf.coefficients().len() != 1 {
                return Err(ArrayError::invalid_argument(
                    "an updatable linear view takes exactly one argument",
                ));
            }
            let a = lf.coefficients()[0];
            if a == 0.0 {
                return Err(ArrayError::invalid_argument(
                    "a zero linear coefficient is not invertible",
                ));
            }
            if a == 1.0 && lf.offset() == 0.0 {
                return Ok(for_kind!(kind, K => {
                    Arc::new(UpdatableCastArray::<K>::new(truncate, xs[0].clone_upd())) as UpdRef
                }));
            }
            let lf = lf.clone();
            Ok(for_kind!(kind, K => {
                Arc::new(UpdatableLinearArray::<K>::new(truncate, lf.clone(), xs[0].clone_upd()))
                    as UpdRef
            }))
        }
        UpdFunc::Any(_) => Ok(for_kind!(kind, K => {
            Arc::new(UpdatableAnyFuncArray::<K>::new(truncate, f.clone(), xs.to_vec())) as UpdRef
        })),
    }
}

/// Store `value` into input `x` at `index` under the per-kind policy.
fn store_back(x: &dyn UpdatableArray, index: u64, value: f64, truncate: bool) -> Result<()>
{
    let kind = x.kind();
    if kind == ElementKind::I64 {
        // long-precision store-back
        return x.set_long(index, value as i64);
    }
    if truncate && kind.is_integer() {
        return x.set_double(index, value.clamp(kind.min_possible(), kind.max_possible()));
    }
    x.set_double(index, value)
}

macro_rules! updatable_read_delegates {
    () => {
        fn len(&self) -> u64
        {
            self.read.len()
        }

        fn kind(&self) -> ElementKind
        {
            K::KIND
        }

        fn flags(&self) -> ArrayFlags
        {
            ArrayFlags {
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
            Ok(Arc::new(self.clone()))
        }

        fn get_double(&self, index: u64) -> Result<f64>
        {
            self.read.get_double(index)
        }

        fn get_long(&self, index: u64) -> Result<i64>
        {
            self.read.get_long(index)
        }

        fn get_data(
            &self, pos: u64, dst: &mut DataDst<'_>, dst_off: usize, count: usize,
        ) -> Result<()>
        {
            self.read.get_data(pos, dst, dst_off, count)
        }

        fn index_of(&self, lo: i64, hi: i64, value: f64) -> i64
        {
            self.read.index_of(lo, hi, value)
        }

        fn last_index_of(&self, lo: i64, hi: i64, value: f64) -> i64
        {
            self.read.last_index_of(lo, hi, value)
        }
    };
}

/// A two-way kind-conversion view.
pub struct UpdatableCastArray<K: Kind>
{
    src: UpdRef,
    truncate: bool,
    read: CastArray<K>,
}

impl<K: Kind> UpdatableCastArray<K>
{
    pub(crate) fn new(truncate: bool, src: UpdRef) -> Self
    {
        let read = CastArray::new(truncate, src.clone_ref());
        UpdatableCastArray { src, truncate, read }
    }
}

impl<K: Kind> Clone for UpdatableCastArray<K>
{
    fn clone(&self) -> Self
    {
        UpdatableCastArray {
            src: self.src.clone_upd(),
            truncate: self.truncate,
            read: self.read.clone(),
        }
    }
}

impl<K: Kind> Array for UpdatableCastArray<K>
{
    updatable_read_delegates!();
}

impl<K: Kind> UpdatableArray for UpdatableCastArray<K>
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_index(self.read.len(), index)?;
        let narrowed = K::Repr::from_f64(value, self.truncate).to_f64();
        store_back(&*self.src, index, narrowed, self.truncate)
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        check_index(self.read.len(), index)?;
        let narrowed = K::Repr::from_i64(value, self.truncate);
        if self.src.kind().is_integer() {
            self.src.set_long(index, narrowed.to_i64())
        } else {
            self.src.set_double(index, narrowed.to_f64())
        }
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        // no storage of its own; the sources keep their sharing semantics
        Arc::new(UpdatableCastArray::<K>::new(self.truncate, self.src.as_copy_on_next_write()))
    }
}

/// A two-way invertible linear view: store-back computes `(y - b) / a`
/// without consulting any `set` callback.
pub struct UpdatableLinearArray<K: Kind>
{
    src: UpdRef,
    a: f64,
    b: f64,
    truncate: bool,
    read: LinearArray<K>,
}

impl<K: Kind> UpdatableLinearArray<K>
{
    pub(crate) fn new(truncate: bool, lf: LinearFunc, src: UpdRef) -> Self
    {
        let a = lf.coefficients()[0];
        let b = lf.offset();
        let read = LinearArray::new(truncate, lf.coefficients().into(), b, vec![src.clone_ref()].into());
        UpdatableLinearArray { src, a, b, truncate, read }
    }
}

impl<K: Kind> Clone for UpdatableLinearArray<K>
{
    fn clone(&self) -> Self
    {
        UpdatableLinearArray {
            src: self.src.clone_upd(),
            a: self.a,
            b: self.b,
            truncate: self.truncate,
            read: self.read.clone(),
        }
    }
}

impl<K: Kind> Array for UpdatableLinearArray<K>
{
    updatable_read_delegates!();
}

impl<K: Kind> UpdatableArray for UpdatableLinearArray<K>
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_index(self.read.len(), index)?;
        let narrowed = K::Repr::from_f64(value, self.truncate).to_f64();
        store_back(&*self.src, index, (narrowed - self.b) / self.a, self.truncate)
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        self.set_double(index, value as f64)
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        Arc::new(UpdatableLinearArray::<K> {
            src: self.src.as_copy_on_next_write(),
            a: self.a,
            b: self.b,
            truncate: self.truncate,
            read: self.read.clone(),
        })
    }
}

/// The generic two-way view over an [`UpdatableMathFunc`].
///
/// [`UpdatableMathFunc`]: super::UpdatableMathFunc
pub struct UpdatableAnyFuncArray<K: Kind>
{
    f: UpdFunc,
    xs: Arc<[UpdRef]>,
    truncate: bool,
    read: AnyFuncArray<K>,
    // bit destinations with a single input have a two-point domain; both
    // store-back argument vectors are precomputed at construction
    bit_back: Option<(Arc<[f64]>, Arc<[f64]>)>,
}

impl<K: Kind> UpdatableAnyFuncArray<K>
{
    pub(crate) fn new(truncate: bool, f: UpdFunc, xs: Vec<UpdRef>) -> Self
    {
        let sources: Vec<ArrRef> = xs.iter().map(|x| x.clone_ref()).collect();
        let read = AnyFuncArray::new(truncate, f.readable(), sources.into());
        let bit_back = if K::KIND == ElementKind::Bit && xs.len() == 1 {
            let mut for_false = vec![0.0];
            f.set(&mut for_false, 0.0);
            let mut for_true = vec![0.0];
            f.set(&mut for_true, 1.0);
            Some((for_false.into(), for_true.into()))
        } else {
            None
        };
        UpdatableAnyFuncArray { f, xs: xs.into(), truncate, read, bit_back }
    }
}

impl<K: Kind> Clone for UpdatableAnyFuncArray<K>
{
    fn clone(&self) -> Self
    {
        UpdatableAnyFuncArray {
            f: self.f.clone(),
            xs: Arc::clone(&self.xs),
            truncate: self.truncate,
            read: self.read.clone(),
            bit_back: self.bit_back.clone(),
        }
    }
}

impl<K: Kind> Array for UpdatableAnyFuncArray<K>
{
    updatable_read_delegates!();
}

impl<K: Kind> UpdatableArray for UpdatableAnyFuncArray<K>
{
    fn clone_upd(&self) -> UpdRef
    {
        Arc::new(self.clone())
    }

    fn set_double(&self, index: u64, value: f64) -> Result<()>
    {
        check_index(self.read.len(), index)?;
        let narrowed = K::Repr::from_f64(value, self.truncate).to_f64();
        if let Some((for_false, for_true)) = &self.bit_back {
            let back = if narrowed != 0.0 { for_true } else { for_false };
            for (x, &v) in self.xs.iter().zip(back.iter()) {
                store_back(&**x, index, v, self.truncate)?;
            }
            return Ok(());
        }
        let mut args = Vec::with_capacity(self.xs.len());
        for x in self.xs.iter() {
            args.push(x.get_double(index)?);
        }
        self.f.set(&mut args, narrowed);
        for (x, &v) in self.xs.iter().zip(args.iter()) {
            store_back(&**x, index, v, self.truncate)?;
        }
        Ok(())
    }

    fn set_long(&self, index: u64, value: i64) -> Result<()>
    {
        self.set_double(index, value as f64)
    }

    fn as_copy_on_next_write(&self) -> UpdRef
    {
        let xs: Vec<UpdRef> = self.xs.iter().map(|x| x.as_copy_on_next_write()).collect();
        Arc::new(UpdatableAnyFuncArray::<K>::new(self.truncate, self.f.clone(), xs))
    }
}
