// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The composition layer: inspect the function tag and the source kinds,
//! pick the most specialized view, and return it as a plain array handle.

use std::sync::Arc;

use crate::array::{ArrRef, Array};
use crate::error::{ArrayError, Result};
use crate::kind::{BitK, ByteK, CharK, DoubleK, ElementKind, FloatK, IntK, Kind, LongK, Prim, ShortK};
use crate::matrix::TiledArray;

use super::views::{
    AnyFuncArray, CastArray, ConstantArray, DiffArray, DiffOp, LinearArray, MinMaxArray, TableArray,
};
use super::Func;

/// Expand `$body` once per element kind, with `$K` bound to the marker type.
macro_rules! for_kind {
    ($kind:expr, $K:ident => $body:expr) => {
        match $kind {
            ElementKind::Bit => {
                type $K = BitK;
                $body
            }
            ElementKind::Char16 => {
                type $K = CharK;
                $body
            }
            ElementKind::U8 => {
                type $K = ByteK;
                $body
            }
            ElementKind::U16 => {
                type $K = ShortK;
                $body
            }
            ElementKind::I32 => {
                type $K = IntK;
                $body
            }
            ElementKind::I64 => {
                type $K = LongK;
                $body
            }
            ElementKind::F32 => {
                type $K = FloatK;
                $body
            }
            ElementKind::F64 => {
                type $K = DoubleK;
                $body
            }
        }
    };
}

pub(crate) use for_kind;

/// `len` copies of `value`, narrowed to `kind` by the chosen policy.
pub fn n_copies(kind: ElementKind, len: u64, value: f64, truncate_overflows: bool) -> ArrRef
{
    for_kind!(kind, K => {
        let v = <K as Kind>::Repr::from_f64(value, truncate_overflows);
        Arc::new(ConstantArray::<K>::new(len, v)) as ArrRef
    })
}

/// A kind-conversion view over `src`: same elements, `kind` narrowing.
pub(crate) fn conversion_view(truncate: bool, src: &ArrRef, kind: ElementKind) -> ArrRef
{
    if src.kind() == kind {
        return src.as_immutable();
    }
    if src.kind().bits_per_element() <= 16 {
        for_kind!(kind, K => Arc::new(TableArray::<K>::new(truncate, &Func::Identity, src.clone_ref())) as ArrRef)
    } else {
        for_kind!(kind, K => Arc::new(CastArray::<K>::new(truncate, src.clone_ref())) as ArrRef)
    }
}

/// The length of the view built over `xs`: the common length of the
/// non-constant sources.
fn common_length(xs: &[ArrRef]) -> Result<u64>
{
    let mut len: Option<u64> = None;
    for x in xs {
        if x.constant_value().is_some() {
            continue;
        }
        match len {
            None => len = Some(x.len()),
            Some(l) if l != x.len() => return Err(ArrayError::size_mismatch(l, x.len())),
            _ => {}
        }
    }
    Ok(len.unwrap_or_else(|| xs.first().map_or(0, |x| x.len())))
}

/// Re-length constant sources so kernels can index them anywhere in `0..len`.
fn normalized(xs: &[ArrRef], len: u64, truncate: bool) -> Vec<ArrRef>
{
    xs.iter()
        .map(|x| match x.constant_value() {
            Some(c) if x.len() != len => n_copies(x.kind(), len, c, truncate),
            _ => x.clone_ref(),
        })
        .collect()
}

/// When every non-constant source is a tiled view with the same dims and
/// tile dims, report that tiling.
fn common_tiling(xs: &[ArrRef]) -> Option<(Vec<u64>, Vec<u64>)>
{
    let mut tiling: Option<(Vec<u64>, Vec<u64>)> = None;
    let mut saw_real = false;
    for x in xs {
        if x.constant_value().is_some() {
            continue;
        }
        saw_real = true;
        let tiled = x.as_any().downcast_ref::<TiledArray>()?;
        let this = (tiled.dims().to_vec(), tiled.tile_dims().to_vec());
        match &tiling {
            None => tiling = Some(this),
            Some(seen) if *seen != this => return None,
            _ => {}
        }
    }
    if saw_real {
        tiling
    } else {
        None
    }
}

/// Build a lazy view computing `f(x_0[i], x_1[i], ...)` with elements of the
/// requested kind.
///
/// The selection rules, in order: constants collapse to `n_copies`; the
/// identity and single-argument MIN/MAX become conversion views; common
/// tilings are lifted so tiling commutes with composition; MIN/MAX flatten
/// same-operator children and reduce in-kind; the difference functions and
/// degenerate linear shapes get dedicated kernels; small-kind single sources
/// go through a lookup table; everything else falls back to the generic
/// any-func view.
pub fn as_func_array(truncate: bool, f: &Func, kind: ElementKind, xs: &[ArrRef]) -> Result<ArrRef>
{
    let len = common_length(xs)?;

    // tiling commutes with composition: compose over the base arrays, then
    // re-tile the result
    if let Some((dims, tile_dims)) = common_tiling(xs) {
        let bases: Vec<ArrRef> = xs
            .iter()
            .map(|x| match x.as_any().downcast_ref::<TiledArray>() {
                Some(tiled) => tiled.base().clone_ref(),
                None => x.clone_ref(),
            })
            .collect();
        let inner = as_func_array(truncate, f, kind, &bases)?;
        return Ok(Arc::new(TiledArray::new(inner, &dims, &tile_dims)?) as ArrRef);
    }

    match f {
        Func::Constant(c) => Ok(n_copies(kind, len, *c, truncate)),

        Func::Identity => {
            if xs.len() != 1 {
                return Err(ArrayError::invalid_argument("the identity takes exactly one argument"));
            }
            Ok(conversion_view(truncate, &xs[0], kind))
        }

        Func::Min | Func::Max => {
            if xs.is_empty() {
                return Err(ArrayError::invalid_argument("MIN/MAX of zero arguments"));
            }
            if xs.len() == 1 {
                return Ok(conversion_view(truncate, &xs[0], kind));
            }
            let max = matches!(f, Func::Max);
            let k0 = xs[0].kind();
            if xs.iter().all(|x| x.kind() == k0) {
                let xs = normalized(xs, len, truncate);
                let reduced = for_kind!(k0, K => {
                    let mut leaves: Vec<ArrRef> = Vec::with_capacity(xs.len());
                    for x in &xs {
                        // flatten nested reductions of the same operator and kind
                        match x.as_any().downcast_ref::<MinMaxArray<K>>() {
                            Some(child) if child.op() == max => {
                                leaves.extend(child.sources().iter().map(|s| s.clone_ref()));
                            }
                            _ => leaves.push(x.clone_ref()),
                        }
                    }
                    Arc::new(MinMaxArray::<K>::new(max, leaves.into())) as ArrRef
                });
                if k0 == kind {
                    Ok(reduced)
                } else {
                    Ok(conversion_view(truncate, &reduced, kind))
                }
            } else {
                any_func_view(truncate, f.clone(), kind, normalized(xs, len, truncate))
            }
        }

        Func::PositiveDiff | Func::AbsDiff => {
            if xs.len() != 2 {
                return Err(ArrayError::invalid_argument("a difference takes exactly two arguments"));
            }
            let k0 = xs[0].kind();
            let positive = matches!(f, Func::PositiveDiff);
            let specialized = xs[1].kind() == k0
                && k0 == kind
                && k0 != ElementKind::I64
                && (!positive || k0.is_integer());
            if specialized {
                let xs = normalized(xs, len, truncate);
                let op = if positive { DiffOp::Positive } else { DiffOp::Abs };
                Ok(for_kind!(kind, K => {
                    Arc::new(DiffArray::<K>::new(op, truncate, xs[0].clone_ref(), xs[1].clone_ref()))
                        as ArrRef
                }))
            } else {
                any_func_view(truncate, f.clone(), kind, normalized(xs, len, truncate))
            }
        }

        Func::Linear(lf) => {
            if lf.coefficients().len() != xs.len() {
                return Err(ArrayError::invalid_argument(
                    "linear coefficient count differs from the argument count",
                ));
            }
            if xs.is_empty() || lf.is_zero() {
                return Ok(n_copies(kind, len, lf.offset(), truncate));
            }
            let a = lf.coefficients();
            let b = lf.offset();
            if xs.len() == 1 {
                if a[0] == 1.0 && b == 0.0 {
                    // the linear computation degenerates to a direct cast
                    return Ok(conversion_view(truncate, &xs[0], kind));
                }
                if xs[0].kind().bits_per_element() <= 16 {
                    return Ok(for_kind!(kind, K => {
                        Arc::new(TableArray::<K>::new(truncate, f, xs[0].clone_ref())) as ArrRef
                    }));
                }
            }
            let subtraction_shape = xs.len() == 2
                && b == 0.0
                && ((a[0] == 1.0 && a[1] == -1.0) || (a[0] == -1.0 && a[1] == 1.0));
            if subtraction_shape
                && xs[0].kind() == kind
                && xs[1].kind() == kind
                && kind != ElementKind::I64
            {
                let xs = normalized(xs, len, truncate);
                let (x, y) = if a[0] == 1.0 { (&xs[0], &xs[1]) } else { (&xs[1], &xs[0]) };
                return Ok(for_kind!(kind, K => {
                    Arc::new(DiffArray::<K>::new(DiffOp::Plain, truncate, x.clone_ref(), y.clone_ref()))
                        as ArrRef
                }));
            }
            let xs = normalized(xs, len, truncate);
            Ok(for_kind!(kind, K => {
                Arc::new(LinearArray::<K>::new(truncate, a.into(), b, xs.into())) as ArrRef
            }))
        }

        Func::Any(_) => {
            if xs.is_empty() {
                return Ok(n_copies(kind, 0, f.get(&[]), truncate));
            }
            if xs.len() == 1 && xs[0].kind().bits_per_element() <= 16 {
                return Ok(for_kind!(kind, K => {
                    Arc::new(TableArray::<K>::new(truncate, f, xs[0].clone_ref())) as ArrRef
                }));
            }
            any_func_view(truncate, f.clone(), kind, normalized(xs, len, truncate))
        }
    }
}

fn any_func_view(truncate: bool, f: Func, kind: ElementKind, xs: Vec<ArrRef>) -> Result<ArrRef>
{
    Ok(for_kind!(kind, K => {
        Arc::new(AnyFuncArray::<K>::new(truncate, f, xs.into())) as ArrRef
    }))
}
