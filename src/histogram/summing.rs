// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The incremental summing histogram.
//!
//! Bars are shared between sibling instances through a ring; every
//! include/exclude broadcasts rank adjustments to all siblings under the
//! shared lock, while moves touch only the instance's own position. Lock
//! order is always bars before position.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::error::{ArrayError, Result};

use super::integrals::{precise_integral_to_rank, simple_integral_to_rank};

/// Largest supported bar count.
const MAX_LENGTH: u64 = 1 << 31;
/// Largest supported total; counters stay within the `i64` range.
const MAX_TOTAL: u64 = i64::MAX as u64;

struct Level
{
    shift: u32,
    counts: Vec<u64>,
    /// per-group `sum of value·count`; filled when the histogram optimizes
    /// simple integrals
    sums: Option<Vec<i64>>,
    /// per-group count of non-empty bars
    distinct: Vec<u64>,
}

impl Level
{
    fn new(shift: u32, bars: &[u64], with_sums: bool) -> Level
    {
        let width = 1usize << shift;
        let groups = bars.len().div_ceil(width);
        let mut counts = vec![0u64; groups];
        let mut sums = with_sums.then(|| vec![0i64; groups]);
        let mut distinct = vec![0u64; groups];
        for (v, &b) in bars.iter().enumerate() {
            let g = v >> shift;
            counts[g] += b;
            if let Some(sums) = sums.as_mut() {
                sums[g] += v as i64 * b as i64;
            }
            if b != 0 {
                distinct[g] += 1;
            }
        }
        Level { shift, counts, sums, distinct }
    }

    #[inline]
    fn width(&self) -> u64
    {
        1u64 << self.shift
    }
}

struct Bars
{
    bars: Vec<u64>,
    total: u64,
    levels: Vec<Level>,
    ring: Vec<Weak<Mutex<Position>>>,
}

impl Bars
{
    /// `sum of value·count` of one level group, from the stored sums or by
    /// scanning the group's bars.
    fn group_sum(&self, level_index: usize, g: usize) -> i64
    {
        let level = &self.levels[level_index];
        if let Some(sums) = &level.sums {
            return sums[g];
        }
        let width = level.width() as usize;
        let from = g * width;
        let to = (from + width).min(self.bars.len());
        self.bars[from..to]
            .iter()
            .enumerate()
            .map(|(off, &b)| (from + off) as i64 * b as i64)
            .sum()
    }

    /// Smallest non-empty bar above `v`, skipping empty groups.
    fn next_non_empty(&self, v: u64) -> Option<u64>
    {
        let m = self.bars.len() as u64;
        let mut at = v + 1;
        'outer: while at < m {
            for level in self.levels.iter().rev() {
                let width = level.width();
                if at & (width - 1) == 0 && at + width <= m {
                    let g = (at >> level.shift) as usize;
                    if level.distinct[g] == 0 {
                        at += width;
                        continue 'outer;
                    }
                }
            }
            if self.bars[at as usize] != 0 {
                return Some(at);
            }
            at += 1;
        }
        None
    }
}

#[derive(Clone)]
struct Position
{
    /// bar index, `0..=M`; one past the last non-empty bar at rank `total`
    i_value: u64,
    /// `sum of b[j] for j < i_value`
    i_rank: u64,
    /// `sum of j·b[j] for j < i_value`
    sum: i64,
    /// non-empty bars below `i_value`
    distinct: u64,
    /// the real-valued current value
    value: f64,
}

impl Position
{
    fn at_zero() -> Position
    {
        Position { i_value: 0, i_rank: 0, sum: 0, distinct: 0, value: 0.0 }
    }
}

/// An incremental summing histogram with shared bars and per-instance
/// position state.
///
/// The type is single-threaded per instance by design: sibling broadcasts
/// are the only cross-instance writes, and they run under the shared bars
/// lock.
pub struct SummingHistogram
{
    shared: Arc<Mutex<Bars>>,
    pos: Arc<Mutex<Position>>,
}

impl SummingHistogram
{
    /// An empty histogram of `length` bars.
    ///
    /// `bit_levels` lists the pyramid levels (ascending, each `1..=31`);
    /// `optimize_simple_integral` additionally stores per-group sums so
    /// current-sum bookkeeping stays O(1) under group jumps.
    pub fn new(length: u64, optimize_simple_integral: bool, bit_levels: &[u32]) -> Result<Self>
    {
        SummingHistogram::build(vec![0; check_length(length)?], optimize_simple_integral, bit_levels)
    }

    /// A histogram seeded from 64-bit bars.
    pub fn from_bars(bars: &[u64], optimize_simple_integral: bool, bit_levels: &[u32]) -> Result<Self>
    {
        check_length(bars.len() as u64)?;
        SummingHistogram::build(bars.to_vec(), optimize_simple_integral, bit_levels)
    }

    /// The 32-bit-bar counterpart of [`from_bars`](Self::from_bars).
    pub fn from_bars_u32(bars: &[u32], optimize_simple_integral: bool, bit_levels: &[u32]) -> Result<Self>
    {
        check_length(bars.len() as u64)?;
        let wide: Vec<u64> = bars.iter().map(|&b| b as u64).collect();
        SummingHistogram::build(wide, optimize_simple_integral, bit_levels)
    }

    fn build(bars: Vec<u64>, optimize_simple_integral: bool, bit_levels: &[u32]) -> Result<Self>
    {
        let mut total: u64 = 0;
        for &b in &bars {
            total = total.checked_add(b).filter(|&t| t <= MAX_TOTAL).ok_or(ArrayError::overflow())?;
        }
        for (k, &shift) in bit_levels.iter().enumerate() {
            if shift == 0 || shift > 31 {
                return Err(ArrayError::invalid_argument("pyramid bit levels must be in 1..=31"));
            }
            if k > 0 && bit_levels[k - 1] >= shift {
                return Err(ArrayError::invalid_argument("pyramid bit levels must be ascending"));
            }
        }
        let levels = bit_levels
            .iter()
            .map(|&shift| Level::new(shift, &bars, optimize_simple_integral))
            .collect();
        let pos = Arc::new(Mutex::new(Position::at_zero()));
        let shared = Arc::new(Mutex::new(Bars {
            bars,
            total,
            levels,
            ring: vec![Arc::downgrade(&pos)],
        }));
        Ok(SummingHistogram { shared, pos })
    }

    fn bars(&self) -> MutexGuard<'_, Bars>
    {
        self.shared.lock().expect("histogram bars lock poisoned")
    }

    fn position(&self) -> MutexGuard<'_, Position>
    {
        self.pos.lock().expect("histogram position lock poisoned")
    }

    /// The bar count `M`.
    pub fn length(&self) -> u64
    {
        self.bars().bars.len() as u64
    }

    pub fn total(&self) -> u64
    {
        self.bars().total
    }

    pub fn bar(&self, value: u64) -> Result<u64>
    {
        let bars = self.bars();
        bars.bars
            .get(value as usize)
            .copied()
            .ok_or_else(|| ArrayError::index_out_of_bounds(value as i64, bars.bars.len() as u64))
    }

    /// A snapshot of the bars.
    pub fn to_bars(&self) -> Vec<u64>
    {
        self.bars().bars.clone()
    }

    /// A sibling instance over the same bars, starting at this instance's
    /// current position.
    pub fn share(&self) -> SummingHistogram
    {
        let mut bars = self.bars();
        let snapshot = self.position().clone();
        let pos = Arc::new(Mutex::new(snapshot));
        bars.ring.retain(|w| w.strong_count() > 0);
        bars.ring.push(Arc::downgrade(&pos));
        SummingHistogram { shared: Arc::clone(&self.shared), pos }
    }

    /// The number of live siblings observing these bars, this one included.
    pub fn share_count(&self) -> usize
    {
        let mut bars = self.bars();
        bars.ring.retain(|w| w.strong_count() > 0);
        bars.ring.len()
    }

    /// `bars[value] += 1`, adjusting every sibling whose position lies above
    /// `value`.
    pub fn include(&self, value: u64) -> Result<()>
    {
        let mut bars = self.bars();
        self.include_locked(&mut bars, value)
    }

    /// `bars[value] -= 1`; fails with `UnderflowDisbalance` on an empty bar.
    pub fn exclude(&self, value: u64) -> Result<()>
    {
        let mut bars = self.bars();
        self.exclude_locked(&mut bars, value)
    }

    /// Batch include; sibling bookkeeping runs per element so distinct-value
    /// counters stay consistent.
    pub fn include_all(&self, values: &[u64]) -> Result<()>
    {
        let mut bars = self.bars();
        for &v in values {
            self.include_locked(&mut bars, v)?;
        }
        Ok(())
    }

    pub fn exclude_all(&self, values: &[u64]) -> Result<()>
    {
        let mut bars = self.bars();
        for &v in values {
            self.exclude_locked(&mut bars, v)?;
        }
        Ok(())
    }

    fn include_locked(&self, bars: &mut Bars, value: u64) -> Result<()>
    {
        let m = bars.bars.len() as u64;
        if value >= m {
            return Err(ArrayError::index_out_of_bounds(value as i64, m));
        }
        if bars.total >= MAX_TOTAL {
            return Err(ArrayError::overflow());
        }
        let v = value as usize;
        bars.bars[v] += 1;
        bars.total += 1;
        let became_non_empty = bars.bars[v] == 1;
        for level in &mut bars.levels {
            let g = v >> level.shift;
            level.counts[g] += 1;
            if let Some(sums) = level.sums.as_mut() {
                sums[g] += value as i64;
            }
            if became_non_empty {
                level.distinct[g] += 1;
            }
        }
        broadcast(bars, |pos| {
            if pos.i_value > value {
                pos.i_rank += 1;
                pos.sum += value as i64;
                if became_non_empty {
                    pos.distinct += 1;
                }
            }
        });
        Ok(())
    }

    fn exclude_locked(&self, bars: &mut Bars, value: u64) -> Result<()>
    {
        let m = bars.bars.len() as u64;
        if value >= m {
            return Err(ArrayError::index_out_of_bounds(value as i64, m));
        }
        let v = value as usize;
        if bars.bars[v] == 0 {
            return Err(ArrayError::underflow_disbalance(value));
        }
        bars.bars[v] -= 1;
        bars.total -= 1;
        let became_empty = bars.bars[v] == 0;
        for level in &mut bars.levels {
            let g = v >> level.shift;
            level.counts[g] -= 1;
            if let Some(sums) = level.sums.as_mut() {
                sums[g] -= value as i64;
            }
            if became_empty {
                level.distinct[g] -= 1;
            }
        }
        broadcast(bars, |pos| {
            if pos.i_value > value {
                pos.i_rank -= 1;
                pos.sum -= value as i64;
                if became_empty {
                    pos.distinct -= 1;
                }
            }
        });
        Ok(())
    }

    /// Walk the position to the integer rank `r`, clamped to `0..=total`.
    ///
    /// At `r == total` trailing zero bars are skipped so the position points
    /// one past the last non-empty bar.
    pub fn move_to_i_rank(&self, r: i64)
    {
        let bars = self.bars();
        let r = clamp_rank(r, bars.total);
        let mut pos = self.position();
        walk_to_rank(&bars, &mut pos, r);
        let b = bar_at(&bars, pos.i_value);
        pos.value = if b > 0 && r > pos.i_rank {
            pos.i_value as f64 + (r - pos.i_rank) as f64 / b as f64
        } else {
            pos.i_value as f64
        };
    }

    /// Walk to the real-valued rank `x` in the simple model.
    pub fn move_to_rank(&self, x: f64)
    {
        let bars = self.bars();
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, bars.total as f64) };
        let r = clamp_rank(x.floor() as i64, bars.total);
        let mut pos = self.position();
        walk_to_rank(&bars, &mut pos, r);
        let b = bar_at(&bars, pos.i_value);
        pos.value = if b > 0 {
            pos.i_value as f64 + (x - pos.i_rank as f64) / b as f64
        } else {
            pos.i_value as f64
        };
    }

    /// Walk to the integer value `v`, clamped to `0..=length`.
    pub fn move_to_i_value(&self, v: i64)
    {
        let bars = self.bars();
        let m = bars.bars.len() as u64;
        let v = if v < 0 { 0 } else { (v as u64).min(m) };
        let mut pos = self.position();
        walk_to_value(&bars, &mut pos, v);
        pos.value = v as f64;
    }

    /// Walk to the real value `v` in the simple model.
    pub fn move_to_value(&self, v: f64)
    {
        let bars = self.bars();
        let m = bars.bars.len() as u64;
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, m as f64) };
        let iv = (v.floor() as u64).min(m);
        let mut pos = self.position();
        walk_to_value(&bars, &mut pos, iv);
        pos.value = v;
    }

    /// Walk to the real rank `r` of the precise model and interpolate the
    /// corresponding value on its piecewise-linear curve.
    pub fn move_to_precise_rank(&self, r: f64)
    {
        let bars = self.bars();
        let r = if r.is_nan() { 0.0 } else { r.clamp(0.0, bars.total as f64) };
        let ir = clamp_rank(r.floor() as i64, bars.total);
        let mut pos = self.position();
        walk_to_rank(&bars, &mut pos, ir);
        let b = bar_at(&bars, pos.i_value);
        if b == 0 {
            // only reachable at rank == total
            pos.value = pos.i_value as f64;
            return;
        }
        let v0 = pos.i_value as f64;
        let rr = r - pos.i_rank as f64;
        let wide = (b - 1) as f64;
        pos.value = if rr <= wide {
            v0 + rr / b as f64
        } else {
            let start = v0 + wide / b as f64;
            let end = match bars.next_non_empty(pos.i_value) {
                Some(vn) => vn as f64,
                None => v0 + 1.0,
            };
            start + (rr - wide) * (end - start)
        };
    }

    pub fn current_i_value(&self) -> u64
    {
        self.position().i_value
    }

    pub fn current_value(&self) -> f64
    {
        self.position().value
    }

    pub fn current_i_rank(&self) -> u64
    {
        self.position().i_rank
    }

    /// The real-valued rank of `current_value` in the simple model.
    pub fn current_rank(&self) -> f64
    {
        let bars = self.bars();
        let pos = self.position();
        let b = bar_at(&bars, pos.i_value);
        pos.i_rank as f64 + (pos.value - pos.i_value as f64) * b as f64
    }

    /// The real-valued rank of `current_value` in the precise model.
    pub fn current_precise_rank(&self) -> f64
    {
        let bars = self.bars();
        let pos = self.position();
        let b = bar_at(&bars, pos.i_value);
        let delta = pos.value - pos.i_value as f64;
        if b == 0 || delta == 0.0 {
            return pos.i_rank as f64;
        }
        let wide_value = (b - 1) as f64 / b as f64;
        if delta <= wide_value {
            pos.i_rank as f64 + delta * b as f64
        } else {
            let start = pos.i_value as f64 + wide_value;
            let end = match bars.next_non_empty(pos.i_value) {
                Some(vn) => vn as f64,
                None => pos.i_value as f64 + 1.0,
            };
            pos.i_rank as f64 + (b - 1) as f64 + (pos.value - start) / (end - start)
        }
    }

    /// `sum of j·b[j]` below the current position.
    pub fn current_sum(&self) -> i64
    {
        self.position().sum
    }

    /// Non-empty bars below the current position.
    pub fn current_n_distinct(&self) -> u64
    {
        self.position().distinct
    }

    /// The simple-model integral of the rank/value curve from rank 0 to the
    /// current rank, from the maintained accumulators.
    pub fn current_integral(&self) -> f64
    {
        let bars = self.bars();
        let pos = self.position();
        let b = bar_at(&bars, pos.i_value);
        let delta = pos.value - pos.i_value as f64;
        let partial = delta * b as f64 * (pos.i_value as f64 + 0.5 * delta);
        pos.sum as f64 + 0.5 * pos.i_rank as f64 + partial
    }

    /// The precise-model integral from rank 0 to the current precise rank.
    pub fn current_precise_integral(&self) -> f64
    {
        let rank = self.current_precise_rank();
        let bars = self.bars();
        precise_integral_to_rank(&bars.bars, rank)
    }

    /// The simple-model integral between this sibling's position and
    /// another's over the same bars.
    pub fn integral_between_sharing(&self, other: &SummingHistogram) -> Result<f64>
    {
        if !Arc::ptr_eq(&self.shared, &other.shared) {
            return Err(ArrayError::invalid_argument(
                "integral between positions of unrelated histograms",
            ));
        }
        let bars = self.bars();
        let r1 = {
            let pos = self.position();
            let b = bar_at(&bars, pos.i_value);
            pos.i_rank as f64 + (pos.value - pos.i_value as f64) * b as f64
        };
        let r2 = {
            let pos = other.pos.lock().expect("histogram position lock poisoned");
            let b = bar_at(&bars, pos.i_value);
            pos.i_rank as f64 + (pos.value - pos.i_value as f64) * b as f64
        };
        Ok(simple_integral_to_rank(&bars.bars, r2) - simple_integral_to_rank(&bars.bars, r1))
    }
}

fn check_length(length: u64) -> Result<usize>
{
    if length >= MAX_LENGTH {
        return Err(ArrayError::invalid_argument("histogram length must be below 2^31"));
    }
    Ok(length as usize)
}

#[inline]
fn clamp_rank(r: i64, total: u64) -> u64
{
    if r < 0 {
        0
    } else {
        (r as u64).min(total)
    }
}

#[inline]
fn bar_at(bars: &Bars, v: u64) -> u64
{
    bars.bars.get(v as usize).copied().unwrap_or(0)
}

fn broadcast(bars: &mut Bars, update: impl Fn(&mut Position))
{
    bars.ring.retain(|w| w.strong_count() > 0);
    for weak in &bars.ring {
        if let Some(pos) = weak.upgrade() {
            update(&mut pos.lock().expect("histogram position lock poisoned"));
        }
    }
}

/// Walk `pos` to integer rank `r`; at `r == total` skip trailing zero bars.
fn walk_to_rank(bars: &Bars, pos: &mut Position, r: u64)
{
    let m = bars.bars.len() as u64;
    let at_total = r == bars.total;
    // upward: highest affected level first, descending as the target nears
    'up: while pos.i_value < m {
        if at_total && pos.i_rank >= r {
            break;
        }
        for (li, level) in bars.levels.iter().enumerate().rev() {
            let width = level.width();
            if pos.i_value & (width - 1) == 0 && pos.i_value + width <= m {
                let g = (pos.i_value >> level.shift) as usize;
                let c = level.counts[g];
                if pos.i_rank + c <= r && (c > 0 || !at_total) {
                    pos.i_rank += c;
                    pos.sum += bars.group_sum(li, g);
                    pos.distinct += level.distinct[g];
                    pos.i_value += width;
                    continue 'up;
                }
            }
        }
        let b = bars.bars[pos.i_value as usize];
        if pos.i_rank + b <= r && (pos.i_rank < r || b > 0 || !at_total) {
            pos.i_rank += b;
            pos.sum += pos.i_value as i64 * b as i64;
            pos.distinct += (b > 0) as u64;
            pos.i_value += 1;
        } else {
            break;
        }
    }
    // downward
    'down: while pos.i_value > 0 && pos.i_rank > r {
        for (li, level) in bars.levels.iter().enumerate().rev() {
            let width = level.width();
            if pos.i_value & (width - 1) == 0 && pos.i_value >= width {
                let g = ((pos.i_value - width) >> level.shift) as usize;
                let c = level.counts[g];
                if pos.i_rank - c >= r {
                    pos.i_rank -= c;
                    pos.sum -= bars.group_sum(li, g);
                    pos.distinct -= level.distinct[g];
                    pos.i_value -= width;
                    continue 'down;
                }
            }
        }
        let v = pos.i_value - 1;
        let b = bars.bars[v as usize];
        pos.i_value = v;
        pos.i_rank -= b;
        pos.sum -= v as i64 * b as i64;
        pos.distinct -= (b > 0) as u64;
    }
    if at_total {
        trim_trailing_zeros(bars, pos);
    }
}

/// Step the position below every trailing empty bar, whole empty groups at
/// a time.
fn trim_trailing_zeros(bars: &Bars, pos: &mut Position)
{
    'outer: while pos.i_value > 0 {
        for level in bars.levels.iter().rev() {
            let width = level.width();
            if pos.i_value & (width - 1) == 0 && pos.i_value >= width {
                let g = ((pos.i_value - width) >> level.shift) as usize;
                if level.distinct[g] == 0 {
                    pos.i_value -= width;
                    continue 'outer;
                }
            }
        }
        if bars.bars[(pos.i_value - 1) as usize] == 0 {
            pos.i_value -= 1;
        } else {
            break;
        }
    }
}

/// Walk `pos` to the exact bar index `v` (`0..=M`).
fn walk_to_value(bars: &Bars, pos: &mut Position, v: u64)
{
    'up: while pos.i_value < v {
        for (li, level) in bars.levels.iter().enumerate().rev() {
            let width = level.width();
            if pos.i_value & (width - 1) == 0 && pos.i_value + width <= v {
                let g = (pos.i_value >> level.shift) as usize;
                pos.i_rank += level.counts[g];
                pos.sum += bars.group_sum(li, g);
                pos.distinct += level.distinct[g];
                pos.i_value += width;
                continue 'up;
            }
        }
        let b = bars.bars[pos.i_value as usize];
        pos.i_rank += b;
        pos.sum += pos.i_value as i64 * b as i64;
        pos.distinct += (b > 0) as u64;
        pos.i_value += 1;
    }
    'down: while pos.i_value > v {
        for (li, level) in bars.levels.iter().enumerate().rev() {
            let width = level.width();
            if pos.i_value & (width - 1) == 0 && pos.i_value >= width && pos.i_value - width >= v {
                let g = ((pos.i_value - width) >> level.shift) as usize;
                pos.i_rank -= level.counts[g];
                pos.sum -= bars.group_sum(li, g);
                pos.distinct -= level.distinct[g];
                pos.i_value -= width;
                continue 'down;
            }
        }
        let at = pos.i_value - 1;
        let b = bars.bars[at as usize];
        pos.i_value = at;
        pos.i_rank -= b;
        pos.sum -= at as i64 * b as i64;
        pos.distinct -= (b > 0) as u64;
    }
}
