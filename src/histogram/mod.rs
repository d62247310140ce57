// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Summing histograms: incremental insert/remove with rank ↔ value walks and
//! definite integrals of the rank/value curve.
//!
//! Two interpolation models are served:
//!
//! - the *simple* model: within a non-empty bar `v`, ranks map linearly onto
//!   values `v..v+1`;
//! - the *precise* model: a piecewise-linear curve through the left
//!   boundaries of the non-empty bars, with a wide trapezoid of width
//!   `(b-1)/b` at each bar and connector segments across empty runs.
//!
//! [`SummingHistogram`] maintains a current position with O(1)-amortized
//! moves through a multi-level pyramid of bar groups; the functions in this
//! module's root compute one-shot integrals by a plain scan.

mod integrals;
mod summing;

pub use self::integrals::{
    integral_between_ranks, integral_between_values, precise_integral_between_ranks,
    precise_integral_between_values, CountOfValues,
};
pub use self::summing::SummingHistogram;
