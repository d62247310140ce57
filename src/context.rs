// Copyright 2026 lazyarray developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ArrayError, Result};

/// Execution context for long-running bulk operations.
///
/// Bulk kernels never suspend, but they are chunked; between chunks they poll
/// the context so a caller can cancel the operation or observe progress.
/// Cancellation surfaces as [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled)
/// and never corrupts destination buffers: every chunk is written completely
/// or not at all.
pub trait Context
{
    /// Whether the operation should stop at the next chunk boundary.
    fn is_cancelled(&self) -> bool
    {
        false
    }

    /// Progress callback; `ready <= total` counts processed elements.
    fn update_progress(&self, ready: u64, total: u64)
    {
        let _ = (ready, total);
    }

    /// Return `Cancelled` when the context has been cancelled.
    fn checked(&self) -> Result<()>
    {
        if self.is_cancelled() {
            Err(ArrayError::cancelled())
        } else {
            Ok(())
        }
    }
}

/// The do-nothing context: never cancelled, progress discarded.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoContext;

impl Context for NoContext {}

/// A shared flag is the simplest real context.
impl Context for AtomicBool
{
    fn is_cancelled(&self) -> bool
    {
        self.load(Ordering::Relaxed)
    }
}
