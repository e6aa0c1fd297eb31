// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Platform counting semaphore.
//!
//! Semaphores have both an upper and lower bound on the count.  Note that calling 'give' on a
//! semaphore that is at the maximum count will discard the 'give' operation, which in situations
//! where counting is actually desired, will result in the count being incorrect.  Users must size
//! the limit for the largest count they can produce.

use crate::error::Result;
use crate::time::Timeout;

/// A platform counting semaphore.
pub trait RawSemaphore: Send + Sync {
    /// Take the semaphore, decrementing the count.
    ///
    /// With [`Timeout::Forever`], blocks until the count is non-zero.  With [`Timeout::NoWait`],
    /// fails instead of blocking.
    fn take(&self, timeout: Timeout) -> Result<()>;

    /// Give the semaphore.
    ///
    /// This increments the count, unless the semaphore is already at its maximum permitted count.
    fn give(&self);

    /// Get the current count.
    fn count_get(&self) -> u32;
}
