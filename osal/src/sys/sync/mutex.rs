// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Platform mutex.

use crate::error::Result;
use crate::time::Timeout;

/// A platform mutex.
///
/// Mutexes have ownership: the thread that locked the mutex is the only one that may unlock it.
/// They are not recursive, attempting to lock a mutex already held by the calling thread is an
/// error, or a deadlock, depending on the platform.
///
/// It must be safe to lock one of these while already holding a different one.
pub trait RawMutex: Send + Sync {
    /// Lock the mutex.
    ///
    /// With [`Timeout::Forever`], waits for the lock, returning `Ok(())` once it has been
    /// acquired.  With [`Timeout::NoWait`], fails if the mutex is held elsewhere.
    fn lock(&self, timeout: Timeout) -> Result<()>;

    /// Unlock the mutex.
    ///
    /// # Safety
    ///
    /// The mutex must already be locked by the calling thread.  Mutexes may not be unlocked from
    /// interrupt context.
    unsafe fn unlock(&self) -> Result<()>;
}
