// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! A lazily created mutex.
//!
//! This is the mutex handed to the UI library.  It is a plain lock, with explicit `lock` and
//! `unlock` calls, as the library pairs them across its own call graph.  For code that can use
//! scoped locking, [`Mutex::guard`] returns an RAII guard instead.
//!
//! The platform mutex is created by the first operation, whichever thread makes it.

use core::fmt;
use core::marker::PhantomData;

use log::error;

use super::LazyInit;
use crate::error::{Error, Result};
use crate::sys::sync::RawMutex;
use crate::sys::Platform;
use crate::time::{Forever, NoWait, Timeout};

/// A mutual exclusion lock over a platform mutex, created on first use.
pub struct Mutex<P: Platform> {
    platform: P,
    raw: LazyInit<P::Mutex>,
}

impl<P: Platform> Mutex<P> {
    /// Construct a mutex.  Nothing is created on the platform until it is first used.
    pub const fn new(platform: P) -> Mutex<P> {
        Mutex {
            platform,
            raw: LazyInit::new(),
        }
    }

    fn raw(&self) -> Result<&P::Mutex> {
        self.raw.get_or_init(&self.platform, || {
            self.platform.mutex_create().map_err(|e| {
                error!("mutex create failed: {}", e);
                Error::InitFailed
            })
        })
    }

    fn lock_timeout(&self, timeout: Timeout) -> Result<()> {
        self.raw()?.lock(timeout).map_err(|e| {
            error!("mutex lock failed: {}", e);
            Error::LockFailed
        })
    }

    /// Create the platform mutex now, instead of on first use.
    pub fn init(&self) -> Result<()> {
        self.raw().map(|_| ())
    }

    /// Whether the platform mutex has been created.
    pub fn is_initialized(&self) -> bool {
        self.raw.is_initialized()
    }

    /// Acquire the mutex, blocking until it is available.
    pub fn lock(&self) -> Result<()> {
        self.lock_timeout(Forever.into())
    }

    /// Acquire the mutex without blocking.
    ///
    /// This is the variant usable from contexts that must not block, such as interrupt handlers
    /// on platforms that allow taking a mutex there.  Fails with [`Error::LockFailed`] if the
    /// mutex is held.
    pub fn lock_isr(&self) -> Result<()> {
        self.lock_timeout(NoWait.into())
    }

    /// Release the mutex.
    ///
    /// # Safety
    ///
    /// The mutex must be held by the calling thread, from a call to [`lock`] or [`lock_isr`].
    ///
    /// [`lock`]: Mutex::lock
    /// [`lock_isr`]: Mutex::lock_isr
    pub unsafe fn unlock(&self) -> Result<()> {
        self.raw()?.unlock().map_err(|e| {
            error!("mutex unlock failed: {}", e);
            Error::UnlockFailed
        })
    }

    /// Acquire the mutex, returning a guard that releases it when dropped.
    pub fn guard(&self) -> Result<MutexGuard<'_, P>> {
        self.lock()?;
        Ok(MutexGuard {
            lock: self,
            _nosend: PhantomData,
        })
    }

    /// Release the platform mutex, returning to the state of a newly constructed one.
    pub fn delete(&mut self) -> Result<()> {
        self.raw.reset();
        Ok(())
    }
}

impl<P: Platform> fmt::Debug for Mutex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex {{ initialized: {} }}", self.is_initialized())
    }
}

/// An RAII implementation of a "scoped lock" of a [`Mutex`].  When this structure is dropped
/// (falls out of scope), the lock will be unlocked.
pub struct MutexGuard<'a, P: Platform> {
    lock: &'a Mutex<P>,
    // The mutex has to be released by the thread that locked it, so mark the guard unsend.
    _nosend: PhantomData<*const ()>,
}

impl<P: Platform> Drop for MutexGuard<'_, P> {
    fn drop(&mut self) {
        // SAFETY: The guard only exists while this thread holds the lock.  A failure has already
        // been logged, and there is no one to report it to.
        let _ = unsafe { self.lock.unlock() };
    }
}
