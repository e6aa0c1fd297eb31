// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Lazy, double-checked, initialization.
//!
//! Objects that are meant to be declared statically cannot create their platform resources when
//! constructed.  Instead, every operation on them starts by making sure they have been
//! initialized.  The check is done twice: once without any lock, which is all that is needed once
//! initialized, and then again inside of the critical section, as another thread may have done
//! the initialization while this one waited to enter it.

use core::cell::UnsafeCell;
use core::fmt;

use portable_atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::sys::Platform;

/// A value created on first use.
pub struct LazyInit<T> {
    initialized: AtomicBool,
    value: UnsafeCell<Option<T>>,
}

// The value is written only inside of the critical section, while `initialized` is false, and is
// only read after `initialized` has been seen as true.  Clearing it requires `&mut self`.
unsafe impl<T: Send + Sync> Sync for LazyInit<T> {}
unsafe impl<T: Send> Send for LazyInit<T> {}

impl<T> LazyInit<T> {
    /// Construct an uninitialized value.
    pub const fn new() -> LazyInit<T> {
        LazyInit {
            initialized: AtomicBool::new(false),
            value: UnsafeCell::new(None),
        }
    }

    /// Whether the value has been created.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Return the value, creating it with `init` if this is the first use.
    ///
    /// `init` runs inside of the critical section of `platform`, and must not block.  If it fails,
    /// the value stays uninitialized, and the error is returned.  The next call will try again.
    pub fn get_or_init<P, F>(&self, platform: &P, init: F) -> Result<&T>
    where
        P: Platform,
        F: FnOnce() -> Result<T>,
    {
        if !self.is_initialized() {
            platform.critical(|_cs| {
                if self.is_initialized() {
                    return Ok(());
                }
                let value = init()?;
                // SAFETY: We are inside of the critical section, and no reader can exist until
                // `initialized` is set below.
                unsafe {
                    *self.value.get() = Some(value);
                }
                self.initialized.store(true, Ordering::Release);
                Ok(())
            })?;
        }
        self.get().ok_or(Error::InitFailed)
    }

    /// Return the value, if it has been created.
    pub fn get(&self) -> Option<&T> {
        if !self.is_initialized() {
            return None;
        }
        // SAFETY: Once `initialized` is set, the value is never written through a shared
        // reference.
        unsafe { (*self.value.get()).as_ref() }
    }

    /// Return to the uninitialized state, handing back the value if there was one.
    pub fn reset(&mut self) -> Option<T> {
        *self.initialized.get_mut() = false;
        self.value.get_mut().take()
    }
}

impl<T> Default for LazyInit<T> {
    fn default() -> LazyInit<T> {
        LazyInit::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyInit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "LazyInit({:?})", value),
            None => write!(f, "LazyInit(<uninit>)"),
        }
    }
}
