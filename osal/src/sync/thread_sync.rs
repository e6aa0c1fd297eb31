// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! One-shot thread synchronization.
//!
//! A [`ThreadSync`] is an edge triggered signal between threads.  A call to [`signal`] sets a
//! latch, or releases the thread(s) blocked in [`wait`].  A call to [`wait`] consumes the latch if
//! it is set, or blocks until a signal arrives.  Two signals with no wait between them collapse
//! into a single one.
//!
//! There are two implementations, selected by [`Flavor`]:
//!
//! - [`Flavor::Notify`] hands the signal directly to the waiting thread through the platform's
//!   task notification.  It needs no kernel objects at all, but only supports a single waiting
//!   thread at a time.  If a second thread waits while one is already parked, the first one is
//!   forgotten, and will not be woken.
//! - [`Flavor::Generic`] is built from a mutex, a counting semaphore and an atomic count of
//!   waiters.  Any number of threads, up to [`MAX_WAITERS`], may wait at once, and a single
//!   signal releases all of them.
//!
//! Like the [`Mutex`], a `ThreadSync` can be constructed in a `static`, and creates what it needs
//! on first use.
//!
//! None of the operations may be called from interrupt context.
//!
//! [`signal`]: ThreadSync::signal
//! [`wait`]: ThreadSync::wait
//! [`Mutex`]: super::Mutex

use core::fmt;

use log::{debug, error, warn};

use super::LazyInit;
use crate::error::{Error, Result};
use crate::kconfig;
use crate::sys::Platform;

mod generic;
mod notify;


use generic::GenericSync;
use notify::NotifySync;

/// The largest number of threads that may wait on a generic flavor [`ThreadSync`] at once.
pub const MAX_WAITERS: u32 = kconfig::CONFIG_OSAL_SYNC_MAX_WAITERS as u32;

/// Which implementation a [`ThreadSync`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    /// Direct hand-off through task notification.  Single waiter.
    Notify,
    /// Mutex, counting semaphore and waiter count.  Many waiters.
    Generic,
}

impl Flavor {
    /// The flavor selected by the build configuration, `CONFIG_OSAL_SYNC_TASK_NOTIFY`.
    pub const fn configured() -> Flavor {
        if cfg!(CONFIG_OSAL_SYNC_TASK_NOTIFY) {
            Flavor::Notify
        } else {
            Flavor::Generic
        }
    }
}

/// The state of a [`ThreadSync`] at one moment, for tests and diagnostics.
///
/// The fields are read without holding any lock, and may be inconsistent with each other if the
/// object is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// The flavor in use.
    pub flavor: Flavor,
    /// Whether a signal is pending.
    pub signal: bool,
    /// Notify flavor: whether a thread is parked waiting.
    pub parked: bool,
    /// Generic flavor: registered waiters not yet counted out by a signal.
    pub waiters: u32,
    /// Generic flavor: waiters counted out by a signal that have not yet returned.
    pub releasing: u32,
}

enum Inner<P: Platform> {
    Notify(NotifySync<P>),
    Generic(GenericSync<P>),
}

/// An edge triggered signal between threads.
pub struct ThreadSync<P: Platform> {
    platform: P,
    flavor: Flavor,
    inner: LazyInit<Inner<P>>,
}

impl<P: Platform> ThreadSync<P> {
    /// Construct a sync object of the flavor chosen by the build configuration.
    pub const fn new(platform: P) -> ThreadSync<P> {
        ThreadSync::with_flavor(platform, Flavor::configured())
    }

    /// Construct a sync object of the given flavor.
    ///
    /// If the platform has no task notification, the notify flavor is replaced by the generic
    /// one.
    pub const fn with_flavor(platform: P, flavor: Flavor) -> ThreadSync<P> {
        ThreadSync {
            platform,
            flavor,
            inner: LazyInit::new(),
        }
    }

    /// The flavor this object uses.
    pub fn flavor(&self) -> Flavor {
        match self.flavor {
            Flavor::Notify if !P::HAS_TASK_NOTIFY => Flavor::Generic,
            flavor => flavor,
        }
    }

    fn inner(&self) -> Result<&Inner<P>> {
        self.inner.get_or_init(&self.platform, || {
            if self.flavor != self.flavor() {
                warn!("no task notification on this platform, using generic sync");
            }
            match self.flavor() {
                Flavor::Notify => Ok(Inner::Notify(NotifySync::new())),
                Flavor::Generic => GenericSync::new(&self.platform)
                    .map(Inner::Generic)
                    .map_err(|e| {
                        error!("sync create failed: {}", e);
                        Error::InitFailed
                    }),
            }
        })
    }

    /// Create the underlying platform objects now, instead of on first use.
    pub fn init(&self) -> Result<()> {
        self.inner()?;
        debug!("sync initialized: {:?}", self.flavor());
        Ok(())
    }

    /// Whether the underlying objects have been created.
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    /// Wait for a signal.
    ///
    /// Returns immediately, consuming it, if a signal is already pending.  Otherwise, blocks until
    /// another thread calls [`signal`].  There is no timeout.
    ///
    /// [`signal`]: ThreadSync::signal
    pub fn wait(&self) -> Result<()> {
        match self.inner()? {
            Inner::Notify(sync) => sync.wait(&self.platform),
            Inner::Generic(sync) => sync.wait(),
        }
    }

    /// Signal the waiting thread, or threads.
    ///
    /// With no thread waiting, the signal is latched for the next [`wait`].
    ///
    /// [`wait`]: ThreadSync::wait
    pub fn signal(&self) -> Result<()> {
        match self.inner()? {
            Inner::Notify(sync) => sync.signal(&self.platform),
            Inner::Generic(sync) => sync.signal(),
        }
    }

    /// Release the underlying platform objects.
    ///
    /// The object goes back to the state it was constructed in, and can be used again.  Any
    /// pending signal is lost.
    pub fn delete(&mut self) -> Result<()> {
        if self.inner.reset().is_some() {
            debug!("sync deleted");
        }
        Ok(())
    }

    /// A snapshot of the internal state, or `None` if not yet initialized.
    pub fn snapshot(&self) -> Option<SyncSnapshot> {
        let mut snap = SyncSnapshot {
            flavor: self.flavor(),
            signal: false,
            parked: false,
            waiters: 0,
            releasing: 0,
        };
        match self.inner.get()? {
            Inner::Notify(sync) => sync.snapshot(&self.platform, &mut snap),
            Inner::Generic(sync) => sync.snapshot(&mut snap),
        }
        Some(snap)
    }
}

impl<P: Platform> fmt::Debug for ThreadSync<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot() {
            Some(snap) => write!(f, "ThreadSync({:?})", snap),
            None => write!(f, "ThreadSync({:?}, <uninit>)", self.flavor()),
        }
    }
}
