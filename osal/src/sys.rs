// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Osal 'sys' module.
//!
//! The platform layer underneath this crate is described by the [`Platform`] trait.  A platform
//! creates the raw primitives (mutexes, counting semaphores, threads), provides the process wide
//! critical section, and provides per-thread task notification through [`TaskNotify`].
//!
//! The submodules of `sys` contain the traits for each of these raw primitives.  They are meant to
//! be as close as possible to what an RTOS provides, and are used to build the higher level
//! objects in [`crate::sync`] and [`crate::thread`].
//!
//! [`TaskNotify`]: thread::TaskNotify

use alloc::boxed::Box;

use critical_section::{CriticalSection, RestoreState};

use crate::error::Result;
use crate::time::Duration;

pub mod atomic;
pub mod critical;
pub mod sync;
pub mod thread;

#[cfg(feature = "host")]
pub mod host;

#[cfg(test)]
pub(crate) mod mock;

use self::sync::{RawMutex, RawSemaphore};
use self::thread::{RawThread, TaskNotify, ThreadConfig};

/// The entry point of a newly created thread.
pub type ThreadEntry = Box<dyn FnOnce() + Send + 'static>;

/// The capabilities of a platform.
///
/// Objects in this crate are handed an implementation of this trait when they are constructed,
/// and create every primitive they own through it.  This keeps the objects testable against an
/// instrumented platform, and lets a single implementation of each object serve any RTOS.
pub trait Platform: TaskNotify + Send + Sync {
    /// The platform's mutex.
    type Mutex: RawMutex;
    /// The platform's counting semaphore.
    type Semaphore: RawSemaphore;
    /// A handle to a thread created by [`thread_create`].
    ///
    /// [`thread_create`]: Platform::thread_create
    type Thread: RawThread;

    /// Create a new, unlocked, mutex.
    fn mutex_create(&self) -> Result<Self::Mutex>;

    /// Create a counting semaphore with the given initial count, that will never count above
    /// `limit`.
    fn semaphore_create(&self, initial: u32, limit: u32) -> Result<Self::Semaphore>;

    /// Create and start a thread running `entry`.
    fn thread_create(&self, config: &ThreadConfig, entry: ThreadEntry) -> Result<Self::Thread>;

    /// Enter the process wide critical section, returning the state needed to leave it.
    fn critical_enter(&self) -> RestoreState;

    /// Leave the critical section.
    ///
    /// # Safety
    ///
    /// `token` must come from the matching [`critical_enter`] on this thread, and critical
    /// sections must be left in the reverse order they were entered.
    ///
    /// [`critical_enter`]: Platform::critical_enter
    unsafe fn critical_exit(&self, token: RestoreState);

    /// Put the current thread to sleep for at least `duration`.
    fn sleep(&self, duration: Duration);

    /// Run `f` inside of the critical section.
    ///
    /// The token given to `f` can be used to access data held in a [`critical_section::Mutex`].
    fn critical<R>(&self, f: impl FnOnce(CriticalSection<'_>) -> R) -> R
    where
        Self: Sized,
    {
        critical::with(self, f)
    }
}
