// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Platform threads and task notification.
//!
//! Besides creating threads, most RTOSes give every thread a small notification value that any
//! other thread can set, and that the thread itself can block on.  [`TaskNotify`] models the
//! simplest use of this: a single bit latch per thread.  It allows a direct hand-off between two
//! threads without any shared kernel object, which is what the notify flavor of [`ThreadSync`] is
//! built on.
//!
//! [`ThreadSync`]: crate::sync::ThreadSync

use crate::error::Result;
use crate::kconfig;

/// Per-thread one bit notification.
///
/// The bit starts clear for every thread.
pub trait TaskNotify {
    /// Whether the platform actually provides task notification.
    ///
    /// Platforms that don't should set this to `false`.  Their [`notify_take`] and
    /// [`notify_give`] will then never be called by this crate, and can be no-ops.
    ///
    /// [`notify_take`]: TaskNotify::notify_take
    /// [`notify_give`]: TaskNotify::notify_give
    const HAS_TASK_NOTIFY: bool = true;

    /// Identifies a thread that can be notified.
    type Handle: Clone + Send + Sync + 'static;

    /// Return the handle of the calling thread.
    fn current_thread(&self) -> Self::Handle;

    /// Block the calling thread until its bit is set, then clear it.
    ///
    /// If the bit is already set, clears it and returns immediately.
    fn notify_take(&self);

    /// Set the bit of the thread identified by `handle`, waking it if it is blocked in
    /// [`notify_take`].
    ///
    /// Giving to a thread whose bit is already set has no further effect.
    ///
    /// [`notify_take`]: TaskNotify::notify_take
    fn notify_give(&self, handle: &Self::Handle);
}

/// A platform thread handle.
pub trait RawThread: Send {
    /// Block until the thread has finished running.
    fn join(self) -> Result<()>;

    /// Give up the handle, releasing any resources it holds.  The thread itself keeps running.
    fn release(self);
}

/// Parameters used to create a thread.
#[derive(Clone, Debug)]
pub struct ThreadConfig {
    /// Size, in bytes, of the thread's stack.
    pub stack_size: usize,
    /// Scheduling priority, relative to the platform's idle priority.
    pub priority: i32,
    /// A name for the thread, for debugging.
    pub name: &'static str,
}

impl Default for ThreadConfig {
    fn default() -> ThreadConfig {
        ThreadConfig {
            stack_size: kconfig::CONFIG_OSAL_THREAD_STACK_SIZE as usize,
            priority: kconfig::CONFIG_OSAL_THREAD_PRIORITY as i32,
            name: kconfig::CONFIG_OSAL_THREAD_NAME,
        }
    }
}
