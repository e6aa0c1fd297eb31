// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Host implementation of the platform.
//!
//! This implements [`Platform`] on top of `std`, so that applications and tests can run on a
//! development machine.  The primitives keep the semantics an RTOS would give them, rather than
//! those of `std`:
//!
//! - [`HostMutex`] tracks its owner.  Unlocking from another thread, or locking it again from the
//!   owner, is reported as an error instead of being undefined.
//! - [`HostSemaphore`] is bounded, and discards gives at its limit.
//! - Task notification is a latch per thread, built on `park`/`unpark`.
//! - The critical section is the one provided by the `critical-section` crate's `std`
//!   implementation, a single global lock.
//!
//! Thread priorities have no meaning on the host, and are only recorded in the log.  Stack sizes
//! are raised to a minimum that `std` is comfortable with.

use std::cell::Cell;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use critical_section::RestoreState;
use log::{error, trace};
use portable_atomic::{AtomicBool, Ordering};

use super::sync::{RawMutex, RawSemaphore};
use super::thread::{RawThread, TaskNotify, ThreadConfig};
use super::{Platform, ThreadEntry};
use crate::error::{errno, Error, Result};
use crate::sync::Arc;
use crate::time::{Duration, Timeout};

/// The `std` backed platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct Host;

// Poisoning only happens when a thread panics holding one of the internal locks, which none of
// the code below can do.  Carry on with the inner state.
fn relock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mutex with an owner.
#[derive(Debug, Default)]
pub struct HostMutex {
    owner: Mutex<Option<ThreadId>>,
    cond: Condvar,
}

impl HostMutex {
    /// Construct a new, unlocked, mutex.
    pub fn new() -> HostMutex {
        HostMutex::default()
    }
}

impl RawMutex for HostMutex {
    fn lock(&self, timeout: Timeout) -> Result<()> {
        let me = thread::current().id();
        let mut owner = relock(&self.owner);
        loop {
            match *owner {
                None => {
                    *owner = Some(me);
                    return Ok(());
                }
                Some(id) if id == me => return Err(Error::Os(errno::EDEADLK)),
                Some(_) if timeout == Timeout::NoWait => return Err(Error::Os(errno::EBUSY)),
                Some(_) => {
                    owner = self.cond.wait(owner).unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    unsafe fn unlock(&self) -> Result<()> {
        let mut owner = relock(&self.owner);
        if *owner != Some(thread::current().id()) {
            return Err(Error::Os(errno::EPERM));
        }
        *owner = None;
        self.cond.notify_one();
        Ok(())
    }
}

/// A bounded counting semaphore.
#[derive(Debug)]
pub struct HostSemaphore {
    count: Mutex<u32>,
    limit: u32,
    cond: Condvar,
}

impl HostSemaphore {
    /// Construct a semaphore.  `initial` must not be larger than `limit`, and `limit` must not be
    /// zero.
    pub fn new(initial: u32, limit: u32) -> Result<HostSemaphore> {
        if limit == 0 || initial > limit {
            return Err(Error::Os(errno::EINVAL));
        }
        Ok(HostSemaphore {
            count: Mutex::new(initial),
            limit,
            cond: Condvar::new(),
        })
    }
}

impl RawSemaphore for HostSemaphore {
    fn take(&self, timeout: Timeout) -> Result<()> {
        let mut count = relock(&self.count);
        while *count == 0 {
            if timeout == Timeout::NoWait {
                return Err(Error::Os(errno::EBUSY));
            }
            count = self.cond.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
        Ok(())
    }

    fn give(&self) {
        let mut count = relock(&self.count);
        if *count < self.limit {
            *count += 1;
            self.cond.notify_one();
        }
    }

    fn count_get(&self) -> u32 {
        *relock(&self.count)
    }
}

/// The notification latch of a single thread.
#[derive(Debug)]
struct Latch {
    set: AtomicBool,
    thread: thread::Thread,
}

thread_local! {
    static LATCH: Arc<Latch> = Arc::new(Latch {
        set: AtomicBool::new(false),
        thread: thread::current(),
    });
}

/// Identifies a host thread for task notification.
#[derive(Clone, Debug)]
pub struct HostHandle(Arc<Latch>);

impl HostHandle {
    /// Whether two handles refer to the same thread.
    pub fn same_thread(&self, other: &HostHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl TaskNotify for Host {
    type Handle = HostHandle;

    fn current_thread(&self) -> HostHandle {
        LATCH.with(|latch| HostHandle(latch.clone()))
    }

    fn notify_take(&self) {
        LATCH.with(|latch| {
            // `park` may return spuriously, or because of an `unpark` meant for someone else
            // using parking on this thread.  Only the latch counts.
            while !latch.set.swap(false, Ordering::AcqRel) {
                thread::park();
            }
        });
    }

    fn notify_give(&self, handle: &HostHandle) {
        handle.0.set.store(true, Ordering::Release);
        handle.0.thread.unpark();
    }
}

/// A thread created by [`Host`].
#[derive(Debug)]
pub struct HostThread {
    handle: JoinHandle<()>,
}

impl RawThread for HostThread {
    fn join(self) -> Result<()> {
        // A panic in the thread is the only way to get an error here.
        self.handle.join().map_err(|_| Error::Os(errno::EINVAL))
    }

    fn release(self) {
        // Dropping a JoinHandle detaches the thread.
    }
}

// Stack sizes are configured for the target, and std needs more than that for formatting and
// unwinding.
const HOST_MIN_STACK: usize = 256 * 1024;

thread_local! {
    // Set on threads created through `Host::thread_create`, for debugging.
    static PRIORITY: Cell<Option<i32>> = const { Cell::new(None) };
}

impl Platform for Host {
    type Mutex = HostMutex;
    type Semaphore = HostSemaphore;
    type Thread = HostThread;

    fn mutex_create(&self) -> Result<HostMutex> {
        Ok(HostMutex::new())
    }

    fn semaphore_create(&self, initial: u32, limit: u32) -> Result<HostSemaphore> {
        HostSemaphore::new(initial, limit)
    }

    fn thread_create(&self, config: &ThreadConfig, entry: ThreadEntry) -> Result<HostThread> {
        let priority = config.priority;
        trace!("spawn {:?}, priority {} is not used on the host", config.name, priority);
        let handle = thread::Builder::new()
            .name(config.name.into())
            .stack_size(config.stack_size.max(HOST_MIN_STACK))
            .spawn(move || {
                PRIORITY.with(|p| p.set(Some(priority)));
                entry();
            })
            .map_err(|e| {
                error!("thread spawn failed: {}", e);
                Error::Os(errno::ENOMEM)
            })?;
        Ok(HostThread { handle })
    }

    fn critical_enter(&self) -> RestoreState {
        // SAFETY: Paired with the release in `critical_exit`.
        unsafe { critical_section::acquire() }
    }

    unsafe fn critical_exit(&self, token: RestoreState) {
        critical_section::release(token)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(std::time::Duration::from_millis(duration.to_millis()));
    }
}

impl Host {
    /// The priority the calling thread was created with, if it was created through
    /// [`Platform::thread_create`].
    pub fn current_priority() -> Option<i32> {
        PRIORITY.with(|p| p.get())
    }
}
