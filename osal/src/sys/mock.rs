// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! An instrumented platform for tests.
//!
//! Wraps [`Host`], counting every primitive created and dropped, every semaphore give, every task
//! notification and every critical section entry.  Failures can be injected into primitive
//! creation, semaphore takes, mutex locks and mutex unlocks.  Mutex locks can also be held up.
//! Lock failures and stalls apply to the thread set with [`Stats::target`], or to every thread if
//! none is set.
//!
//! The const parameter selects whether the platform claims to have task notification.

use std::sync::Mutex;
use std::thread::{self, ThreadId};

use critical_section::RestoreState;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::host::{Host, HostHandle, HostMutex, HostSemaphore, HostThread};
use super::sync::{RawMutex, RawSemaphore};
use super::thread::{TaskNotify, ThreadConfig};
use super::{Platform, ThreadEntry};
use crate::error::{errno, Error, Result};
use crate::sync::Arc;
use crate::time::{Duration, Timeout};

#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub mutexes_created: AtomicU32,
    pub mutexes_dropped: AtomicU32,
    pub semaphores_created: AtomicU32,
    pub semaphores_dropped: AtomicU32,
    pub gives: AtomicU32,
    pub notify_gives: AtomicU32,
    pub critical_entries: AtomicU32,
    pub fail_mutex_create: AtomicBool,
    pub fail_semaphore_create: AtomicBool,
    pub fail_takes: AtomicU32,
    pub fail_locks: AtomicU32,
    pub fail_unlocks: AtomicU32,
    pub stall_locks: AtomicBool,
    // Locks currently held up by `stall_locks`.
    pub stalled: AtomicU32,
    target: Mutex<Option<ThreadId>>,
}

impl Stats {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::Acquire)
    }

    /// Aim lock failures and stalls at one thread.
    pub fn target(&self, id: ThreadId) {
        if let Ok(mut target) = self.target.lock() {
            *target = Some(id);
        }
    }

    fn targeted(&self) -> bool {
        match self.target.lock() {
            Ok(target) => target.map_or(true, |id| id == thread::current().id()),
            Err(_) => false,
        }
    }
}

// Consume one injected failure, if any are armed.
fn consume(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Clone, Debug)]
pub(crate) struct Mock<const NOTIFY: bool = true> {
    pub stats: Arc<Stats>,
}

impl Mock {
    pub fn new() -> Mock {
        Mock { stats: Arc::new(Stats::default()) }
    }
}

impl Mock<false> {
    pub fn without_notify() -> Mock<false> {
        Mock { stats: Arc::new(Stats::default()) }
    }
}

#[derive(Debug)]
pub(crate) struct MockMutex {
    inner: HostMutex,
    stats: Arc<Stats>,
}

impl RawMutex for MockMutex {
    fn lock(&self, timeout: Timeout) -> Result<()> {
        if self.stats.targeted() {
            if self.stats.stall_locks.load(Ordering::Acquire) {
                self.stats.stalled.fetch_add(1, Ordering::AcqRel);
                while self.stats.stall_locks.load(Ordering::Acquire) {
                    thread::sleep(std::time::Duration::from_millis(1));
                }
                self.stats.stalled.fetch_sub(1, Ordering::AcqRel);
            }
            if consume(&self.stats.fail_locks) {
                return Err(Error::Os(errno::EINVAL));
            }
        }
        self.inner.lock(timeout)
    }

    unsafe fn unlock(&self) -> Result<()> {
        self.inner.unlock()?;
        // The release did happen, but the platform reports otherwise.
        if consume(&self.stats.fail_unlocks) {
            return Err(Error::Os(errno::EPERM));
        }
        Ok(())
    }
}

impl Drop for MockMutex {
    fn drop(&mut self) {
        self.stats.mutexes_dropped.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug)]
pub(crate) struct MockSemaphore {
    inner: HostSemaphore,
    stats: Arc<Stats>,
}

impl RawSemaphore for MockSemaphore {
    fn take(&self, timeout: Timeout) -> Result<()> {
        if consume(&self.stats.fail_takes) {
            return Err(Error::Os(errno::EAGAIN));
        }
        self.inner.take(timeout)
    }

    fn give(&self) {
        self.stats.gives.fetch_add(1, Ordering::AcqRel);
        self.inner.give();
    }

    fn count_get(&self) -> u32 {
        self.inner.count_get()
    }
}

impl Drop for MockSemaphore {
    fn drop(&mut self) {
        self.stats.semaphores_dropped.fetch_add(1, Ordering::AcqRel);
    }
}

impl<const NOTIFY: bool> TaskNotify for Mock<NOTIFY> {
    const HAS_TASK_NOTIFY: bool = NOTIFY;

    type Handle = HostHandle;

    fn current_thread(&self) -> HostHandle {
        Host.current_thread()
    }

    fn notify_take(&self) {
        Host.notify_take()
    }

    fn notify_give(&self, handle: &HostHandle) {
        self.stats.notify_gives.fetch_add(1, Ordering::AcqRel);
        Host.notify_give(handle)
    }
}

impl<const NOTIFY: bool> Platform for Mock<NOTIFY> {
    type Mutex = MockMutex;
    type Semaphore = MockSemaphore;
    type Thread = HostThread;

    fn mutex_create(&self) -> Result<MockMutex> {
        if self.stats.fail_mutex_create.load(Ordering::Acquire) {
            return Err(Error::Os(errno::ENOMEM));
        }
        self.stats.mutexes_created.fetch_add(1, Ordering::AcqRel);
        Ok(MockMutex { inner: Host.mutex_create()?, stats: self.stats.clone() })
    }

    fn semaphore_create(&self, initial: u32, limit: u32) -> Result<MockSemaphore> {
        if self.stats.fail_semaphore_create.load(Ordering::Acquire) {
            return Err(Error::Os(errno::ENOMEM));
        }
        self.stats.semaphores_created.fetch_add(1, Ordering::AcqRel);
        Ok(MockSemaphore {
            inner: Host.semaphore_create(initial, limit)?,
            stats: self.stats.clone(),
        })
    }

    fn thread_create(&self, config: &ThreadConfig, entry: ThreadEntry) -> Result<HostThread> {
        Host.thread_create(config, entry)
    }

    fn critical_enter(&self) -> RestoreState {
        self.stats.critical_entries.fetch_add(1, Ordering::AcqRel);
        Host.critical_enter()
    }

    unsafe fn critical_exit(&self, token: RestoreState) {
        Host.critical_exit(token)
    }

    fn sleep(&self, duration: Duration) {
        Host.sleep(duration)
    }
}
