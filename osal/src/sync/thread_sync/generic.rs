// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Generic flavor of [`ThreadSync`].
//!
//! The pending flag lives under a mutex.  A thread that finds it clear registers itself in the
//! `waiters` count, drops the mutex and blocks on the semaphore.  A signaller sets the flag,
//! atomically takes the whole `waiters` count down to zero, and posts the semaphore that many
//! times.  The registration and the post being separate steps is what makes a lost wakeup
//! impossible: a post given before the waiter gets to the semaphore is simply already there when
//! it does.
//!
//! A single signal releases every waiter it counted.  Those waiters are tracked in `releasing`,
//! and the flag stays set until the last of them has come back through the mutex, which then
//! clears it.  Only a waiter coming back from the semaphore may leave through a flag held open
//! this way.  A thread arriving while a release is in progress registers and blocks for the next
//! signal.
//!
//! Registrations and posts are not tied to threads.  Such a newcomer may take a post given for a
//! waiter that was counted earlier, and leave in its place, which then takes the post for the
//! newcomer's registration on the next signal.  Every thread that takes a post gives up one place
//! in `releasing`.
//!
//! A waiter whose semaphore take fails withdraws its registration, or if a signaller got to it
//! first, takes a post anyway and gives up its place.  A counted waiter that cannot get the mutex
//! back adds its place to `retired` instead, and the next thread to take the mutex gives it up on
//! its behalf.
//!
//! [`ThreadSync`]: super::ThreadSync

use log::{error, warn};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::{SyncSnapshot, MAX_WAITERS};
use crate::error::{Error, Result};
use crate::sys::atomic;
use crate::sys::sync::{RawMutex, RawSemaphore};
use crate::sys::Platform;
use crate::time::Forever;

pub(super) struct GenericSync<P: Platform> {
    mtx: P::Mutex,
    sem: P::Semaphore,
    waiters: AtomicU32,
    // Only accessed with `mtx` held.
    signal: AtomicBool,
    releasing: AtomicU32,
    // Places in `releasing` given up by waiters that could not take `mtx`.
    retired: AtomicU32,
}

impl<P: Platform> GenericSync<P> {
    pub(super) fn new(platform: &P) -> Result<GenericSync<P>> {
        let sem = platform.semaphore_create(0, MAX_WAITERS)?;
        let mtx = platform.mutex_create()?;
        Ok(GenericSync {
            mtx,
            sem,
            waiters: AtomicU32::new(0),
            signal: AtomicBool::new(false),
            releasing: AtomicU32::new(0),
            retired: AtomicU32::new(0),
        })
    }

    fn lock(&self) -> Result<()> {
        self.mtx.lock(Forever.into()).map_err(|e| {
            error!("sync mutex lock failed: {}", e);
            Error::LockFailed
        })?;
        let retired = self.retired.swap(0, Ordering::AcqRel);
        if retired > 0 {
            self.release_slots(retired);
        }
        Ok(())
    }

    // Give up `count` places in `releasing`, clearing the flag with the last one.  `mtx` must be
    // held.
    fn release_slots(&self, count: u32) {
        let releasing = self.releasing.load(Ordering::Relaxed).saturating_sub(count);
        self.releasing.store(releasing, Ordering::Relaxed);
        if releasing == 0 {
            self.signal.store(false, Ordering::Relaxed);
        }
    }

    fn unlock(&self) -> Result<()> {
        // SAFETY: Only called by a thread that took `mtx` through `lock`.
        unsafe { self.mtx.unlock() }.map_err(|e| {
            error!("sync mutex unlock failed: {}", e);
            Error::UnlockFailed
        })
    }

    pub(super) fn wait(&self) -> Result<()> {
        self.lock()?;
        let mut resumed = false;
        while !self.signal.load(Ordering::Relaxed)
            || (!resumed && self.releasing.load(Ordering::Relaxed) > 0)
        {
            let registered = atomic::fetch_inc(&self.waiters) + 1;
            if registered > MAX_WAITERS {
                // No signaller can count us out while `mtx` is held.
                self.test_and_decrement(registered);
                self.unlock()?;
                warn!("sync: more than {} waiters", MAX_WAITERS);
                return Err(Error::TooManyWaiters);
            }
            if let Err(e) = self.unlock() {
                self.abort(registered);
                return Err(e);
            }
            if let Err(e) = self.sem.take(Forever.into()) {
                error!("sync semaphore take failed: {}", e);
                self.abort(registered);
                return Err(Error::WaitAborted);
            }
            if let Err(e) = self.lock() {
                // The post is taken, the place in `releasing` is left for the next locker.
                self.retired.fetch_add(1, Ordering::AcqRel);
                return Err(e);
            }
            resumed = true;
        }

        if resumed {
            self.release_slots(1);
        } else {
            // Consumed a latched signal, no release is in progress.
            self.signal.store(false, Ordering::Relaxed);
        }
        self.unlock()
    }

    pub(super) fn signal(&self) -> Result<()> {
        self.lock()?;
        self.signal.store(true, Ordering::Relaxed);
        let mut count = atomic::load(&self.waiters);
        while count > 0 {
            if atomic::cas(&self.waiters, 0, count) {
                let releasing = self.releasing.load(Ordering::Relaxed);
                self.releasing.store(releasing + count, Ordering::Relaxed);
                for _ in 0..count {
                    self.sem.give();
                }
                break;
            }
            count = atomic::load(&self.waiters);
        }
        self.unlock()
    }

    /// Withdraw one registration, given that `observed` waiters were seen.
    ///
    /// Returns false if the count was already zero, meaning a signaller has counted this waiter
    /// out and posted for it.
    fn test_and_decrement(&self, mut observed: u32) -> bool {
        loop {
            if observed == 0 {
                return false;
            }
            if atomic::cas(&self.waiters, observed - 1, observed) {
                return true;
            }
            observed = atomic::load(&self.waiters);
        }
    }

    // Back out of a wait that failed before taking a post.
    fn abort(&self, registered: u32) {
        if self.test_and_decrement(registered) {
            return;
        }
        // A signaller has counted this waiter, so it owes the semaphore one take.
        if let Err(e) = self.sem.take(Forever.into()) {
            error!("sync: post left behind on abort: {}", e);
        }
        if self.lock().is_err() {
            self.retired.fetch_add(1, Ordering::AcqRel);
            return;
        }
        self.release_slots(1);
        let _ = self.unlock();
    }

    pub(super) fn snapshot(&self, snap: &mut SyncSnapshot) {
        snap.signal = self.signal.load(Ordering::Relaxed);
        snap.waiters = atomic::load(&self.waiters);
        snap.releasing = self.releasing.load(Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(super) fn posts(&self) -> u32 {
        self.sem.count_get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::mock::{Mock, Stats};
    use crate::time::NoWait;

    #[test]
    fn created_empty() {
        let mock = Mock::new();
        let sync = GenericSync::new(&mock).unwrap();
        assert_eq!(Stats::get(&mock.stats.semaphores_created), 1);
        assert_eq!(Stats::get(&mock.stats.mutexes_created), 1);
        assert_eq!(atomic::load(&sync.waiters), 0);
        assert_eq!(sync.sem.count_get(), 0);
    }

    #[test]
    fn mutex_failure_releases_semaphore() {
        let mock = Mock::new();
        mock.stats.fail_mutex_create.store(true, Ordering::Release);
        assert!(GenericSync::new(&mock).is_err());
        assert_eq!(Stats::get(&mock.stats.semaphores_created), 1);
        assert_eq!(Stats::get(&mock.stats.semaphores_dropped), 1);
    }

    #[test]
    fn test_and_decrement_stops_at_zero() {
        let sync = GenericSync::new(&Mock::new()).unwrap();
        sync.waiters.store(2, Ordering::Release);
        // A stale observation is reloaded.
        assert!(sync.test_and_decrement(5));
        assert_eq!(atomic::load(&sync.waiters), 1);
        assert!(sync.test_and_decrement(1));
        assert!(!sync.test_and_decrement(1));
        assert_eq!(atomic::load(&sync.waiters), 0);
    }

    #[test]
    fn abort_after_count_out_retires() {
        let sync = GenericSync::new(&Mock::new()).unwrap();
        // A waiter registers, and is counted out before it reaches the semaphore.
        let registered = atomic::fetch_inc(&sync.waiters) + 1;
        sync.signal().unwrap();
        assert_eq!(sync.sem.count_get(), 1);
        assert_eq!(sync.releasing.load(Ordering::Relaxed), 1);

        sync.abort(registered);
        assert_eq!(sync.sem.count_get(), 0);
        assert_eq!(sync.releasing.load(Ordering::Relaxed), 0);
        assert!(!sync.signal.load(Ordering::Relaxed));
    }

    #[test]
    fn abort_before_count_out_withdraws() {
        let mock = Mock::new();
        let sync = GenericSync::new(&mock).unwrap();
        let registered = atomic::fetch_inc(&sync.waiters) + 1;
        sync.abort(registered);
        assert_eq!(atomic::load(&sync.waiters), 0);
        sync.signal().unwrap();
        assert_eq!(Stats::get(&mock.stats.gives), 0);
        // The signal is pending for the next waiter.
        sync.wait().unwrap();
        assert!(!sync.signal.load(Ordering::Relaxed));
    }

    #[test]
    fn abort_with_lock_failure_retires() {
        let mock = Mock::new();
        let sync = GenericSync::new(&mock).unwrap();
        let registered = atomic::fetch_inc(&sync.waiters) + 1;
        sync.signal().unwrap();
        mock.stats.fail_locks.store(1, Ordering::Release);

        sync.abort(registered);
        // The post is drained, and the place is left for the next locker.
        assert_eq!(sync.sem.count_get(), 0);
        assert_eq!(sync.retired.load(Ordering::Acquire), 1);
        assert_eq!(sync.releasing.load(Ordering::Relaxed), 1);

        sync.lock().unwrap();
        sync.unlock().unwrap();
        assert_eq!(sync.retired.load(Ordering::Acquire), 0);
        assert_eq!(sync.releasing.load(Ordering::Relaxed), 0);
        assert!(!sync.signal.load(Ordering::Relaxed));
    }

    #[test]
    fn newcomer_waits_for_next_signal() {
        let sync = GenericSync::new(&Mock::new()).unwrap();
        let sync = &sync;
        // A counted waiter has taken its post, and not yet come back through the mutex.
        atomic::fetch_inc(&sync.waiters);
        sync.signal().unwrap();
        sync.sem.take(NoWait.into()).unwrap();
        assert!(sync.signal.load(Ordering::Relaxed));

        std::thread::scope(|s| {
            let (tx, rx) = std::sync::mpsc::channel();
            s.spawn(move || tx.send(sync.wait()).unwrap());
            assert!(rx.recv_timeout(std::time::Duration::from_millis(50)).is_err());
            assert_eq!(atomic::load(&sync.waiters), 1);
            sync.signal().unwrap();
            assert_eq!(rx.recv().unwrap(), Ok(()));
        });
        assert_eq!(sync.releasing.load(Ordering::Relaxed), 1);

        // The first waiter comes back, ending the release.
        sync.lock().unwrap();
        sync.release_slots(1);
        sync.unlock().unwrap();
        assert!(!sync.signal.load(Ordering::Relaxed));
    }
}
