// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Thread support.
//!
//! A thread is started with [`Thread::spawn`], from a [`ThreadConfig`] giving its stack size,
//! priority and name, and any `Send` closure to run.  The [`Default`] configuration comes from
//! Kconfig, and is the one the UI library's drawing thread uses.
//!
//! The returned [`Thread`] can be joined, or deleted.  Deleting a thread only gives up the handle,
//! the thread keeps running until its closure returns.

use alloc::boxed::Box;
use core::fmt;

use log::{debug, error};

use crate::error::Result;
use crate::sys::thread::RawThread;
use crate::sys::Platform;
use crate::time::Duration;

pub use crate::sys::thread::ThreadConfig;

/// A running thread.
pub struct Thread<P: Platform> {
    raw: P::Thread,
    name: &'static str,
}

impl<P: Platform> Thread<P> {
    /// Create and start a new thread running `entry`.
    ///
    /// On failure, the error from the platform is logged and returned.
    pub fn spawn<F>(platform: &P, config: &ThreadConfig, entry: F) -> Result<Thread<P>>
    where
        F: FnOnce() + Send + 'static,
    {
        match platform.thread_create(config, Box::new(entry)) {
            Ok(raw) => {
                debug!("thread {:?} started", config.name);
                Ok(Thread {
                    raw,
                    name: config.name,
                })
            }
            Err(e) => {
                error!("thread {:?} create failed: {}", config.name, e);
                Err(e)
            }
        }
    }

    /// The name the thread was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> Result<()> {
        self.raw.join()
    }

    /// Give up this handle.  The thread continues to run.
    pub fn delete(self) -> Result<()> {
        self.raw.release();
        Ok(())
    }
}

impl<P: Platform> fmt::Debug for Thread<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({:?})", self.name)
    }
}

/// Put the current thread to sleep for at least `duration`.
pub fn sleep<P: Platform>(platform: &P, duration: Duration) {
    platform.sleep(duration)
}
