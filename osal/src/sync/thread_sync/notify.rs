// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Task notification flavor of [`ThreadSync`].
//!
//! The state is a pending flag and the handle of the parked thread, only ever touched inside of
//! the platform's critical section.  At most one of the two is set.
//!
//! [`ThreadSync`]: super::ThreadSync

use core::cell::RefCell;
use core::mem;

use critical_section::Mutex;
use log::warn;

use super::SyncSnapshot;
use crate::error::Result;
use crate::sys::thread::TaskNotify;
use crate::sys::Platform;

struct NotifyState<H> {
    signal: bool,
    parked: Option<H>,
}

pub(super) struct NotifySync<P: Platform> {
    state: Mutex<RefCell<NotifyState<P::Handle>>>,
}

impl<P: Platform> NotifySync<P> {
    pub(super) fn new() -> NotifySync<P> {
        NotifySync {
            state: Mutex::new(RefCell::new(NotifyState {
                signal: false,
                parked: None,
            })),
        }
    }

    pub(super) fn wait(&self, platform: &P) -> Result<()> {
        let me = platform.current_thread();
        let (had, displaced) = platform.critical(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let had = mem::replace(&mut state.signal, false);
            let displaced = if had {
                false
            } else {
                state.parked.replace(me).is_some()
            };
            (had, displaced)
        });
        if displaced {
            warn!("sync: second waiter on notify flavor, the first will not be woken");
        }
        if !had {
            platform.notify_take();
        }
        Ok(())
    }

    pub(super) fn signal(&self, platform: &P) -> Result<()> {
        let parked = platform.critical(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let parked = state.parked.take();
            if parked.is_none() {
                state.signal = true;
            }
            parked
        });
        if let Some(handle) = parked {
            platform.notify_give(&handle);
        }
        Ok(())
    }

    pub(super) fn snapshot(&self, platform: &P, snap: &mut SyncSnapshot) {
        platform.critical(|cs| {
            let state = self.state.borrow_ref(cs);
            snap.signal = state.signal;
            snap.parked = state.parked.is_some();
        });
    }
}
