// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Critical sections.
//!
//! The critical section is a single, process wide, scheduler lock.  It is only held for short,
//! bounded regions that never block: the lazy initialization of the objects in [`crate::sync`],
//! and the state transitions of the task notification based [`ThreadSync`].
//!
//! Platforms provide the raw enter/exit pair through [`Platform`].  This module wraps that pair
//! so that the critical section is always left, and hands out the [`CriticalSection`] token used
//! by the [`critical_section::Mutex`] type to protect data.
//!
//! [`ThreadSync`]: crate::sync::ThreadSync

use critical_section::{CriticalSection, RestoreState};

use super::Platform;

/// An entered critical section, left when this is dropped.
pub struct CriticalGuard<'a, P: Platform> {
    platform: &'a P,
    token: RestoreState,
}

impl<'a, P: Platform> CriticalGuard<'a, P> {
    /// Enter the critical section of `platform`.
    pub fn enter(platform: &'a P) -> CriticalGuard<'a, P> {
        let token = platform.critical_enter();
        CriticalGuard { platform, token }
    }
}

impl<P: Platform> Drop for CriticalGuard<'_, P> {
    fn drop(&mut self) {
        // SAFETY: The token came from the `critical_enter` in `enter`, and guards are dropped in
        // reverse order of creation.
        unsafe {
            self.platform.critical_exit(self.token);
        }
    }
}

/// Run `f` with the critical section of `platform` held.
pub fn with<P: Platform, R>(platform: &P, f: impl FnOnce(CriticalSection<'_>) -> R) -> R {
    let _guard = CriticalGuard::enter(platform);
    // SAFETY: The critical section is held until `_guard` is dropped, after `f` returns, and the
    // token cannot escape `f`.
    let cs = unsafe { CriticalSection::new() };
    f(cs)
}
