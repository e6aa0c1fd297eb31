// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Higher level synchronization primitives.
//!
//! These are the objects a UI library uses to coordinate its threads: a [`Mutex`], and the
//! one-shot [`ThreadSync`] used to hand work between a producer and its consumers.  Both are
//! built on the raw primitives of a [`Platform`], and both can be declared as plain `static`s:
//! construction is `const` and does not touch the platform.  The platform objects behind them
//! are created the first time they are used, from whichever thread gets there first.
//!
//! [`Platform`]: crate::sys::Platform

pub mod atomic {
    //! Re-export portable atomic.
    //!
    //! Although `core` contains a
    //! [`sync::atomic`](https://doc.rust-lang.org/stable/core/sync/atomic/index.html) module,
    //! these are dependent on the target having atomic instructions, and the types are missing
    //! when the platform cannot support them.  In the Rust-embedded world, this is handled by the
    //! [`portable-atomic`](https://crates.io/crates/portable-atomic) crate, which will either just
    //! re-export the types from core, or provide an implementation using a critical section when
    //! those aren't available.

    pub use portable_atomic::*;
}

pub use portable_atomic_util::Arc;
pub use portable_atomic_util::Weak;

mod lazy;

pub use lazy::LazyInit;

mod mutex;

pub use mutex::{Mutex, MutexGuard};

mod thread_sync;

pub use thread_sync::{Flavor, SyncSnapshot, ThreadSync, MAX_WAITERS};
