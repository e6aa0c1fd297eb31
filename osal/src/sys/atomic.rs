// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Atomic operations on 32-bit counters.
//!
//! These are the two primitives the waiter accounting in [`ThreadSync`] is built on.  They are
//! implemented on [`portable_atomic`], which uses native instructions where the target has them,
//! and falls back to a critical section where it does not.
//!
//! [`ThreadSync`]: crate::sync::ThreadSync

use portable_atomic::Ordering;

pub use portable_atomic::AtomicU32;

/// Atomically increment `cell`, returning the value it held before.
#[inline]
pub fn fetch_inc(cell: &AtomicU32) -> u32 {
    cell.fetch_add(1, Ordering::AcqRel)
}

/// Replace the value in `cell` with `new`, but only if it currently holds `expected`.
///
/// Returns whether the replacement happened.
#[inline]
pub fn cas(cell: &AtomicU32, new: u32, expected: u32) -> bool {
    cell.compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// Read the current value of `cell`.
#[inline]
pub fn load(cell: &AtomicU32) -> u32 {
    cell.load(Ordering::Acquire)
}
