// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Time and timeouts
//!
//! Blocking operations in this crate take a [`Timeout`].  The thread synchronization built here
//! never waits for a bounded time, so the only timeouts are "as long as it takes" ([`Forever`])
//! and "not at all" ([`NoWait`]).  Both markers convert into a [`Timeout`].
//!
//! Delays, such as the one given to [`sleep`], are expressed as a [`Duration`], which is a
//! millisecond based duration from the [`fugit`] crate.
//!
//! [`sleep`]: crate::thread::sleep

/// A millisecond resolution duration.
pub type Duration = fugit::MillisDurationU64;

/// Wait as long as necessary for the operation to complete.
#[derive(Clone, Copy, Debug)]
pub struct Forever;

/// Do not wait.  The operation fails if it cannot complete immediately.
#[derive(Clone, Copy, Debug)]
pub struct NoWait;

/// How long a blocking platform call may block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the operation completes.
    Forever,
    /// Return an error instead of blocking.
    NoWait,
}

impl From<Forever> for Timeout {
    fn from(_value: Forever) -> Timeout {
        Timeout::Forever
    }
}

impl From<NoWait> for Timeout {
    fn from(_value: NoWait) -> Timeout {
        Timeout::NoWait
    }
}
