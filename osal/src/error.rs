// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # Osal errors
//!
//! This module contains an `Error` and `Result` type for use by all of the wrappers.  Operations
//! on the wrapped primitives either succeed, or fail with one of these.  Failures coming straight
//! from the platform layer, which reports them as negative errno style integers, are carried in
//! [`Error::Os`].

use core::ffi::c_int;
use core::fmt;

/// Errno values used by the platform backends in this crate.
pub mod errno {
    /// Operation not permitted, such as unlocking a mutex owned by another thread.
    pub const EPERM: u32 = 1;
    /// No such file or directory.
    pub const ENOENT: u32 = 2;
    /// Try again.  The operation would have blocked.
    pub const EAGAIN: u32 = 11;
    /// Out of memory.
    pub const ENOMEM: u32 = 12;
    /// Device or resource busy.
    pub const EBUSY: u32 = 16;
    /// Invalid argument.
    pub const EINVAL: u32 = 22;
    /// Resource deadlock would occur.
    pub const EDEADLK: u32 = 35;
}

/// An osal error.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The underlying mutex or semaphore could not be created.
    InitFailed,
    /// The underlying semaphore failed while a thread was waiting on it.
    WaitAborted,
    /// Releasing the underlying mutex failed.
    UnlockFailed,
    /// Acquiring the underlying mutex failed.
    LockFailed,
    /// More threads tried to wait at once than the configured maximum.
    TooManyWaiters,
    /// A raw error reported by the platform, as a positive errno.
    Os(u32),
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitFailed => write!(f, "osal error: primitive creation failed"),
            Error::WaitAborted => write!(f, "osal error: wait aborted"),
            Error::UnlockFailed => write!(f, "osal error: mutex unlock failed"),
            Error::LockFailed => write!(f, "osal error: mutex lock failed"),
            Error::TooManyWaiters => write!(f, "osal error: too many waiters"),
            Error::Os(errno) => write!(f, "osal error errno:{}", errno),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Wraps a value with a possible osal error.
pub type Result<T> = core::result::Result<T, Error>;

/// Map a return result from the platform into a Result.
///
/// Negative return results being considered errors.
#[inline(always)]
pub fn to_result(code: c_int) -> Result<c_int> {
    if code < 0 {
        Err(Error::Os(code.unsigned_abs()))
    } else {
        Ok(code)
    }
}

/// Map a return result, with a void result.
#[inline(always)]
pub fn to_result_void(code: c_int) -> Result<()> {
    to_result(code).map(|_| ())
}
