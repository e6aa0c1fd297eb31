// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! # Low-level synchronization primitives.
//!
//! These traits describe the mutex and counting semaphore a platform provides.  They are
//! deliberately as direct as the RTOS calls they stand for: a mutex is locked and unlocked
//! explicitly, and a semaphore is taken and given.  Nothing here ties the lifetime of a lock to a
//! Rust scope.  The module `crate::sync` provides the higher level objects built from them.
//!
//! Both primitives release their platform resources when dropped.

mod mutex;
mod semaphore;

pub use mutex::RawMutex;
pub use semaphore::RawSemaphore;
