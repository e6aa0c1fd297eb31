// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Logging for osal
//!
//! All logging in this crate goes through the `log` crate.  Applications that want to see the
//! messages call [`set_logger`] once at startup, before starting any other threads.
//!
//! With the `host` feature, the messages are written to stderr.  Otherwise there is nowhere in
//! particular to send them, and the application is expected to install a logger of its own, for
//! whatever output the platform has.
//!
//! Failures of the platform primitives are logged at `error`, object creation and removal at
//! `debug`.

use log::{LevelFilter, Log, SetLoggerError};

cfg_if::cfg_if! {
    if #[cfg(feature = "host")] {
        mod impl_std;
        pub use impl_std::set_logger;
    } else {
        /// No logging is possible, provide an empty handler that does nothing.
        ///
        /// # Safety
        ///
        /// Nothing is installed, this is always safe to call.
        pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
            Ok(())
        }
    }
}

// The Rust logging system has different entry points based on whether or not we are on a target
// with atomic pointers.  The safety has to do with initialization order, and as long as this is
// called before any other threads run, it should be safe.
cfg_if::cfg_if! {
    if #[cfg(target_has_atomic = "ptr")] {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger(logger)?;
            log::set_max_level(LevelFilter::Info);
            Ok(())
        }
    } else {
        #[allow(dead_code)]
        unsafe fn set_logger_internal(logger: &'static dyn Log) -> Result<(), SetLoggerError> {
            log::set_logger_racy(logger)?;
            log::set_max_level_racy(LevelFilter::Info);
            Ok(())
        }
    }
}
