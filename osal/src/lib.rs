// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! OS abstraction shims for an embedded UI stack
//!
//! This crate provides the small set of operating system services a graphics library needs from
//! the platform underneath it: threads, mutexes, a one-shot thread synchronization object, and a
//! filesystem driver that forwards to the platform file API.
//!
//! The platform itself is never reached through globals.  Every primitive is created through an
//! implementation of [`sys::Platform`], handed to the objects that need it.  With the `host`
//! feature (on by default), [`sys::host::Host`] implements this on top of `std`.

#![cfg_attr(not(feature = "host"), no_std)]
#![allow(unexpected_cfgs)]
#![deny(missing_docs)]

extern crate alloc;

pub mod error;
pub mod fs;
pub mod logging;
pub mod sync;
pub mod sys;
pub mod thread;
pub mod time;

pub use error::{Error, Result};

pub use logging::set_logger;

// Bring in the generated kconfig module
pub mod kconfig {
    //! Osal Kconfig values.
    //!
    //! This module contains an auto-generated set of constants corresponding to the numeric and
    //! string values in the `defconfig` (and any `DOTCONFIG` overlay) at build time.  Boolean
    //! values are available as `cfg` flags instead.

    // Don't enforce doc comments on the generated code.
    #![allow(missing_docs)]

    include!(concat!(env!("OUT_DIR"), "/kconfig.rs"));
}
