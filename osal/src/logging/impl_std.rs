// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! Logging to stderr
//!
//! This module implements a log handler (for the [`log`] crate) that writes messages to the
//! process's stderr, one line per message.
//!
//! Currently, filtering is global, and set to Info.

use std::io::Write;

use log::{Log, Metadata, Record, SetLoggerError};

/// A simple log handler, writing to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    // For now, everything is just available.
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    // The stderr lock keeps lines from different threads from being interleaved.  There is
    // nowhere to report a failed write.
    fn log(&self, record: &Record<'_>) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}:{}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static STDERR_LOGGER: StderrLogger = StderrLogger;

/// Set the log handler to log messages to stderr.
///
/// # Safety
///
/// This is unsafe due to racy issues in the log framework on targets that do not support atomic
/// pointers.  As long as this is called ever by a single thread, it is safe to use.
pub unsafe fn set_logger() -> Result<(), SetLoggerError> {
    super::set_logger_internal(&STDERR_LOGGER)
}
