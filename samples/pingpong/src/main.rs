// Copyright (c) 2024 Linaro LTD
// SPDX-License-Identifier: Apache-2.0

//! The shape of a UI library's drawing loop.
//!
//! The main thread prepares a frame, then wakes the drawing thread and waits for it to finish,
//! the way a renderer hands work to a dedicated draw task.  The frame counter is shared through a
//! lazily created mutex.

use log::{error, info};

use osal::sync::atomic::{AtomicU32, Ordering};
use osal::sync::{Mutex, ThreadSync};
use osal::sys::host::Host;
use osal::thread::{sleep, Thread, ThreadConfig};
use osal::time::Duration;

/// How many frames to draw before quitting.
const FRAMES: u32 = 10;

static DRAW_START: ThreadSync<Host> = ThreadSync::new(Host);
static DRAW_DONE: ThreadSync<Host> = ThreadSync::new(Host);
static FRAME_LOCK: Mutex<Host> = Mutex::new(Host);

// Only updated with FRAME_LOCK held.
static DRAWN: AtomicU32 = AtomicU32::new(0);

fn draw_loop() {
    for _ in 0..FRAMES {
        if let Err(e) = DRAW_START.wait() {
            error!("draw wait: {}", e);
            return;
        }
        let frame = match FRAME_LOCK.guard() {
            Ok(_guard) => {
                let drawn = DRAWN.load(Ordering::Relaxed) + 1;
                DRAWN.store(drawn, Ordering::Relaxed);
                drawn
            }
            Err(e) => {
                error!("frame lock: {}", e);
                return;
            }
        };
        sleep(&Host, Duration::millis(5));
        info!("drew frame {}", frame);
        if let Err(e) = DRAW_DONE.signal() {
            error!("draw signal: {}", e);
            return;
        }
    }
}

fn main() -> osal::Result<()> {
    unsafe {
        if osal::set_logger().is_err() {
            eprintln!("logger already set");
        }
    }

    info!("sync flavor: {:?}", DRAW_START.flavor());

    let drawer = Thread::spawn(&Host, &ThreadConfig::default(), draw_loop)?;
    info!("started {}", drawer.name());

    for frame in 1..=FRAMES {
        info!("prepare frame {}", frame);
        DRAW_START.signal()?;
        DRAW_DONE.wait()?;
    }

    drawer.join()?;
    let drawn = {
        let _guard = FRAME_LOCK.guard()?;
        DRAWN.load(Ordering::Relaxed)
    };
    info!("done, {} frames", drawn);
    Ok(())
}
