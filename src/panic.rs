// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Containing task panics.
//!
//! A task that panics ends its cycle. The timer returns to idle, just like
//! an expired one-shot, and it can be armed again.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use crate::timer::TimerRunnable;

/// Invoke the task, catching any unwind.
///
/// The runnable is never invoked again after it panics, so observing a
/// broken invariant in its state isn't possible.
pub(crate) fn catch_unwind_task<R: TimerRunnable + ?Sized>(
    runnable: &mut R,
) -> Result<(), Box<dyn Any + Send + 'static>> {
    panic::catch_unwind(AssertUnwindSafe(|| runnable.on_timer_expire()))
}

/// Drop the runnable, catching any unwind from its `Drop`.
pub(crate) fn catch_unwind_drop<R: TimerRunnable>(
    runnable: R,
) -> Result<(), Box<dyn Any + Send + 'static>> {
    panic::catch_unwind(AssertUnwindSafe(move || drop(runnable)))
}

/// Describe a panic payload for logging.
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "Box<dyn Any>"
    }
}
