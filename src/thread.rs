// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Background threads for timer cycles.

use std::{
    io,
    thread::{self, JoinHandle},
};

use crate::timer::TimerOptions;

/// Spawn a thread configured by the timer options.
pub(crate) fn spawn<F>(opts: &TimerOptions, entry: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let mut builder = thread::Builder::new();
    if let Some(name) = &opts.name {
        builder = builder.name(name.clone());
    }
    if let Some(stack_size) = opts.stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder.spawn(entry)
}

/// Join a thread whose cycle already returned the timer to idle.
///
/// The cycle catches task panics, so the thread only fails if the
/// bookkeeping around the task panicked.
pub(crate) fn join_finished(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::warn!("timer thread terminated with a panic");
    }
}

/// Returns `true` if the caller is running on `handle`'s thread.
pub(crate) fn is_current(handle: &JoinHandle<()>) -> bool {
    handle.thread().id() == thread::current().id()
}
