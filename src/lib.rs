// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! A small, cancellable timer.
//!
//! A [`Timer`] runs a task once, or repeatedly, after a fixed interval. The task
//! either runs on a background thread owned by the timer, or the timer blocks
//! the calling thread until the interval elapses. Any thread with a reference to
//! the timer can [`cancel`](Timer::cancel) it.
//!
//! # Getting started
//!
//! ```
//! use tiny_timer::Timer;
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//! use std::time::Duration;
//!
//! let count = Arc::new(AtomicU32::new(0));
//! let timer = Timer::new();
//!
//! timer.run_loop_async(Duration::from_millis(5), {
//!     let count = Arc::clone(&count);
//!     move || { count.fetch_add(1, Ordering::Relaxed); }
//! }).unwrap();
//!
//! while count.load(Ordering::Relaxed) < 3 {
//!     std::thread::yield_now();
//! }
//! timer.cancel();
//! assert!(timer.wait_idle(Duration::from_secs(1)));
//! ```
//!
//! # Design
//!
//! Each timer manages exactly one logical timer. An armed timer is running a
//! _cycle_: the span from a successful [`arm`](Timer::arm) until the timer is
//! idle again. There is at most one cycle per timer. Arming a running timer is
//! rejected with [`ArmError::AlreadyActive`]; it's not queued.
//!
//! Cancellation is cooperative. It is observed while the cycle waits for the
//! next expiration, and it never interrupts a task that is already executing.
//! Cancelling never blocks. Use [`wait_idle`](Timer::wait_idle) if you need to
//! know that a cycle has finished.
//!
//! Dropping a timer cancels it, then waits (up to
//! [`drop_timeout`](TimerOptions::drop_timeout)) for the cycle to finish.
//!
//! # Features
//!
//! - `defmt`: public enums and [`TimerInfo`] implement `defmt::Format`.

#![warn(
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    let_underscore_drop,
    missing_docs,
    semicolon_in_expressions_from_macros,
    single_use_lifetimes,
    trivial_numeric_casts,
    unsafe_code,
    unreachable_pub,
    unused_qualifications,
    clippy::cast_possible_truncation,
    clippy::map_unwrap_or,
    clippy::manual_assert,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::single_match_else,
    clippy::used_underscore_binding
)]
#![allow(clippy::must_use_candidate)]

mod cycle;
mod panic;
mod thread;
pub mod timer;

pub use cycle::TimerState;
pub use timer::{ArmError, Execution, Schedule, Timer, TimerInfo, TimerOptions, TimerRunnable};
