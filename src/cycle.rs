// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Timer cycles, and the state they share with their timer.
//!
//! A [`Shared`] block holds the timer's state behind one mutex. The same mutex
//! guards the condition variable that wakes a waiting cycle. The timer and its
//! cycle each hold an `Arc` to the block, so a cycle never outlives the state
//! it touches, even when its timer is gone.

use std::{
    any::Any,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::timer::{Schedule, TimerRunnable};

/// Where a timer is in its lifecycle.
///
/// Query with [`Timer::state`](crate::Timer::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// No cycle is in flight. The timer can be armed.
    #[default]
    Idle,
    /// A cycle is waiting for, or executing, its task.
    Running,
    /// A cycle is in flight, and it has been asked to stop.
    ///
    /// The cycle returns the timer to [`Idle`](Self::Idle) once it
    /// observes the request.
    CancelRequested,
}

pub(crate) struct Inner {
    pub(crate) state: TimerState,
    pub(crate) schedule: Schedule,
    pub(crate) run_count: u64,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    signal: Condvar,
}

/// How a cycle ended.
pub(crate) enum CycleEnd {
    /// The schedule ran out.
    Expired,
    /// Cancellation was observed at a wait boundary.
    Cancelled,
    /// The task, or the runnable's drop, panicked. Carries the first panic
    /// payload.
    Panicked(Box<dyn Any + Send + 'static>),
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: TimerState::Idle,
                schedule: Schedule::Once,
                run_count: 0,
            }),
            signal: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }

    /// Move from idle to running.
    ///
    /// Returns `false`, and changes nothing, if the timer isn't idle.
    pub(crate) fn try_begin(&self, schedule: Schedule) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != TimerState::Idle {
            return false;
        }
        inner.state = TimerState::Running;
        inner.schedule = schedule;
        inner.run_count = 0;
        true
    }

    /// Ask a running cycle to stop, and wake it.
    ///
    /// Returns `false` if there's no running cycle, or if a request is
    /// already pending.
    pub(crate) fn request_cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != TimerState::Running {
            return false;
        }
        inner.state = TimerState::CancelRequested;
        self.signal.notify_all();
        true
    }

    /// Return to idle. This is the last thing a cycle does.
    pub(crate) fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.state = TimerState::Idle;
        self.signal.notify_all();
    }

    /// Wait until the timer is idle, or until `timeout` elapses.
    ///
    /// Returns `true` if the timer is idle.
    pub(crate) fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut inner = self.inner.lock();
        while inner.state != TimerState::Idle {
            match deadline {
                Some(deadline) => {
                    if self.signal.wait_until(&mut inner, deadline).timed_out() {
                        return inner.state == TimerState::Idle;
                    }
                }
                None => self.signal.wait(&mut inner),
            }
        }
        true
    }

    /// Wait up to `interval` for a cancellation request.
    ///
    /// Returns `true` if cancellation was requested. Spurious wakeups, and
    /// wakeups meant for [`wait_idle`](Self::wait_idle), go back to waiting
    /// for the same deadline.
    fn wait_for_cancel(&self, inner: &mut MutexGuard<'_, Inner>, interval: Duration) -> bool {
        let deadline = Instant::now().checked_add(interval);
        loop {
            if inner.state == TimerState::CancelRequested {
                return true;
            }
            match deadline {
                Some(deadline) => {
                    if self.signal.wait_until(inner, deadline).timed_out() {
                        return inner.state == TimerState::CancelRequested;
                    }
                }
                None => self.signal.wait(inner),
            }
        }
    }
}

/// Run one cycle on the calling thread.
///
/// The timer must already be running; see [`Shared::try_begin`]. The
/// runnable is dropped before the timer returns to idle. The timer returns to
/// idle even if that drop panics.
pub(crate) fn run<R: TimerRunnable>(shared: &Shared, interval: Duration, mut runnable: R) -> CycleEnd {
    let end = {
        let mut inner = shared.lock();
        loop {
            if shared.wait_for_cancel(&mut inner, interval) {
                break CycleEnd::Cancelled;
            }

            let repeat = inner.schedule == Schedule::Repeat;
            let result = MutexGuard::unlocked(&mut inner, || {
                crate::panic::catch_unwind_task(&mut runnable)
            });
            inner.run_count = inner.run_count.saturating_add(1);
            tracing::trace!(run_count = inner.run_count, "timer expired");

            if let Err(payload) = result {
                break CycleEnd::Panicked(payload);
            }
            if !repeat {
                break CycleEnd::Expired;
            }
        }
    };

    // The runnable's drop may call back into the timer. Don't hold the lock.
    let dropped = crate::panic::catch_unwind_drop(runnable);
    shared.finish();

    match (end, dropped) {
        (CycleEnd::Panicked(payload), _) | (_, Err(payload)) => CycleEnd::Panicked(payload),
        (end, Ok(())) => end,
    }
}
