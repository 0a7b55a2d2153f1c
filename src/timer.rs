// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Timer services.
//!
//! A [`Timer`] invokes a runnable, generalized by [`TimerRunnable`], after an
//! interval elapses. Given a [`Schedule`], the timer invokes the runnable once,
//! or repeatedly until it's cancelled. Given an [`Execution`], the runnable
//! executes on a background thread owned by the timer, or on the thread that
//! armed the timer.
//!
//! The interval is measured from the end of one invocation to the start of the
//! next. Long-running tasks delay the following expiration.
//!
//! # Examples
//!
//! A one-shot timer that's cancelled before it expires. The task never runs.
//!
//! ```
//! use tiny_timer::{Timer, TimerState};
//! use std::time::Duration;
//!
//! let timer = Timer::new();
//! timer.run_once_async(Duration::from_secs(60), || unreachable!()).unwrap();
//! assert_eq!(timer.state(), TimerState::Running);
//!
//! timer.cancel();
//! assert!(timer.wait_idle(Duration::from_secs(1)));
//! assert_eq!(timer.run_count(), 0);
//! ```
//!
//! A timer shared with another thread. The other thread cancels the blocking
//! wait early.
//!
//! ```
//! use tiny_timer::Timer;
//! use std::time::Duration;
//!
//! let timer = Timer::new();
//! std::thread::scope(|scope| {
//!     scope.spawn(|| {
//!         while timer.is_idle() {
//!             std::thread::yield_now();
//!         }
//!         timer.cancel();
//!     });
//!     timer.run_once_blocking(Duration::from_secs(60), || unreachable!()).unwrap();
//! });
//! assert_eq!(timer.run_count(), 0);
//! ```
//!
//! The runnable must be `Send` and `'static`; share state with `Arc`.
//!
//! ```compile_fail
//! use tiny_timer::Timer;
//! use std::{rc::Rc, cell::Cell, time::Duration};
//!
//! let count = Rc::new(Cell::new(0));
//! let timer = Timer::new();
//! timer.run_once_async(Duration::from_millis(1), move || count.set(count.get() + 1));
//! ```
//!
//! ```compile_fail
//! use tiny_timer::Timer;
//! use std::time::Duration;
//!
//! let msg = String::from("hello");
//! let msg = &msg;
//! let timer = Timer::new();
//! timer.run_once_async(Duration::from_millis(1), move || println!("{msg}"));
//! ```

use std::{io, panic, sync::Arc, thread::JoinHandle, time::Duration};

use parking_lot::Mutex;

use crate::cycle::{self, CycleEnd, Shared, TimerState};

/// An error when arming a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError {
    /// The timer is running, or its cancellation is still pending.
    ///
    /// This isn't a fault. Try again once the timer is idle; see
    /// [`Timer::wait_idle`].
    #[error("timer is already active")]
    AlreadyActive,
    /// The interval was zero.
    #[error("timer interval must be non-zero")]
    ZeroInterval,
    /// The background thread could not be spawned.
    ///
    /// The timer is idle again.
    #[error("failed to spawn timer thread ({kind:?})")]
    SpawnFailed {
        /// Why the operating system refused the thread.
        #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
        kind: io::ErrorKind,
    },
}

/// How often the timer invokes its runnable.
///
/// The default schedule is [`Once`](Schedule::Once).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Schedule {
    /// Invoke the runnable after the first interval, then go idle.
    #[default]
    Once,
    /// Invoke the runnable after every interval until cancelled.
    ///
    /// Only meaningful for [`Background`](Execution::Background) execution.
    /// Blocking timers always run once.
    Repeat,
}

impl From<bool> for Schedule {
    #[inline]
    fn from(repeat: bool) -> Self {
        if repeat {
            Self::Repeat
        } else {
            Self::Once
        }
    }
}

impl From<Schedule> for bool {
    #[inline]
    fn from(schedule: Schedule) -> Self {
        schedule == Schedule::Repeat
    }
}

/// Where the timer's cycle executes.
///
/// The default execution is [`Background`](Execution::Background).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Execution {
    /// A new thread waits for the interval and invokes the runnable.
    ///
    /// [`arm`](Timer::arm) returns as soon as the thread is spawned.
    #[default]
    Background,
    /// The calling thread waits for the interval and invokes the runnable.
    ///
    /// [`arm`](Timer::arm) returns after the cycle completes. Another
    /// thread can still [`cancel`](Timer::cancel) the wait.
    Blocking,
}

impl From<bool> for Execution {
    #[inline]
    fn from(background: bool) -> Self {
        if background {
            Self::Background
        } else {
            Self::Blocking
        }
    }
}

impl From<Execution> for bool {
    #[inline]
    fn from(execution: Execution) -> Self {
        execution == Execution::Background
    }
}

/// Options for a timer.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TimerOptions {
    /// The name given to background threads.
    ///
    /// If `None`, threads are unnamed.
    pub name: Option<String>,
    /// The stack size, in bytes, of background threads.
    ///
    /// If `None`, the standard library picks the size.
    pub stack_size: Option<usize>,
    /// How long dropping the timer waits for its cycle to finish.
    ///
    /// The wait only lasts as long as a task that's already executing.
    /// If the task is still executing after this timeout, the background
    /// thread is detached. The default is one second.
    pub drop_timeout: Duration,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            name: None,
            stack_size: None,
            drop_timeout: Duration::from_secs(1),
        }
    }
}

/// Information about a timer.
///
/// Use [`Timer::info`] to query this information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct TimerInfo<'a> {
    /// What's the timer's name?
    pub name: Option<&'a str>,
    /// Where is the timer in its lifecycle?
    pub state: TimerState,
    /// How many times has the runnable been invoked in the current, or
    /// most recent, cycle?
    pub run_count: u64,
}

/// Run a function when a timer expires.
///
/// For convenience, `TimerRunnable` has a blanket implementation for all
/// `FnMut() + Send` types. Consider using a custom implementation when
/// you must name the runnable's type.
///
/// The runnable is moved into the timer's cycle when you arm the timer.
/// It's dropped once the cycle ends.
///
/// # Examples
///
/// ```
/// use tiny_timer::{Timer, TimerRunnable};
/// use std::sync::mpsc;
/// use std::time::Duration;
///
/// struct Ticker(mpsc::Sender<u32>, u32);
/// impl TimerRunnable for Ticker {
///     fn on_timer_expire(&mut self) {
///         self.1 += 1;
///         let _ = self.0.send(self.1);
///     }
/// }
///
/// let (tx, rx) = mpsc::channel();
/// let timer = Timer::new();
/// timer.run_loop_async(Duration::from_millis(1), Ticker(tx, 0)).unwrap();
/// assert_eq!(rx.recv().unwrap(), 1);
/// assert_eq!(rx.recv().unwrap(), 2);
/// ```
pub trait TimerRunnable: Send {
    /// Invoked when a timer expires.
    ///
    /// Background timers call this on the timer's thread. Blocking timers
    /// call this on the thread that armed the timer. While this runs,
    /// the timer is not waiting, and cancellation takes effect once this
    /// returns.
    fn on_timer_expire(&mut self);
}

impl<F> TimerRunnable for F
where
    F: FnMut() + Send,
{
    fn on_timer_expire(&mut self) {
        (self)();
    }
}

/// A cancellable timer.
///
/// A timer is idle until you [`arm`](Self::arm) it. It stays armed until its
/// schedule runs out, its task panics, or it observes a [`cancel`](Self::cancel)
/// request. Then it's idle, and you can arm it again.
///
/// `Timer` is `Send` and `Sync`. Share it by reference, or in an `Arc`, to
/// cancel it from other threads.
pub struct Timer {
    shared: Arc<Shared>,
    background: Mutex<Option<JoinHandle<()>>>,
    opts: TimerOptions,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create an idle timer with default options.
    pub fn new() -> Self {
        Self::with_options(&TimerOptions::default())
    }

    /// Create an idle timer.
    pub fn with_options(opts: &TimerOptions) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            background: Mutex::new(None),
            opts: opts.clone(),
        }
    }

    /// Arm the timer.
    ///
    /// After `interval` elapses, the timer invokes `runnable`. The `schedule`
    /// decides if that repeats; the `execution` decides which thread waits.
    /// Both accept a `bool`: `true` selects [`Schedule::Repeat`] and
    /// [`Execution::Background`].
    ///
    /// Arming only succeeds when the timer is idle. Otherwise, the call
    /// returns [`ArmError::AlreadyActive`] without changing the timer, and
    /// `runnable` is dropped without being invoked.
    ///
    /// # Panics
    ///
    /// A blocking timer resumes its runnable's panic on the calling thread.
    /// That includes a panic from the runnable's `Drop`. The timer is idle by
    /// the time the panic resumes. Background timers never panic the caller;
    /// a panicking runnable just ends the cycle.
    pub fn arm<R>(
        &self,
        interval: Duration,
        runnable: R,
        schedule: impl Into<Schedule>,
        execution: impl Into<Execution>,
    ) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        if interval.is_zero() {
            return Err(ArmError::ZeroInterval);
        }

        match execution.into() {
            Execution::Background => self.arm_background(interval, runnable, schedule.into()),
            Execution::Blocking => self.arm_blocking(interval, runnable),
        }
    }

    fn arm_background<R>(
        &self,
        interval: Duration,
        runnable: R,
        schedule: Schedule,
    ) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        let mut background = self.background.lock();
        if !self.shared.try_begin(schedule) {
            return Err(ArmError::AlreadyActive);
        }

        // The previous cycle is idle. At most, its thread is exiting.
        if let Some(previous) = background.take() {
            crate::thread::join_finished(previous);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = crate::thread::spawn(&self.opts, move || {
            match cycle::run(&shared, interval, runnable) {
                CycleEnd::Panicked(payload) => {
                    tracing::error!(
                        panic = crate::panic::payload_message(&*payload),
                        "timer task panicked; timer deactivated"
                    );
                }
                CycleEnd::Cancelled => tracing::debug!("timer cycle cancelled"),
                CycleEnd::Expired => tracing::debug!("timer cycle expired"),
            }
        });

        match spawned {
            Ok(handle) => {
                tracing::debug!(?interval, ?schedule, "timer armed in background");
                *background = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.finish();
                tracing::error!(error = %err, "failed to spawn timer thread");
                Err(ArmError::SpawnFailed { kind: err.kind() })
            }
        }
    }

    fn arm_blocking<R>(&self, interval: Duration, runnable: R) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        if !self.shared.try_begin(Schedule::Once) {
            return Err(ArmError::AlreadyActive);
        }

        tracing::debug!(?interval, "timer armed on calling thread");
        match cycle::run(&self.shared, interval, runnable) {
            CycleEnd::Panicked(payload) => panic::resume_unwind(payload),
            CycleEnd::Cancelled => tracing::debug!("timer cycle cancelled"),
            CycleEnd::Expired => tracing::debug!("timer cycle expired"),
        }
        Ok(())
    }

    /// Invoke `runnable` once, on a background thread, after `interval`.
    #[inline]
    pub fn run_once_async<R>(&self, interval: Duration, runnable: R) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        self.arm(interval, runnable, Schedule::Once, Execution::Background)
    }

    /// Invoke `runnable` after every `interval`, on a background thread,
    /// until the timer is cancelled.
    #[inline]
    pub fn run_loop_async<R>(&self, interval: Duration, runnable: R) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        self.arm(interval, runnable, Schedule::Repeat, Execution::Background)
    }

    /// Block for `interval`, then invoke `runnable` on this thread.
    ///
    /// If another thread cancels the timer during the wait, this returns
    /// early and the runnable isn't invoked.
    #[inline]
    pub fn run_once_blocking<R>(&self, interval: Duration, runnable: R) -> Result<(), ArmError>
    where
        R: TimerRunnable + 'static,
    {
        self.arm(interval, runnable, Schedule::Once, Execution::Blocking)
    }

    /// Stop the timer.
    ///
    /// A waiting cycle wakes immediately, and the runnable isn't invoked again.
    /// If the runnable is executing, it finishes first. This doesn't wait for
    /// the cycle to end; use [`wait_idle`](Self::wait_idle) for that.
    ///
    /// If the timer isn't running, or it's already cancelled, this does nothing.
    #[inline]
    pub fn cancel(&self) {
        if self.shared.request_cancel() {
            tracing::debug!("timer cancellation requested");
        }
    }

    /// Wait until the timer is idle.
    ///
    /// Returns `true` if the timer is idle, or `false` if `timeout` elapsed
    /// first. Don't call this from the timer's own runnable; it can't return
    /// `true` until the runnable returns.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.shared.wait_idle(timeout)
    }

    /// Where is the timer in its lifecycle?
    pub fn state(&self) -> TimerState {
        self.shared.lock().state
    }

    /// Returns `true` if the timer can be armed.
    pub fn is_idle(&self) -> bool {
        self.state() == TimerState::Idle
    }

    /// How many times the runnable was invoked in the current, or most
    /// recent, cycle.
    pub fn run_count(&self) -> u64 {
        self.shared.lock().run_count
    }

    /// Acquire runtime information for this timer.
    pub fn info(&self) -> TimerInfo<'_> {
        let inner = self.shared.lock();
        TimerInfo {
            name: self.opts.name.as_deref(),
            state: inner.state,
            run_count: inner.run_count,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();

        let Some(handle) = self.background.get_mut().take() else {
            return;
        };

        // Dropped by our own runnable. The cycle ends once the runnable
        // returns; it owns everything it needs.
        if crate::thread::is_current(&handle) {
            return;
        }

        if self.shared.wait_idle(self.opts.drop_timeout) {
            crate::thread::join_finished(handle);
        } else {
            tracing::warn!(
                timeout = ?self.opts.drop_timeout,
                "timer task still running after drop timeout; detaching its thread"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArmError, Execution, Schedule, Timer, TimerOptions};
    use crate::TimerState;
    use std::time::Duration;

    #[test]
    fn bool_conversions() {
        assert_eq!(Schedule::from(true), Schedule::Repeat);
        assert_eq!(Schedule::from(false), Schedule::Once);
        assert!(bool::from(Schedule::Repeat));
        assert_eq!(Execution::from(true), Execution::Background);
        assert_eq!(Execution::from(false), Execution::Blocking);
        assert!(!bool::from(Execution::Blocking));

        assert_eq!(Schedule::default(), Schedule::Once);
        assert_eq!(Execution::default(), Execution::Background);
    }

    #[test]
    fn zero_interval_rejected() {
        let timer = Timer::new();
        assert_eq!(
            timer.run_once_async(Duration::ZERO, || ()),
            Err(ArmError::ZeroInterval)
        );
        assert_eq!(
            timer.run_once_blocking(Duration::ZERO, || ()),
            Err(ArmError::ZeroInterval)
        );
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn info_reports_options() {
        let mut opts = TimerOptions::default();
        opts.name = Some("info".into());
        let timer = Timer::with_options(&opts);

        let info = timer.info();
        assert_eq!(info.name, Some("info"));
        assert_eq!(info.state, TimerState::Idle);
        assert_eq!(info.run_count, 0);

        timer.run_once_blocking(Duration::from_millis(1), || ()).unwrap();
        assert_eq!(timer.info().run_count, 1);
    }

    #[test]
    fn error_messages() {
        assert_eq!(ArmError::AlreadyActive.to_string(), "timer is already active");
        let err = ArmError::SpawnFailed {
            kind: std::io::ErrorKind::OutOfMemory,
        };
        assert_eq!(err.to_string(), "failed to spawn timer thread (OutOfMemory)");
    }
}
