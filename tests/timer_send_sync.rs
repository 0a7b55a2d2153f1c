// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Timers can be shared with, and moved to, other threads.

fn is_send<T: Send>() -> bool {
    true
}

fn is_sync<T: Sync>() -> bool {
    true
}

#[test]
fn timer_send_sync() {
    assert!(is_send::<tiny_timer::Timer>());
    assert!(is_sync::<tiny_timer::Timer>());

    assert!(is_send::<tiny_timer::ArmError>());
    assert!(is_sync::<tiny_timer::ArmError>());
    assert!(is_send::<tiny_timer::TimerOptions>());
    assert!(is_send::<tiny_timer::TimerInfo<'static>>());
}

#[test]
fn arm_error_is_std_error() {
    fn is_error<E: std::error::Error + Send + Sync + 'static>(_: &E) -> bool {
        true
    }
    assert!(is_error(&tiny_timer::ArmError::AlreadyActive));
}
