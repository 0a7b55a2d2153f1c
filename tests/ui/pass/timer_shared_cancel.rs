// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

use std::sync::Arc;
use std::time::Duration;
use tiny_timer::Timer;

/// A timer moves into another thread, which cancels it.
fn main() {
    let timer = Arc::new(Timer::new());
    timer.run_loop_async(Duration::from_secs(60), || ()).unwrap();

    let canceller = std::thread::spawn({
        let timer = Arc::clone(&timer);
        move || timer.cancel()
    });
    canceller.join().unwrap();

    assert!(timer.wait_idle(Duration::from_secs(5)));
    assert_eq!(timer.run_count(), 0);
}
