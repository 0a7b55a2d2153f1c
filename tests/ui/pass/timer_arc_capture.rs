// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiny_timer::Timer;

/// Shared state moves into the runnable through an Arc.
fn main() {
    let values = Arc::new(Mutex::new(Vec::new()));
    let timer = Timer::new();

    timer
        .run_loop_async(Duration::from_millis(1), {
            let values = Arc::clone(&values);
            move || values.lock().unwrap().push(7u32)
        })
        .unwrap();

    while values.lock().unwrap().len() < 2 {
        std::thread::yield_now();
    }
    timer.cancel();
    assert!(timer.wait_idle(Duration::from_secs(5)));
}
