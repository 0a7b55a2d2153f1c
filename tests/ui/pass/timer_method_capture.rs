// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

use std::time::Duration;
use tiny_timer::Timer;

struct Task {
    runs: u32,
}

impl Task {
    fn run(&mut self) {
        self.runs += 1;
    }
}

fn free_function() {}

/// Free functions, and methods bound to an owned value, are runnables.
fn main() {
    let timer = Timer::new();

    timer
        .run_once_blocking(Duration::from_millis(1), free_function)
        .unwrap();

    let mut task = Task { runs: 0 };
    timer
        .run_once_blocking(Duration::from_millis(1), move || task.run())
        .unwrap();

    assert_eq!(timer.run_count(), 1);
}
