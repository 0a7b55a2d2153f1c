// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2024 Ian McIntyre

//! Demonstrates one-shot and periodic timers.
//!
//! Schedules a few one-shot tasks, then prints from a periodic timer until
//! you enter `q`.

use std::{io::BufRead, time::Duration};

use clap::Parser;
use tiny_timer::{ArmError, Timer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(version, about = "tiny-timer demo")]
struct Cli {
    /// Delay, in milliseconds, before each one-shot task.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Interval, in milliseconds, of the periodic task.
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,
}

fn print() {
    println!("free function executed");
}

struct Task {
    label: &'static str,
}

impl Task {
    fn run(&self) {
        println!("Task::run executed ({})", self.label);
    }
}

/// Wait for a one-shot to finish before arming the next.
fn settle(timer: &Timer, delay: Duration) {
    let timeout = delay.saturating_mul(2);
    while !timer.wait_idle(timeout) {
        tracing::warn!(?timeout, "one-shot task still running");
    }
}

fn main() -> Result<(), ArmError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let delay = Duration::from_millis(cli.delay_ms.max(1));
    let interval = Duration::from_millis(cli.interval_ms.max(1));

    let timer = Timer::new();

    timer.run_once_async(delay, print)?;
    settle(&timer, delay);

    timer.run_once_async(delay, || println!("closure executed"))?;
    settle(&timer, delay);

    let task = Task { label: "bound" };
    timer.run_once_async(delay, move || task.run())?;
    settle(&timer, delay);

    timer.run_once_blocking(delay, || println!("blocking closure executed"))?;

    timer.run_loop_async(interval, print)?;
    tracing::info!("periodic timer running; enter `q` to stop");

    for line in std::io::stdin().lock().lines() {
        match line {
            Ok(line) if line.trim() == "q" => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stdin");
                break;
            }
        }
    }

    timer.cancel();
    if timer.wait_idle(Duration::from_secs(1)) {
        tracing::info!(runs = timer.run_count(), "periodic timer stopped");
    }
    Ok(())
}
