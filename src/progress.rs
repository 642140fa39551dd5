//! Textual progress reporting for the run modes.

use std::time::{Duration, Instant};

use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::warning;

/// Prints one line per completed pipeline step with a fixed-width bar.
pub struct StepLogger {
    name: String,
    total: usize,
    done: usize,
    started: Instant,
}

impl StepLogger {
    pub fn new(name: &str, total: usize) -> Self {
        Self {
            name: name.to_string(),
            total,
            done: 0,
            started: Instant::now(),
        }
    }

    pub fn step(&mut self, step: &str) {
        self.done += 1;
        if self.done > self.total {
            warning!("Step logger {} got more steps than configured", self.name);
        }
        println!(
            "{} {}: {} - {} {}",
            timestamp(),
            self.name.bold(),
            self.bar(),
            "✓".green().bold(),
            step
        );
    }

    pub fn done(&self) {
        if self.done < self.total {
            warning!(
                "Step logger {} finished after {} of {} steps",
                self.name,
                self.done,
                self.total
            );
        }
        println!(
            "{} {}",
            timestamp(),
            format!(
                "Done {} in {}ms",
                self.name,
                self.started.elapsed().as_millis()
            )
            .bold()
        );
    }

    pub fn bar(&self) -> String {
        let filled = self.done.min(self.total);
        format!(
            "[{}{}]",
            "*".repeat(filled),
            " ".repeat(self.total - filled)
        )
    }
}

fn timestamp() -> String {
    format!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S"))
        .bold()
        .to_string()
}

/// Bar counting countdown ticks, e.g. `[####    ] (50%) - ETA 2m`.
pub fn countdown_bar(total_ticks: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_ticks);
    if let Ok(style) =
        ProgressStyle::with_template("[{bar:40.cyan/blue}] ({percent}%) - ETA {eta} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Spinner shown while waiting for a playback device.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
