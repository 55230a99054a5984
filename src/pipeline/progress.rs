//! Progress reporting for a running import.
//!
//! A spinner rather than a bar with a known total: the total record count in
//! a streaming import isn't known until the source is exhausted.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressTracker {
    start_time: Instant,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    pub fn new(enable_bar: bool) -> Self {
        let bar = if enable_bar {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {pos} documents imported {msg}")
                    .unwrap(),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Report the new running total.
    pub fn update(&self, count: u64) {
        let Some(ref bar) = self.bar else { return };
        bar.set_position(count);
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let speed = count as f64 / elapsed;
            bar.set_message(format!("({speed:.0} docs/sec)"));
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
