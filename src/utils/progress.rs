//! Terminal progress bar fed by the coder's progress monitor

use indicatif::{ProgressBar, ProgressStyle};

use crate::coder::ProgressMonitor;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, description: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = ProgressBar::new(total);
        bar.set_style(style);
        bar.set_message(description.to_string());

        ProgressTracker {
            bar,
        }
    }

    /// A tracker that draws nothing, for quiet runs
    pub fn hidden() -> Self {
        ProgressTracker {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Completed");
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Monitor that mirrors coder progress onto this bar; it never cancels
    pub fn monitor(&self) -> ProgressMonitor {
        let bar = self.bar.clone();
        Box::new(move |task: &str, done: u64, total: u64| {
            if bar.length() != Some(total) {
                bar.set_length(total);
                bar.set_message(task.to_string());
            }
            bar.set_position(done);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_moves_bar() {
        let tracker = ProgressTracker::hidden();
        let mut monitor = tracker.monitor();
        assert!(monitor("Load image", 3, 10));
        assert_eq!(tracker.position(), 3);
        tracker.increment(2);
        assert_eq!(tracker.position(), 5);
    }
}
