//! Busy spinner shown while a relay request is in flight.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner frames: a cell cursor sweeping a spreadsheet row.
const FRAMES: &[&str] = &["A1", "B1", "C1", "D1", "E1", "D1", "C1", "B1"];

/// A spinner labelled with whoever is "thinking".
///
/// Cleared (not finished with a checkmark) when dropped, since the next
/// thing printed is the mentor's reply rather than a completion line.
pub struct ThinkingSpinner {
    bar: ProgressBar,
}

impl ThinkingSpinner {
    /// Start a spinner reading `<name> is thinking`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(FRAMES)
                .template("{msg} [{spinner}]")
                .expect("valid template"),
        );
        bar.enable_steady_tick(Duration::from_millis(150));
        bar.set_message(format!("{}", style(format!("{name} is thinking...")).dim()));

        Self { bar }
    }

    /// Stop and erase the spinner.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ThinkingSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
