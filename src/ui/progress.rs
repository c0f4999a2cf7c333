use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Bar shown while ingesting a batch of snapshot files.
pub struct IngestProgress {
    pb: ProgressBar,
}

impl IngestProgress {
    pub fn new(total_files: usize) -> Self {
        let pb = if console::Term::stdout().is_term() {
            ProgressBar::new(total_files as u64).with_message("Ingesting snapshots")
        } else {
            ProgressBar::hidden()
        };
        Self { pb }
    }

    pub fn inc(&self, file: &str) {
        self.pb.inc(1);
        self.pb.set_message(format!("Ingesting: {}", file));
    }

    pub fn finish_with_summary(&self, duration: Duration, files: usize, snapshots: usize) {
        self.pb.finish_and_clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {} files  {} {} snapshots",
            Icons::PACKAGE.style(theme().info.clone()),
            files,
            Icons::DATABASE.style(theme().info.clone()),
            snapshots
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
