//! Live progress line on stderr

use crate::crawler::{CrawlProgress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Creates a spinner that redraws on its own between updates
pub fn progress_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(CrawlProgress::default().to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Routes crawl progress into the spinner's message
pub fn progress_callback(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |progress: CrawlProgress| {
        pb.set_message(progress.to_string());
    })
}
