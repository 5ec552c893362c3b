//! Progress reporting support (requires `progress` feature)

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a request whose size is not known up front.
///
/// The spinner draws to stderr and ticks on its own; call
/// [`ProgressBar::finish_and_clear`] when the request returns.
#[must_use]
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
