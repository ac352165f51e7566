//! Progress reporting decoupled from any queue library.
//!
//! The orchestrator writes checkpoint percentages into a watch channel;
//! whoever owns the receiving end (the worker, a CLI spinner, a test)
//! decides what to do with them. The reporter enforces monotonicity so
//! a job's visible progress never moves backwards.

use tokio::sync::watch;

/// Monotonic progress sink over a `watch` channel.
pub struct ProgressReporter {
    sender: watch::Sender<u8>,
}

impl ProgressReporter {
    /// Creates a reporter and the receiver observing it, starting at 0.
    #[must_use]
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (sender, receiver) = watch::channel(0);
        (Self { sender }, receiver)
    }

    /// Reports a checkpoint. Values lower than the current progress are
    /// ignored; values above 100 are clamped.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.sender.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// The most recently reported value.
    #[must_use]
    pub fn current(&self) -> u8 {
        *self.sender.borrow()
    }
}
