//! Password capture: collect events until the password has been typed.
//!
//! Key presses are concatenated (the space bar counting as a literal space)
//! and capture stops at the press that makes the typed text equal to the
//! password. There is no timeout; the caller aborts a capture through a
//! [`CancellationToken`].

use crate::collector::source::{CancellationToken, CaptureError, EventSource, SourcePoll};
use crate::collector::types::KeyEvent;
use std::time::Duration;

/// Default interval between cancellation checks while the source is idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captures one typing sample of a known password.
#[derive(Debug, Clone)]
pub struct PasswordCapture {
    password: String,
    poll_interval: Duration,
}

impl PasswordCapture {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Consume events from `source` until the password has been typed.
    ///
    /// Events with a negative, non-finite or decreasing timestamp are
    /// dropped. A leading release left over from an earlier capture is kept
    /// but does not count towards ordering, so back-to-back recordings may
    /// each start their clock at zero. The returned events end with the press that completed the
    /// password; later events stay in the source for the next capture.
    pub fn capture<S: EventSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<Vec<KeyEvent>, CaptureError> {
        let mut events: Vec<KeyEvent> = Vec::new();
        let mut typed = String::new();
        let mut last_timestamp = 0.0_f64;
        let mut dropped = 0usize;

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(events = events.len(), "Capture cancelled");
                return Err(CaptureError::Cancelled);
            }

            let event = match source.poll_event(self.poll_interval) {
                SourcePoll::Event(event) => event,
                SourcePoll::Idle => continue,
                SourcePoll::Closed => {
                    return Err(CaptureError::StreamClosed {
                        typed: typed.chars().count(),
                    });
                }
            };

            if !event.timestamp.is_finite()
                || event.timestamp < 0.0
                || event.timestamp < last_timestamp
            {
                dropped += 1;
                tracing::warn!(
                    timestamp = event.timestamp,
                    previous = last_timestamp,
                    "Dropping out-of-order key event"
                );
                continue;
            }
            // A release with no press in this capture is a leftover from the
            // previous one and does not anchor the clock
            let stray_release =
                !event.is_down() && !events.iter().any(|e| e.is_down() && e.key == event.key);
            if !stray_release {
                last_timestamp = event.timestamp;
            }

            let completes_password = event.is_down() && {
                typed.push_str(event.typed_text());
                typed == self.password
            };
            events.push(event);

            if completes_password {
                tracing::debug!(events = events.len(), dropped, "Password captured");
                return Ok(events);
            }
        }
    }
}
