//! Event source abstraction for key capture.
//!
//! The OS-level keyboard hook lives outside this crate. Anything that can
//! hand over [`KeyEvent`]s one at a time implements [`EventSource`]; the
//! in-process [`ChannelSource`] is fed by a [`KeySender`] from the hook thread.

use crate::collector::types::{KeyEvent, KeyTransition};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result of polling an event source once.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePoll {
    /// The next event in the stream.
    Event(KeyEvent),
    /// Nothing arrived within the poll timeout.
    Idle,
    /// The stream ended and will never produce another event.
    Closed,
}

/// A pull-based stream of key events.
pub trait EventSource {
    /// Wait up to `timeout` for the next event.
    fn poll_event(&mut self, timeout: Duration) -> SourcePoll;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn poll_event(&mut self, timeout: Duration) -> SourcePoll {
        (**self).poll_event(timeout)
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn poll_event(&mut self, timeout: Duration) -> SourcePoll {
        (**self).poll_event(timeout)
    }
}

/// Errors that end a capture without a usable sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Capture cancelled")]
    Cancelled,

    #[error("Event stream closed after {typed} typed characters, before the password was entered")]
    StreamClosed { typed: usize },
}

/// Cooperative cancellation flag shared between a capture and its owner.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Captures observe it at their next poll.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Capacity of the hook-to-capture channel.
const CHANNEL_CAPACITY: usize = 10_000;

/// Create a connected sender/source pair.
pub fn key_channel() -> (KeySender, ChannelSource) {
    // Bounded so a stalled consumer cannot grow memory without limit
    let (sender, receiver) = bounded(CHANNEL_CAPACITY);
    (
        KeySender {
            sender,
            started: Instant::now(),
        },
        ChannelSource { receiver },
    )
}

/// Producer half used by the keyboard hook.
///
/// Timestamps are measured from the moment the channel was created.
#[derive(Debug, Clone)]
pub struct KeySender {
    sender: Sender<KeyEvent>,
    started: Instant,
}

impl KeySender {
    /// Stamp and forward a transition. Returns false if the event was dropped
    /// because the channel is full or the source is gone.
    pub fn send(&self, key: impl Into<String>, kind: KeyTransition) -> bool {
        let timestamp = self.started.elapsed().as_secs_f64();
        self.send_event(KeyEvent::new(key, kind, timestamp))
    }

    /// Forward an already-stamped event.
    pub fn send_event(&self, event: KeyEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Key event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half of [`key_channel`].
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<KeyEvent>,
}

impl EventSource for ChannelSource {
    fn poll_event(&mut self, timeout: Duration) -> SourcePoll {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => SourcePoll::Event(event),
            Err(RecvTimeoutError::Timeout) => SourcePoll::Idle,
            Err(RecvTimeoutError::Disconnected) => SourcePoll::Closed,
        }
    }
}
