//! Key event collection for password capture.
//!
//! The platform keyboard hook is an external collaborator. This module defines
//! the event types it delivers and the sources a capture can pull from.

pub mod replay;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use replay::{ReplayError, ReplaySource};
pub use source::{
    key_channel, CancellationToken, CaptureError, ChannelSource, EventSource, KeySender,
    SourcePoll,
};
pub use types::{KeyEvent, KeyTransition, RawKeyEvent, SPACE_SYMBOL};
