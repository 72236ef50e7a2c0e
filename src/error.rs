//! Error types for keystroke authentication.

use crate::collector::CaptureError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by enrollment, verification and profile storage.
///
/// None of these are retried internally. A caller that wants a "try again"
/// flow re-prompts the user and calls the operation again.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Feature vector is empty")]
    EmptyInput,

    #[error("Inconsistent enrollment samples: {0}")]
    InconsistentSampleLength(SampleMismatch),

    #[error("No typing profile enrolled yet")]
    NotEnrolled,

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Whether re-prompting the user and retrying could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::InconsistentSampleLength(_)
                | AuthError::EmptyInput
                | AuthError::Capture(CaptureError::StreamClosed { .. })
        )
    }
}

/// How a set of enrollment samples failed to line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleMismatch {
    #[error("got {found} samples, expected {expected}")]
    Count { expected: usize, found: usize },

    #[error(
        "sample {index} has {found} features, expected {expected} (was the password typed differently?)"
    )]
    Length {
        index: usize,
        expected: usize,
        found: usize,
    },
}
