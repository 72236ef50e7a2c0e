//! Audit module for keystroke authentication.
//!
//! Tracks how often enrollment and verification ran and how they ended,
//! so users can see what the authenticator has done on their behalf.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log_with_persistence, AuditLog, AuditStats, SharedAuditLog};
