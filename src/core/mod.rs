//! Core functionality for keystroke authentication.
//!
//! This module contains:
//! - Password capture from an event source
//! - Feature extraction (hold and flight times)
//! - DTW distance between feature vectors
//! - Enrollment profiles, decisions and profile reports
//! - The authentication context tying them together

pub mod capture;
pub mod context;
pub mod decision;
pub mod dtw;
pub mod features;
pub mod profile;
pub mod report;

// Re-export commonly used types
pub use capture::PasswordCapture;
pub use context::{AuthState, AuthenticationContext};
pub use decision::{verify, DecisionResult};
pub use dtw::{DistanceMetric, Dtw};
pub use features::{extract_features, FeatureVector};
pub use profile::{EnrollmentProfile, ProfileStore};
pub use report::{ProfileReport, SamplePoint};
