//! Synheart Keystroke Auth - password typing-rhythm authentication.
//!
//! A user enrolls by typing a known password several times. Each sample is
//! reduced to hold and flight times, the samples are averaged into a
//! reference profile, and later attempts are accepted when their dynamic
//! time warping distance to the reference falls below a threshold.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ EventSource │──▶│   Capture   │──▶│   Features   │
//! │ (hook/file) │   │ (password)  │   │(hold, flight)│
//! └─────────────┘   └─────────────┘   └──────────────┘
//!                                        │        │
//!                              enroll    ▼        ▼    verify
//!                           ┌─────────────┐   ┌─────────────┐
//!                           │   Profile   │──▶│  Decision   │
//!                           │  (average)  │   │ (DTW < thr) │
//!                           └─────────────┘   └─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use synheart_keystroke_auth::{AuthenticationConfig, AuthenticationContext, Dtw, FeatureVector};
//!
//! let config = AuthenticationConfig {
//!     password: "ab".to_string(),
//!     threshold: 0.5,
//!     sample_count: 3,
//! };
//! let ctx = AuthenticationContext::new(config, Dtw::exact()).unwrap();
//!
//! let sample = FeatureVector::from_segments(vec![0.10, 0.12], vec![0.20]);
//! ctx.enroll(vec![sample.clone(); 3]).unwrap();
//!
//! let result = ctx.verify(&sample).unwrap();
//! assert!(result.accepted);
//! ```

pub mod audit;
pub mod collector;
pub mod config;
pub mod core;
pub mod error;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use collector::{
    key_channel, CancellationToken, CaptureError, EventSource, KeyEvent, KeyTransition,
    ReplaySource,
};
pub use config::{AuthenticationConfig, Config, ConfigError};
pub use crate::core::{
    extract_features, AuthState, AuthenticationContext, DecisionResult, DistanceMetric, Dtw,
    EnrollmentProfile, FeatureVector, ProfileReport, ProfileStore,
};
pub use error::{AuthError, SampleMismatch};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          SYNHEART KEYSTROKE AUTH - PRIVACY DECLARATION           ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Keys are read only while you are asked to type the password.    ║
║                                                                  ║
║  ✓ WHAT WE STORE:                                                ║
║    • How long each password key was held                         ║
║    • The time between consecutive key presses                    ║
║    • Counts of enrollments and verifications                     ║
║                                                                  ║
║  ✗ WHAT WE NEVER STORE:                                          ║
║    • The keys you press or the password text in the profile      ║
║    • Anything you type outside a password prompt                 ║
║                                                                  ║
║  Raw key events are discarded as soon as timings are extracted.  ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
