//! Counters of authentication activity.
//!
//! Only counts are kept: no timings, distances or key symbols.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::decision::DecisionResult;

/// Activity counters for the current session, optionally persisted.
#[derive(Debug)]
pub struct AuditLog {
    /// Successful enrollments
    enrollments: AtomicU64,
    /// Verifications that were accepted
    accepted: AtomicU64,
    /// Verifications that were rejected
    rejected: AtomicU64,
    /// Enrollments or verifications that failed before a decision
    failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            enrollments: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that continues the counts stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous audit stats: {e}");
        }

        log
    }

    pub fn record_enrollment(&self) {
        self.enrollments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, result: &DecisionResult) {
        let counter = if result.accepted {
            &self.accepted
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            enrollments: self.enrollments.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Authentication Activity:\n\
             - Enrollments: {}\n\
             - Verifications accepted: {}\n\
             - Verifications rejected: {}\n\
             - Failed attempts: {}",
            stats.enrollments, stats.accepted, stats.rejected, stats.failures
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                enrollments: stats.enrollments,
                accepted: stats.accepted,
                rejected: stats.rejected,
                failures: stats.failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.enrollments
                    .store(persisted.enrollments, Ordering::Relaxed);
                self.accepted.store(persisted.accepted, Ordering::Relaxed);
                self.rejected.store(persisted.rejected, Ordering::Relaxed);
                self.failures.store(persisted.failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub enrollments: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failures: u64,
    pub session_start: DateTime<Utc>,
}

impl AuditStats {
    pub fn verifications(&self) -> u64 {
        self.accepted + self.rejected
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    enrollments: u64,
    accepted: u64,
    rejected: u64,
    failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

/// Create a new shared audit log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}
