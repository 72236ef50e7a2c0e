//! Accept/reject decision for a verification attempt.

use crate::core::dtw::DistanceMetric;
use crate::core::features::FeatureVector;
use crate::core::profile::EnrollmentProfile;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};

/// Outcome of a single verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Distance between the attempt and the enrolled reference
    pub distance: f64,
    /// Whether `distance` fell strictly below the threshold
    pub accepted: bool,
}

impl DecisionResult {
    /// Decide against `threshold`. A distance equal to the threshold is rejected.
    pub fn from_distance(distance: f64, threshold: f64) -> Self {
        Self {
            distance,
            accepted: distance < threshold,
        }
    }
}

/// Compare an attempt with the enrolled profile.
///
/// Fails with [`AuthError::NotEnrolled`] before touching the metric when no
/// profile exists.
pub fn verify(
    profile: Option<&EnrollmentProfile>,
    attempt: &FeatureVector,
    threshold: f64,
    metric: &impl DistanceMetric,
) -> Result<DecisionResult, AuthError> {
    let profile = profile.ok_or(AuthError::NotEnrolled)?;
    let distance = metric.distance(profile.average().values(), attempt.values())?;
    Ok(DecisionResult::from_distance(distance, threshold))
}
