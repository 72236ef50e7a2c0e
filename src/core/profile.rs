//! Enrollment profile: the reference typing rhythm.
//!
//! A profile is built from a fixed number of samples of the same password.
//! Its reference vector is the elementwise mean of the samples; the samples
//! themselves are kept so profile quality can be reported later.

use crate::core::dtw::DistanceMetric;
use crate::core::features::FeatureVector;
use crate::config::ConfigError;
use crate::error::{AuthError, SampleMismatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An immutable enrolled typing profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentProfile {
    /// Unique profile identifier
    id: Uuid,
    /// When enrollment completed
    enrolled_at: DateTime<Utc>,
    /// Raw samples in enrollment order
    samples: Vec<FeatureVector>,
    /// Elementwise mean of `samples`
    average: FeatureVector,
}

impl EnrollmentProfile {
    /// Build a profile from exactly `expected_count` samples of equal length.
    ///
    /// Nothing is stored on failure; the caller keeps whatever profile it had.
    pub fn enroll(samples: Vec<FeatureVector>, expected_count: usize) -> Result<Self, AuthError> {
        if expected_count == 0 {
            return Err(ConfigError::Invalid("sample_count must be at least 1".to_string()).into());
        }
        if samples.len() != expected_count {
            return Err(AuthError::InconsistentSampleLength(SampleMismatch::Count {
                expected: expected_count,
                found: samples.len(),
            }));
        }
        check_sample_lengths(&samples)?;

        let average = FeatureVector::mean_of(&samples).ok_or(AuthError::EmptyInput)?;

        Ok(Self {
            id: Uuid::new_v4(),
            enrolled_at: Utc::now(),
            samples,
            average,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    pub fn samples(&self) -> &[FeatureVector] {
        &self.samples
    }

    pub fn average(&self) -> &FeatureVector {
        &self.average
    }

    /// Distance from the reference vector to each enrollment sample, in order.
    pub fn self_distances(&self, metric: &impl DistanceMetric) -> Result<Vec<f64>, AuthError> {
        self.samples
            .iter()
            .map(|sample| metric.distance(self.average.values(), sample.values()))
            .collect()
    }

    /// Re-check the shape invariants, e.g. after loading from disk.
    fn validate(&self) -> Result<(), AuthError> {
        check_sample_lengths(&self.samples)?;
        if self.samples.first().map(FeatureVector::len) != Some(self.average.len()) {
            return Err(AuthError::InconsistentSampleLength(SampleMismatch::Length {
                index: 0,
                expected: self.average.len(),
                found: self.samples.first().map_or(0, FeatureVector::len),
            }));
        }
        Ok(())
    }
}

fn check_sample_lengths(samples: &[FeatureVector]) -> Result<(), AuthError> {
    let Some(first) = samples.first() else {
        return Ok(());
    };
    if first.is_empty() {
        return Err(AuthError::EmptyInput);
    }
    for (index, sample) in samples.iter().enumerate().skip(1) {
        if sample.len() != first.len() {
            return Err(AuthError::InconsistentSampleLength(SampleMismatch::Length {
                index,
                expected: first.len(),
                found: sample.len(),
            }));
        }
    }
    Ok(())
}

/// JSON file storage for the single enrolled profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `profile.json` inside a data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("profile.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored profile, or `None` if nothing has been enrolled.
    pub fn load(&self) -> Result<Option<EnrollmentProfile>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let profile: EnrollmentProfile = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(Some(profile))
    }

    /// Replace the stored profile.
    ///
    /// Written to a sibling temp file and renamed into place, so readers see
    /// either the old profile or the new one.
    pub fn save(&self, profile: &EnrollmentProfile) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(profile)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dtw::Dtw;
    use pretty_assertions::assert_eq;

    fn sample(hold: [f64; 2], flight: f64) -> FeatureVector {
        FeatureVector::from_segments(hold.to_vec(), vec![flight])
    }

    #[test]
    fn test_identical_samples_average_to_themselves() {
        let vector = sample([0.10, 0.12], 0.20);
        let profile = EnrollmentProfile::enroll(vec![vector.clone(); 3], 3).unwrap();

        assert_eq!(profile.average(), &vector);
        assert_eq!(
            profile.self_distances(&Dtw::exact()).unwrap(),
            vec![0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_average_is_elementwise_mean() {
        let profile = EnrollmentProfile::enroll(
            vec![
                sample([0.1, 0.2], 0.3),
                sample([0.2, 0.2], 0.3),
                sample([0.3, 0.2], 0.6),
            ],
            3,
        )
        .unwrap();
        let avg = profile.average().values();
        assert!((avg[0] - 0.2).abs() < 1e-12);
        assert!((avg[1] - 0.2).abs() < 1e-12);
        assert!((avg[2] - 0.4).abs() < 1e-12);
        assert_eq!(profile.samples().len(), 3);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let short = sample([0.1, 0.2], 0.3);
        let long = FeatureVector::from_segments(vec![0.1, 0.2, 0.1], vec![0.3, 0.2]);
        let err = EnrollmentProfile::enroll(vec![short.clone(), short, long], 3).unwrap_err();
        match err {
            AuthError::InconsistentSampleLength(SampleMismatch::Length {
                index,
                expected,
                found,
            }) => {
                assert_eq!((index, expected, found), (2, 3, 5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_sample_count_rejected() {
        let vector = sample([0.1, 0.2], 0.3);
        assert!(matches!(
            EnrollmentProfile::enroll(vec![vector.clone(); 2], 3),
            Err(AuthError::InconsistentSampleLength(SampleMismatch::Count {
                expected: 3,
                found: 2
            }))
        ));
        assert!(matches!(
            EnrollmentProfile::enroll(vec![vector; 4], 3),
            Err(AuthError::InconsistentSampleLength(SampleMismatch::Count {
                expected: 3,
                found: 4
            }))
        ));
    }

    #[test]
    fn test_zero_sample_count_rejected() {
        assert!(matches!(
            EnrollmentProfile::enroll(Vec::new(), 0),
            Err(AuthError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let empty = FeatureVector::from(Vec::new());
        assert!(matches!(
            EnrollmentProfile::enroll(vec![empty; 3], 3),
            Err(AuthError::EmptyInput)
        ));
    }

    #[test]
    fn test_self_distances_in_enrollment_order() {
        let profile = EnrollmentProfile::enroll(
            vec![
                sample([0.1, 0.1], 0.1),
                sample([0.1, 0.1], 0.1),
                sample([0.4, 0.1], 0.1),
            ],
            3,
        )
        .unwrap();
        let distances = profile.self_distances(&Dtw::exact()).unwrap();
        assert_eq!(distances.len(), 3);
        assert!(distances[2] > distances[0]);
        assert_eq!(distances[0], distances[1]);
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_none());

        let profile = EnrollmentProfile::enroll(vec![sample([0.1, 0.2], 0.3); 3], 3).unwrap();
        store.save(&profile).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert!(!dir.path().join("profile.json.tmp").exists());
    }

    #[test]
    fn test_store_rejects_mismatched_sample() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        let profile = EnrollmentProfile::enroll(vec![sample([0.1, 0.2], 0.3); 3], 3).unwrap();
        store.save(&profile).unwrap();

        // Still a well-formed vector, just one feature too many
        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        json["samples"][1]["values"] = serde_json::json!([0.1, 0.2, 0.3, 0.4]);
        std::fs::write(store.path(), json.to_string()).unwrap();

        assert!(matches!(
            store.load(),
            Err(AuthError::InconsistentSampleLength(SampleMismatch::Length {
                index: 1,
                expected: 3,
                found: 4
            }))
        ));
    }

    #[test]
    fn test_store_rejects_mismatched_average() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::in_dir(dir.path());
        let profile = EnrollmentProfile::enroll(vec![sample([0.1, 0.2], 0.3); 3], 3).unwrap();
        store.save(&profile).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        json["average"]["values"] = serde_json::json!([0.1, 0.2]);
        std::fs::write(store.path(), json.to_string()).unwrap();

        assert!(matches!(
            store.load(),
            Err(AuthError::InconsistentSampleLength(SampleMismatch::Length {
                index: 0,
                expected: 2,
                found: 3
            }))
        ));
    }
}
