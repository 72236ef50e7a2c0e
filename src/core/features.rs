//! Feature extraction from a captured typing sample.
//!
//! A sample becomes a flat vector of timings: one hold time per distinct key
//! symbol (sorted by symbol), followed by the flight times between
//! consecutive key presses in the order they happened.

use crate::collector::types::{KeyEvent, KeyTransition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Timing features of one typing sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureVector")]
pub struct FeatureVector {
    /// Hold times followed by flight times, in seconds
    values: Vec<f64>,
    /// Number of leading values that are hold times
    hold_count: usize,
}

#[derive(Deserialize)]
struct RawFeatureVector {
    values: Vec<f64>,
    hold_count: usize,
}

impl TryFrom<RawFeatureVector> for FeatureVector {
    type Error = String;

    fn try_from(raw: RawFeatureVector) -> Result<Self, Self::Error> {
        if raw.hold_count > raw.values.len() {
            return Err(format!(
                "hold_count {} exceeds {} values",
                raw.hold_count,
                raw.values.len()
            ));
        }
        Ok(Self {
            values: raw.values,
            hold_count: raw.hold_count,
        })
    }
}

impl FeatureVector {
    /// Build a vector from its two segments.
    pub fn from_segments(hold_times: Vec<f64>, flight_times: Vec<f64>) -> Self {
        let hold_count = hold_times.len();
        let mut values = hold_times;
        values.extend(flight_times);
        Self { values, hold_count }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn hold_times(&self) -> &[f64] {
        &self.values[..self.hold_count]
    }

    pub fn flight_times(&self) -> &[f64] {
        &self.values[self.hold_count..]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Elementwise mean of equally long vectors.
    ///
    /// Callers check lengths first; the segment split is taken from the
    /// first vector. Returns `None` for an empty slice.
    ///
    /// Uses a running mean so identical inputs average to exactly themselves.
    pub(crate) fn mean_of(vectors: &[FeatureVector]) -> Option<FeatureVector> {
        let first = vectors.first()?;
        let mut means = first.values.clone();
        for (k, vector) in vectors.iter().enumerate().skip(1) {
            let count = (k + 1) as f64;
            for (mean, value) in means.iter_mut().zip(&vector.values) {
                *mean += (value - *mean) / count;
            }
        }
        Some(FeatureVector {
            values: means,
            hold_count: first.hold_count,
        })
    }
}

impl From<Vec<f64>> for FeatureVector {
    /// Wrap raw values whose segment split is unknown; all are treated as flight times.
    fn from(values: Vec<f64>) -> Self {
        Self {
            values,
            hold_count: 0,
        }
    }
}

/// Extract timing features from an ordered event sequence.
///
/// A release with no pending press of the same key is ignored. If a key is
/// pressed more than once, the later press overwrites the pending timer and
/// only the last completed hold is kept for that symbol.
pub fn extract_features(events: &[KeyEvent]) -> FeatureVector {
    let mut pending_down: HashMap<&str, f64> = HashMap::new();
    // BTreeMap keeps hold times ordered by key symbol
    let mut hold_times: BTreeMap<&str, f64> = BTreeMap::new();
    let mut flight_times = Vec::new();
    let mut previous_down: Option<f64> = None;

    for event in events {
        match event.kind {
            KeyTransition::Down => {
                if let Some(previous) = previous_down {
                    flight_times.push(event.timestamp - previous);
                }
                previous_down = Some(event.timestamp);
                pending_down.insert(event.key.as_str(), event.timestamp);
            }
            KeyTransition::Up => {
                if let Some(down) = pending_down.remove(event.key.as_str()) {
                    hold_times.insert(event.key.as_str(), event.timestamp - down);
                }
            }
        }
    }

    FeatureVector::from_segments(hold_times.into_values().collect(), flight_times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    fn two_key_sample() -> Vec<KeyEvent> {
        vec![
            KeyEvent::down("a", 0.0),
            KeyEvent::up("a", 0.10),
            KeyEvent::down("b", 0.20),
            KeyEvent::up("b", 0.32),
        ]
    }

    #[test]
    fn test_two_key_password() {
        let features = extract_features(&two_key_sample());
        assert_close(features.values(), &[0.10, 0.12, 0.20]);
        assert_close(features.hold_times(), &[0.10, 0.12]);
        assert_close(features.flight_times(), &[0.20]);
    }

    #[test]
    fn test_hold_times_sorted_by_symbol() {
        // Typed "ba": holds still come out in a, b order
        let events = vec![
            KeyEvent::down("b", 0.0),
            KeyEvent::up("b", 0.05),
            KeyEvent::down("a", 0.30),
            KeyEvent::up("a", 0.37),
        ];
        let features = extract_features(&events);
        assert_close(features.hold_times(), &[0.07, 0.05]);
        assert_close(features.flight_times(), &[0.30]);
    }

    #[test]
    fn test_overlapping_presses() {
        // b pressed before a is released
        let events = vec![
            KeyEvent::down("a", 0.0),
            KeyEvent::down("b", 0.08),
            KeyEvent::up("a", 0.12),
            KeyEvent::up("b", 0.20),
        ];
        let features = extract_features(&events);
        assert_close(features.values(), &[0.12, 0.12, 0.08]);
    }

    #[test]
    fn test_repeated_key_keeps_last_hold() {
        let events = vec![
            KeyEvent::down("a", 0.0),
            KeyEvent::up("a", 0.10),
            KeyEvent::down("a", 0.50),
            KeyEvent::up("a", 0.53),
        ];
        let features = extract_features(&events);
        assert_close(features.hold_times(), &[0.03]);
        assert_close(features.flight_times(), &[0.50]);
    }

    #[test]
    fn test_orphan_release_ignored() {
        let events = vec![
            KeyEvent::up("shift", 0.0),
            KeyEvent::down("a", 0.1),
            KeyEvent::up("a", 0.2),
            KeyEvent::up("a", 0.3),
        ];
        let features = extract_features(&events);
        assert_close(features.values(), &[0.1]);
    }

    #[test]
    fn test_unreleased_key_has_no_hold() {
        let events = vec![
            KeyEvent::down("a", 0.0),
            KeyEvent::up("a", 0.1),
            KeyEvent::down("b", 0.2),
        ];
        let features = extract_features(&events);
        assert_close(features.hold_times(), &[0.1]);
        assert_close(features.flight_times(), &[0.2]);
    }

    #[test]
    fn test_empty_stream() {
        let features = extract_features(&[]);
        assert!(features.is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let events = two_key_sample();
        assert_eq!(extract_features(&events), extract_features(&events));
    }

    #[test]
    fn test_deserialize_rejects_bad_split() {
        let ok: FeatureVector =
            serde_json::from_str(r#"{"values":[0.1,0.2,0.3],"hold_count":2}"#).unwrap();
        assert_eq!(ok.flight_times(), &[0.3]);

        let bad = serde_json::from_str::<FeatureVector>(r#"{"values":[0.1],"hold_count":2}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_mean_of_vectors() {
        let vectors = vec![
            FeatureVector::from_segments(vec![0.1, 0.2], vec![0.3]),
            FeatureVector::from_segments(vec![0.3, 0.4], vec![0.5]),
        ];
        let mean = FeatureVector::mean_of(&vectors).unwrap();
        assert_close(mean.values(), &[0.2, 0.3, 0.4]);
        assert_eq!(mean.hold_times().len(), 2);
        assert!(FeatureVector::mean_of(&[]).is_none());
    }
}
