//! Profile quality report.
//!
//! For each enrollment sample, the distance to the profile's reference
//! vector, set against the acceptance threshold. A consistent typist shows
//! small distances, all below the threshold.

use crate::core::dtw::DistanceMetric;
use crate::core::profile::EnrollmentProfile;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt::Write;

/// Distance of one enrollment sample to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// 1-based sample number
    pub sample: usize,
    pub distance: f64,
    pub within_threshold: bool,
}

/// Per-sample distances plus summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub threshold: f64,
    pub points: Vec<SamplePoint>,
    pub mean: f64,
    pub max: f64,
    /// Sample standard deviation, 0 with fewer than two samples
    pub std_dev: f64,
}

impl ProfileReport {
    /// Build the report for `profile` using `metric`.
    pub fn build(
        profile: &EnrollmentProfile,
        threshold: f64,
        metric: &impl DistanceMetric,
    ) -> Result<Self, AuthError> {
        Ok(Self::from_distances(profile.self_distances(metric)?, threshold))
    }

    pub fn from_distances(distances: Vec<f64>, threshold: f64) -> Self {
        let (mean, max) = if distances.is_empty() {
            (0.0, 0.0)
        } else {
            (
                Statistics::mean(distances.iter()),
                Statistics::max(distances.iter()),
            )
        };
        let std_dev = if distances.len() < 2 {
            0.0
        } else {
            Statistics::std_dev(distances.iter())
        };

        let points = distances
            .into_iter()
            .enumerate()
            .map(|(i, distance)| SamplePoint {
                sample: i + 1,
                distance,
                within_threshold: distance < threshold,
            })
            .collect();

        Self {
            threshold,
            points,
            mean,
            max,
            std_dev,
        }
    }

    /// Whether every enrollment sample would itself be accepted.
    pub fn all_within_threshold(&self) -> bool {
        self.points.iter().all(|p| p.within_threshold)
    }

    /// Render a text chart: one column per sample, a dashed threshold line.
    ///
    /// Samples within the threshold are drawn as `o`, others as `x`.
    pub fn render_chart(&self, height: usize) -> String {
        let height = height.max(2);
        let top = self
            .points
            .iter()
            .map(|p| p.distance)
            .fold(self.threshold, f64::max);
        let top = if top > 0.0 { top } else { 1.0 };
        let steps = (height - 1) as f64;
        let row_of = |value: f64| ((value / top) * steps).round() as usize;
        let threshold_row = row_of(self.threshold);

        let mut out = String::new();
        for row in (0..height).rev() {
            let label = top * row as f64 / steps;
            let _ = write!(out, "{label:>8.3} |");
            let fill = if row == threshold_row { '-' } else { ' ' };
            for point in &self.points {
                let mark = if row_of(point.distance) == row {
                    if point.within_threshold {
                        'o'
                    } else {
                        'x'
                    }
                } else {
                    fill
                };
                let _ = write!(out, "{fill}{mark}{fill}{fill}");
            }
            if row == threshold_row {
                out.push_str(" threshold");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{:>8} +{}", "", "----".repeat(self.points.len()));
        let _ = write!(out, "{:>8}  ", "");
        for point in &self.points {
            let _ = write!(out, " {:<3}", point.sample);
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dtw::Dtw;
    use crate::core::features::FeatureVector;

    #[test]
    fn test_statistics() {
        let report = ProfileReport::from_distances(vec![0.2, 0.4, 0.6], 0.5);
        assert!((report.mean - 0.4).abs() < 1e-12);
        assert!((report.max - 0.6).abs() < 1e-12);
        assert!((report.std_dev - 0.2).abs() < 1e-12);
        assert_eq!(
            report
                .points
                .iter()
                .map(|p| p.within_threshold)
                .collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert!(!report.all_within_threshold());
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let report = ProfileReport::from_distances(vec![0.3], 1.0);
        assert_eq!(report.std_dev, 0.0);
        assert_eq!(report.points[0].sample, 1);
    }

    #[test]
    fn test_consistent_profile_report() {
        let vector = FeatureVector::from_segments(vec![0.10, 0.12], vec![0.20]);
        let profile = EnrollmentProfile::enroll(vec![vector; 3], 3).unwrap();
        let report = ProfileReport::build(&profile, 1.5, &Dtw::exact()).unwrap();

        assert_eq!(report.points.len(), 3);
        assert!(report.points.iter().all(|p| p.distance == 0.0));
        assert!(report.all_within_threshold());
        assert_eq!(report.mean, 0.0);
    }

    #[test]
    fn test_chart_marks_threshold_and_samples() {
        let report = ProfileReport::from_distances(vec![0.0, 0.5, 2.0], 1.0);
        let chart = report.render_chart(5);
        let lines: Vec<&str> = chart.lines().collect();

        // 5 plot rows, axis, sample labels
        assert_eq!(lines.len(), 7);
        assert!(lines[0].contains('x'));
        assert!(chart.contains("threshold"));
        assert_eq!(chart.replace("threshold", "").matches('o').count(), 2);
        assert!(lines[6].contains('1') && lines[6].contains('3'));
    }

    #[test]
    fn test_chart_with_all_zero_values() {
        let report = ProfileReport::from_distances(vec![0.0, 0.0], 0.0);
        let chart = report.render_chart(3);
        assert!(chart.contains("threshold"));
        assert_eq!(chart.matches('x').count(), 2);
    }
}
