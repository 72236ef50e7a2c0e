//! Dynamic time warping distance between feature vectors.
//!
//! Each vector is treated as a one-dimensional series. Typing speed varies
//! between attempts, so two samples of the same password can differ in
//! length and local pacing; DTW aligns them before summing the differences.

use crate::error::AuthError;

/// A dissimilarity measure between two feature series.
pub trait DistanceMetric {
    /// Distance between `a` and `b`. Fails on empty input.
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, AuthError>;
}

/// DTW with absolute-difference cost.
///
/// With no window the full cost matrix is searched. A window restricts the
/// warping path to `|i - j| <= max(window, |len(a) - len(b)|)`, so the end
/// cell is always reachable; once the window spans the longer series the
/// result equals exact DTW.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dtw {
    window: Option<usize>,
}

impl Dtw {
    /// Exact DTW over the full cost matrix.
    pub fn exact() -> Self {
        Self { window: None }
    }

    /// Banded DTW restricted to `radius` cells around the diagonal.
    pub fn banded(radius: usize) -> Self {
        Self {
            window: Some(radius),
        }
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }
}

impl DistanceMetric for Dtw {
    fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64, AuthError> {
        if a.is_empty() || b.is_empty() {
            return Err(AuthError::EmptyInput);
        }

        let (n, m) = (a.len(), b.len());
        let radius = match self.window {
            // Any radius past the longer series is the full matrix
            Some(window) => window.max(n.abs_diff(m)).min(n.max(m)),
            None => n.max(m),
        };

        // Two rolling rows of the accumulated cost matrix; cells outside the
        // band stay infinite.
        let mut prev = vec![f64::INFINITY; m];
        let mut curr = vec![f64::INFINITY; m];

        for i in 0..n {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(m - 1);
            curr.fill(f64::INFINITY);

            for j in lo..=hi {
                let cost = (a[i] - b[j]).abs();
                let best = match (i, j) {
                    (0, 0) => 0.0,
                    (0, _) => curr[j - 1],
                    (_, 0) => prev[j],
                    _ => prev[j].min(curr[j - 1]).min(prev[j - 1]),
                };
                curr[j] = cost + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        Ok(prev[m - 1])
    }
}
