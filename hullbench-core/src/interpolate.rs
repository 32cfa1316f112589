//! Monotone piecewise-cubic Hermite interpolation (Fritsch–Carlson / PCHIP).
//!
//! Unlike a natural cubic spline, the interpolant never overshoots the data:
//! on every interval where the data is monotone the interpolant is too. That
//! keeps resampled precision/recall curves inside `[0, 1]`.

use crate::error::{CoreError, CoreResult};

/// A PCHIP interpolant over strictly increasing knots.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Build the interpolant. Knots must be finite and `xs` strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> CoreResult<Self> {
        if xs.len() != ys.len() {
            return Err(CoreError::length_mismatch(xs.len(), ys.len()));
        }
        if xs.is_empty() {
            return Err(CoreError::InvalidParameter(
                "interpolation needs at least one knot".into(),
            ));
        }
        if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidParameter(
                "interpolation knots must be finite".into(),
            ));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CoreError::InvalidParameter(
                "interpolation x values must be strictly increasing".into(),
            ));
        }
        let slopes = pchip_slopes(&xs, &ys);
        Ok(Self { xs, ys, slopes })
    }

    /// `(first knot, last knot)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Value at `x`, or `None` outside the knot range (no extrapolation).
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return None;
        }
        let n = self.xs.len();
        if n == 1 {
            return Some(self.ys[0]);
        }
        // Segment k satisfies xs[k] <= x < xs[k+1]; the last knot uses the last segment.
        let k = (self.xs.partition_point(|&xi| xi <= x) - 1).min(n - 2);
        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        Some(
            h00 * self.ys[k]
                + h10 * h * self.slopes[k]
                + h01 * self.ys[k + 1]
                + h11 * h * self.slopes[k + 1],
        )
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<Option<f64>> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Knot derivatives: weighted harmonic mean of neighbouring secants in the
/// interior, zero at local extrema, one-sided three-point estimate at the ends.
fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n == 1 {
        return vec![0.0];
    }
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();
    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (delta[k - 1], delta[k]);
        if d0 * d1 <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
    }
    d[0] = edge_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = edge_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn edge_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
