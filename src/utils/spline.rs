/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Natural cubic spline interpolation
//!
//! Used for background curves built from a handful of anchor points and for
//! resampling instrument line profiles onto the experimental grid.

use super::errors::{Result, UtilsError};

/// A natural cubic spline through a set of knots
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Construct a natural cubic spline
    ///
    /// # Arguments
    ///
    /// * `xs` - Strictly increasing knots
    /// * `ys` - Values at the knots
    ///
    /// # Returns
    ///
    /// The spline, or an error if fewer than two knots are given, the lengths
    /// differ, or the knots are not strictly increasing
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(UtilsError::LengthMismatch(xs.len(), ys.len()));
        }
        if xs.len() < 2 {
            return Err(UtilsError::TooFewPoints {
                needed: 2,
                got: xs.len(),
            });
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(UtilsError::NotIncreasing(i));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Tridiagonal forward sweep
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            u[i] = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * u[i] / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// First and last knot
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluate the spline, extrapolating with the boundary polynomials
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }

    /// Evaluate the spline inside its knots, returning `None` outside
    pub fn evaluate_within(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if x < lo || x > hi {
            None
        } else {
            Some(self.evaluate(x))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spline_passes_through_knots() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.evaluate(*x), *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_spline_reproduces_line() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 3.0], vec![1.0, 3.0, 7.0]).unwrap();
        assert_relative_eq!(spline.evaluate(2.0), 5.0, epsilon = 1e-12);
        assert!(spline.evaluate_within(3.5).is_none());
    }

    #[test]
    fn test_spline_rejects_bad_knots() {
        assert!(CubicSpline::new(vec![0.0], vec![1.0]).is_err());
        assert!(CubicSpline::new(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(CubicSpline::new(vec![0.0, 1.0], vec![1.0]).is_err());
    }
}
