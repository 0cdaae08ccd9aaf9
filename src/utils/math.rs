/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Numeric helpers for sampled curves
//!
//! Everything here works on plain slices so that spectra, profiles and
//! tabulated scattering data can share the same integration and
//! interpolation code.

#![allow(clippy::needless_range_loop)]
use super::errors::{Result, UtilsError};

/// Integrate sampled data using the trapezoidal rule
///
/// # Arguments
///
/// * `y` - Ordinates
/// * `x` - Abscissae, same length as `y`
///
/// # Returns
///
/// The approximate integral. Extra trailing samples in the longer slice are ignored.
pub fn trapz(y: &[f64], x: &[f64]) -> f64 {
    let n = y.len().min(x.len());
    let mut sum = 0.0;
    for i in 1..n {
        sum += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    sum
}

/// Integrate sampled data with unit spacing
pub fn trapz_unit(y: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 1..y.len() {
        sum += 0.5 * (y[i] + y[i - 1]);
    }
    sum
}

/// Linear interpolation between two points
///
/// # Arguments
///
/// * `x` - The x value to interpolate at
/// * `x0`, `y0` - The first point
/// * `x1`, `y1` - The second point
pub fn linear_interpolate(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Index of the interval `[xs[i], xs[i+1]]` containing `x`
///
/// `xs` must be increasing with at least two entries. Values outside the
/// table map onto the first or last interval.
fn bracket(x: f64, xs: &[f64]) -> usize {
    let n = xs.len();
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] > x {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// Piecewise-linear interpolation that holds the end values outside the table
///
/// # Arguments
///
/// * `x` - Point to evaluate
/// * `xs` - Increasing abscissae
/// * `ys` - Ordinates
///
/// # Returns
///
/// The interpolated value, or an error if the table is empty or the slices differ in length
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(UtilsError::LengthMismatch(xs.len(), ys.len()));
    }
    match xs.len() {
        0 => Err(UtilsError::TooFewPoints { needed: 1, got: 0 }),
        1 => Ok(ys[0]),
        n => {
            if x <= xs[0] {
                return Ok(ys[0]);
            }
            if x >= xs[n - 1] {
                return Ok(ys[n - 1]);
            }
            let i = bracket(x, xs);
            Ok(linear_interpolate(x, xs[i], ys[i], xs[i + 1], ys[i + 1]))
        }
    }
}

/// Interpolate a whole table onto new abscissae
pub fn interp_many(x_new: &[f64], xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
    x_new.iter().map(|&x| interp(x, xs, ys)).collect()
}

/// Evenly spaced samples over a closed interval
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// One-dimensional Gaussian smoothing
///
/// The kernel is truncated at four standard deviations and the signal is
/// mirrored at both ends (`d c b a | a b c d | d c b a`).
///
/// # Arguments
///
/// * `y` - Signal to smooth
/// * `sigma` - Kernel width in samples; non-positive values return a copy
pub fn gaussian_filter1d(y: &[f64], sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || y.is_empty() {
        return y.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as i64;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= norm;
    }

    let n = y.len() as i64;
    let reflect = |mut i: i64| -> usize {
        // Period of the mirrored extension is 2n
        let period = 2 * n;
        i = i.rem_euclid(period);
        if i >= n {
            i = period - 1 - i;
        }
        i as usize
    };

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * y[reflect(i + k as i64 - radius)])
                .sum()
        })
        .collect()
}

/// Direct discrete convolution returning the full `a.len() + b.len() - 1` samples
pub fn convolve(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if a.is_empty() || b.is_empty() {
        return Err(UtilsError::TooFewPoints { needed: 1, got: 0 });
    }

    let mut c = vec![0.0; a.len() + b.len() - 1];
    for i in 0..a.len() {
        if a[i] == 0.0 {
            continue;
        }
        for j in 0..b.len() {
            c[i + j] += a[i] * b[j];
        }
    }
    Ok(c)
}

/// Convolution trimmed to the length of `a`, centred on the kernel
pub fn convolve_same(a: &[f64], kernel: &[f64]) -> Result<Vec<f64>> {
    let full = convolve(a, kernel)?;
    let offset = (kernel.len() - 1) / 2;
    Ok(full[offset..offset + a.len()].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trapz_linear() {
        let x = linspace(0.0, 2.0, 21);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v).collect();
        assert_relative_eq!(trapz(&y, &x), 6.0, epsilon = 1e-12);
        assert_relative_eq!(trapz_unit(&[1.0, 1.0, 1.0]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interp_clamps_outside() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 0.0];
        assert_relative_eq!(interp(0.5, &xs, &ys).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(interp(-1.0, &xs, &ys).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(interp(3.0, &xs, &ys).unwrap(), 0.0, epsilon = 1e-12);
        assert!(interp(0.5, &xs, &ys[..2]).is_err());
    }

    #[test]
    fn test_gaussian_filter_preserves_constant() {
        let y = vec![2.5; 17];
        let smoothed = gaussian_filter1d(&y, 2.0);
        for v in smoothed {
            assert_relative_eq!(v, 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gaussian_filter_preserves_area() {
        let mut y = vec![0.0; 41];
        y[20] = 1.0;
        let smoothed = gaussian_filter1d(&y, 1.5);
        assert_relative_eq!(smoothed.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(smoothed[20] > smoothed[19]);
        assert_relative_eq!(smoothed[19], smoothed[21], epsilon = 1e-14);
    }

    #[test]
    fn test_convolve() {
        let c = convolve(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]).unwrap();
        let expected = [0.0, 1.0, 2.5, 4.0, 1.5];
        for (a, b) in c.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        let same = convolve_same(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.0]).unwrap();
        assert_eq!(same, vec![1.0, 2.0, 3.0]);
    }
}
