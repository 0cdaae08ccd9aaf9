/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Background estimation from anchor points
//!
//! The background is a natural cubic spline through a few `(x, y)` anchors.
//! Where the anchors come from is up to the host application: a fixed list,
//! a file, or a heuristic over the spectrum itself.

use super::errors::{Result, SpectrumError};
use super::spectrum::Spectrum;
use crate::utils::CubicSpline;
use log::debug;
use std::path::Path;

/// Source of background anchor points
pub trait AnchorPointProvider {
    /// Return up to `count` anchor points for `spectrum`
    fn anchor_points(&self, spectrum: &Spectrum, count: usize) -> Result<Vec<(f64, f64)>>;
}

/// A fixed list of anchors, independent of the spectrum
#[derive(Debug, Clone, Default)]
pub struct FixedAnchors {
    points: Vec<(f64, f64)>,
}

impl FixedAnchors {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Read anchors from a two-column text file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let points = Spectrum::from_file(path)?;
        Ok(Self::new(
            points.x().iter().copied().zip(points.y().iter().copied()).collect(),
        ))
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl AnchorPointProvider for FixedAnchors {
    fn anchor_points(&self, _spectrum: &Spectrum, _count: usize) -> Result<Vec<(f64, f64)>> {
        Ok(self.points.clone())
    }
}

/// Minimum of each of `count` equal-width windows, with both end points included
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumAnchors;

impl AnchorPointProvider for MinimumAnchors {
    fn anchor_points(&self, spectrum: &Spectrum, count: usize) -> Result<Vec<(f64, f64)>> {
        let (x, y) = spectrum.data()?;
        let n = x.len();
        if n < 2 {
            return Err(SpectrumError::InvalidData(
                "background needs at least two samples".into(),
            ));
        }

        let mut points = vec![(x[0], y[0])];
        let windows = count.max(1);
        for w in 0..windows {
            let start = w * n / windows;
            let end = ((w + 1) * n / windows).min(n);
            let lowest = (start..end).min_by(|&a, &b| y[a].total_cmp(&y[b]));
            if let Some(i) = lowest {
                points.push((x[i], y[i]));
            }
        }
        points.push((x[n - 1], y[n - 1]));
        Ok(points)
    }
}

pub struct Background;

impl Background {
    /// Spline through the provider's anchors, evaluated on the spectrum grid
    ///
    /// Anchors are sorted by x and duplicates dropped before fitting.
    pub fn fit(
        spectrum: &Spectrum,
        provider: &dyn AnchorPointProvider,
        count: usize,
    ) -> Result<Spectrum> {
        let mut anchors = provider.anchor_points(spectrum, count)?;
        anchors.sort_by(|a, b| a.0.total_cmp(&b.0));
        anchors.dedup_by(|a, b| a.0 == b.0);
        debug!("fitting background through {} anchor points", anchors.len());

        let (xs, ys): (Vec<f64>, Vec<f64>) = anchors.into_iter().unzip();
        let spline = CubicSpline::new(xs, ys)?;
        let y = spectrum.x().iter().map(|&x| spline.evaluate(x)).collect();
        Spectrum::with_name(spectrum.x().to_vec(), y, "background")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn peaked() -> Spectrum {
        let x: Vec<f64> = (0..200).map(|i| 10.0 + 0.1 * i as f64).collect();
        let y = x
            .iter()
            .map(|&v| 5.0 + 100.0 * (-((v - 20.0) / 0.2_f64).powi(2)).exp())
            .collect();
        Spectrum::new(x, y).unwrap()
    }

    #[test]
    fn test_minimum_anchors_avoid_peak() {
        let s = peaked();
        let anchors = MinimumAnchors.anchor_points(&s, 8).unwrap();
        assert_eq!(anchors.len(), 10);
        assert!(anchors.iter().all(|&(_, y)| y < 6.0));
    }

    #[test]
    fn test_fit_flat_background() {
        let s = peaked();
        let bkg = Background::fit(&s, &MinimumAnchors, 8).unwrap();
        assert_eq!(bkg.len(), s.len());
        for &y in bkg.y() {
            assert_relative_eq!(y, 5.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fixed_anchors() {
        let s = peaked();
        let provider = FixedAnchors::new(vec![(30.0, 2.0), (10.0, 0.0), (20.0, 1.0)]);
        let bkg = Background::fit(&s, &provider, 0).unwrap();
        assert_relative_eq!(bkg.y()[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(bkg.y()[100], 1.0, epsilon = 1e-12);

        let too_few = FixedAnchors::new(vec![(10.0, 0.0)]);
        assert!(Background::fit(&s, &too_few, 0).is_err());
    }
}
