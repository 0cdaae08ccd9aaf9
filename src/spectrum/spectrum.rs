/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Two-theta/intensity curves

use super::errors::{Result, SpectrumError};
use crate::utils::{gaussian_filter1d, interp_many};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::{Add, Mul, Sub};
use std::path::Path;

/// A sampled curve `(x, y)` with an optional background, scaling, offset and smoothing
///
/// `x` must be strictly increasing. The processed curve is obtained from
/// [`data`](Spectrum::data); the raw samples stay untouched.
#[derive(Debug, Clone)]
pub struct Spectrum {
    x: Vec<f64>,
    y: Vec<f64>,
    name: String,
    background: Option<Box<Spectrum>>,
    scaling: f64,
    offset: f64,
    smoothing: f64,
}

impl Spectrum {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        Self::with_name(x, y, "")
    }

    pub fn with_name(x: Vec<f64>, y: Vec<f64>, name: &str) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SpectrumError::InvalidData(format!(
                "x has {} points but y has {}",
                x.len(),
                y.len()
            )));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SpectrumError::InvalidData(format!(
                "x is not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self {
            x,
            y,
            name: name.to_string(),
            background: None,
            scaling: 1.0,
            offset: 0.0,
            smoothing: 0.0,
        })
    }

    /// Read a whitespace separated two-column file
    ///
    /// `.chi` files carry four header lines which are skipped. Lines starting
    /// with `#` and blank lines are ignored. The spectrum is named after the
    /// file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let skip = match path.extension().and_then(|e| e.to_str()) {
            Some("chi") => 4,
            _ => 0,
        };
        let file = path.display().to_string();

        let mut x = Vec::new();
        let mut y = Vec::new();
        for (n, line) in text.lines().enumerate().skip(skip) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace().map(str::parse::<f64>);
            match (columns.next(), columns.next()) {
                (Some(Ok(a)), Some(Ok(b))) => {
                    x.push(a);
                    y.push(b);
                }
                _ => {
                    return Err(SpectrumError::Parse {
                        file,
                        line: n + 1,
                        message: format!("expected two numbers, found '{}'", line),
                    })
                }
            }
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::with_name(x, y, name)
    }

    /// Write the raw samples as two columns, with an optional `#` header
    pub fn save<P: AsRef<Path>>(&self, path: P, header: &str) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for line in header.lines() {
            writeln!(writer, "# {}", line)?;
        }
        for (x, y) in self.x.iter().zip(&self.y) {
            writeln!(writer, "{:.18e} {:.18e}", x, y)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Replace the samples and reset scaling and offset
    pub fn set_data(&mut self, x: Vec<f64>, y: Vec<f64>) -> Result<()> {
        let fresh = Self::with_name(x, y, &self.name)?;
        self.x = fresh.x;
        self.y = fresh.y;
        self.scaling = 1.0;
        self.offset = 0.0;
        Ok(())
    }

    pub fn background(&self) -> Option<&Spectrum> {
        self.background.as_deref()
    }

    pub fn set_background(&mut self, background: Spectrum) {
        self.background = Some(Box::new(background));
    }

    pub fn reset_background(&mut self) {
        self.background = None;
    }

    /// Width of the Gaussian smoothing kernel in samples; zero disables it
    pub fn set_smoothing(&mut self, sigma: f64) {
        self.smoothing = sigma;
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn scaling(&self) -> f64 {
        self.scaling
    }

    /// Negative scalings are clamped to zero
    pub fn set_scaling(&mut self, scaling: f64) {
        self.scaling = scaling.max(0.0);
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Scaled and offset samples without background subtraction
    pub fn original_data(&self) -> (Vec<f64>, Vec<f64>) {
        let y = self
            .y
            .iter()
            .map(|&v| v * self.scaling + self.offset)
            .collect();
        (self.x.clone(), y)
    }

    /// Processed curve: background removed, scaled, offset and smoothed
    ///
    /// A background on a different grid is linearly interpolated onto the
    /// part of `x` it covers; the result is cropped to that part.
    pub fn data(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let (x, mut y) = match &self.background {
            Some(bkg) => {
                let (xb, yb) = bkg.data()?;
                if xb == self.x {
                    let y = self
                        .y
                        .iter()
                        .zip(&yb)
                        .map(|(&v, &b)| v * self.scaling + self.offset - b)
                        .collect();
                    (self.x.clone(), y)
                } else {
                    let (lo, hi) = bounds(&xb)
                        .ok_or_else(|| SpectrumError::BackgroundNotInRange(self.name.clone()))?;
                    let (x, y): (Vec<f64>, Vec<f64>) = self
                        .x
                        .iter()
                        .zip(&self.y)
                        .filter(|(v, _)| **v >= lo && **v <= hi)
                        .map(|(&a, &b)| (a, b))
                        .unzip();
                    if x.is_empty() {
                        return Err(SpectrumError::BackgroundNotInRange(self.name.clone()));
                    }
                    let b = interp_many(&x, &xb, &yb)?;
                    let y = y
                        .iter()
                        .zip(&b)
                        .map(|(&v, &bg)| v * self.scaling + self.offset - bg)
                        .collect();
                    (x, y)
                }
            }
            None => self.original_data(),
        };

        if self.smoothing > 0.0 {
            y = gaussian_filter1d(&y, self.smoothing);
        }
        Ok((x, y))
    }

    /// Average the processed data into bins centred on multiples of `bin_size`
    ///
    /// Empty bins are dropped.
    pub fn rebin(&self, bin_size: f64) -> Result<Spectrum> {
        if bin_size <= 0.0 {
            return Err(SpectrumError::InvalidData(format!(
                "bin size must be positive, got {}",
                bin_size
            )));
        }
        let (x, y) = self.data()?;
        let (lo, hi) = bounds(&x).ok_or_else(|| SpectrumError::InvalidData("empty spectrum".into()))?;
        let first = (lo / bin_size).round() as i64;
        let last = (hi / bin_size).round() as i64;
        let nbins = (last - first + 1) as usize;

        let mut sums = vec![0.0; nbins];
        let mut counts = vec![0usize; nbins];
        for (&xv, &yv) in x.iter().zip(&y) {
            let bin = ((xv / bin_size).round() as i64 - first).clamp(0, nbins as i64 - 1) as usize;
            sums[bin] += yv;
            counts[bin] += 1;
        }

        let (new_x, new_y): (Vec<f64>, Vec<f64>) = (0..nbins)
            .filter(|&i| counts[i] > 0)
            .map(|i| ((first + i as i64) as f64 * bin_size, sums[i] / counts[i] as f64))
            .unzip();
        Spectrum::new(new_x, new_y)
    }

    /// Processed data strictly between `x_min` and `x_max`
    pub fn limit(&self, x_min: f64, x_max: f64) -> Result<Spectrum> {
        let (x, y) = self.data()?;
        let (x, y): (Vec<f64>, Vec<f64>) = x
            .into_iter()
            .zip(y)
            .filter(|(v, _)| x_min < *v && *v < x_max)
            .unzip();
        Spectrum::new(x, y)
    }

    /// Pad the raw samples with `y_value` out to `x_value` at the mean step
    ///
    /// Returns an unchanged copy when `x_value` is already inside the range.
    pub fn extend_to(&self, x_value: f64, y_value: f64) -> Result<Spectrum> {
        let (lo, hi) = match bounds(&self.x) {
            Some(b) if self.x.len() > 1 => b,
            _ => return Ok(self.clone()),
        };
        let step = (hi - lo) / (self.x.len() - 1) as f64;

        let (x, y) = if x_value < lo {
            let mut fill: Vec<f64> = (1..)
                .map(|i| lo - step * i as f64)
                .take_while(|&v| v > x_value - 0.5 * step)
                .collect();
            fill.reverse();
            let mut y = vec![y_value; fill.len()];
            y.extend_from_slice(&self.y);
            fill.extend_from_slice(&self.x);
            (fill, y)
        } else if x_value > hi {
            let fill: Vec<f64> = (1..)
                .map(|i| hi + step * i as f64)
                .take_while(|&v| v < x_value + 0.5 * step)
                .collect();
            let mut x = self.x.clone();
            let mut y = self.y.clone();
            y.extend(std::iter::repeat(y_value).take(fill.len()));
            x.extend(fill);
            (x, y)
        } else {
            return Ok(self.clone());
        };
        Spectrum::new(x, y)
    }

    /// Combine with another spectrum, interpolating it onto the overlap when grids differ
    fn combine(&self, other: &Spectrum, sign: f64) -> Result<Spectrum> {
        let (x, y) = self.data()?;
        let (xo, yo) = other.data()?;

        if x == xo {
            let y = y.iter().zip(&yo).map(|(a, b)| a + sign * b).collect();
            return Spectrum::new(x, y);
        }

        let (lo, hi) = bounds(&xo).ok_or_else(|| SpectrumError::NoOverlap(self.name.clone()))?;
        let (x, y): (Vec<f64>, Vec<f64>) = x
            .into_iter()
            .zip(y)
            .filter(|(v, _)| *v >= lo && *v <= hi)
            .unzip();
        if x.is_empty() {
            return Err(SpectrumError::NoOverlap(self.name.clone()));
        }
        let other_y = interp_many(&x, &xo, &yo)?;
        let y = y.iter().zip(&other_y).map(|(a, b)| a + sign * b).collect();
        Spectrum::new(x, y)
    }
}

fn bounds(x: &[f64]) -> Option<(f64, f64)> {
    Some((*x.first()?, *x.last()?))
}

impl Add for &Spectrum {
    type Output = Result<Spectrum>;

    fn add(self, other: &Spectrum) -> Self::Output {
        self.combine(other, 1.0)
    }
}

impl Sub for &Spectrum {
    type Output = Result<Spectrum>;

    fn sub(self, other: &Spectrum) -> Self::Output {
        self.combine(other, -1.0)
    }
}

impl Mul<f64> for &Spectrum {
    type Output = Result<Spectrum>;

    fn mul(self, factor: f64) -> Self::Output {
        let (x, y) = self.data()?;
        Spectrum::new(x, y.into_iter().map(|v| v * factor).collect())
    }
}

impl Mul<&Spectrum> for f64 {
    type Output = Result<Spectrum>;

    fn mul(self, spectrum: &Spectrum) -> Self::Output {
        spectrum * self
    }
}

impl PartialEq for Spectrum {
    fn eq(&self, other: &Self) -> bool {
        match (self.data(), other.data()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize, start: f64, step: f64) -> Spectrum {
        let x: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        let y = x.iter().map(|v| 2.0 * v + 1.0).collect();
        Spectrum::new(x, y).unwrap()
    }

    #[test]
    fn test_rejects_bad_grids() {
        assert!(Spectrum::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(Spectrum::new(vec![1.0, 1.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_scaling_and_offset() {
        let mut s = ramp(5, 0.0, 1.0);
        s.set_scaling(-3.0);
        assert_eq!(s.scaling(), 0.0);
        s.set_scaling(2.0);
        s.set_offset(1.0);
        let (_, y) = s.data().unwrap();
        assert_relative_eq!(y[2], 2.0 * 5.0 + 1.0);
    }

    #[test]
    fn test_background_on_other_grid() {
        let mut s = ramp(11, 0.0, 1.0);
        let bkg = Spectrum::new(vec![2.0, 8.0], vec![1.0, 1.0]).unwrap();
        s.set_background(bkg);
        let (x, y) = s.data().unwrap();
        assert_eq!(x.first(), Some(&2.0));
        assert_eq!(x.last(), Some(&8.0));
        assert_relative_eq!(y[0], 4.0);

        s.set_background(Spectrum::new(vec![20.0, 30.0], vec![1.0, 1.0]).unwrap());
        assert!(matches!(
            s.data(),
            Err(SpectrumError::BackgroundNotInRange(_))
        ));
        s.reset_background();
        assert!(s.data().is_ok());
    }

    #[test]
    fn test_add_interpolates_other_y() {
        let a = ramp(11, 0.0, 1.0);
        let b = Spectrum::new(vec![2.5, 7.5], vec![10.0, 20.0]).unwrap();
        let c = (&a + &b).unwrap();
        assert_eq!(c.x().first(), Some(&3.0));
        assert_eq!(c.x().last(), Some(&7.0));
        assert_relative_eq!(c.y()[0], 7.0 + 11.0);

        let far = Spectrum::new(vec![50.0, 60.0], vec![0.0, 0.0]).unwrap();
        assert!(matches!(&a - &far, Err(SpectrumError::NoOverlap(_))));
    }

    #[test]
    fn test_scalar_multiplication_both_sides() {
        let a = ramp(4, 0.0, 1.0);
        assert_eq!((&a * 2.0).unwrap(), (2.0 * &a).unwrap());
        assert_relative_eq!((&a * 2.0).unwrap().y()[3], 14.0);
    }

    #[test]
    fn test_rebin_limit_extend() {
        let a = ramp(10, 0.0, 0.5);
        let r = a.rebin(1.0).unwrap();
        assert_eq!(r.x(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        // bin 1.0 holds x = 0.5 and 1.0 (1.5 rounds to 2)
        assert_relative_eq!(r.y()[1], (2.0 + 3.0) / 2.0);

        let l = a.limit(1.0, 2.0).unwrap();
        assert_eq!(l.x(), &[1.5]);

        let e = a.extend_to(-1.0, 0.0).unwrap();
        assert_eq!(e.len(), 12);
        assert_relative_eq!(e.x()[0], -1.0);
        assert_eq!(e.y()[0], 0.0);
        let e = a.extend_to(6.0, 3.0).unwrap();
        assert_relative_eq!(*e.x().last().unwrap(), 6.0);
        assert_eq!(*e.y().last().unwrap(), 3.0);
        assert_eq!(a.extend_to(2.0, 0.0).unwrap().len(), a.len());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.xy");
        let a = ramp(6, 10.0, 0.25);
        a.save(&path, "2theta intensity").unwrap();
        let b = Spectrum::from_file(&path).unwrap();
        assert_eq!(b.name(), "ramp");
        assert_eq!(a, b);
    }

    #[test]
    fn test_chi_header_and_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let chi = dir.path().join("scan.chi");
        fs::write(&chi, "title\n2-theta\nintensity\n3\n1.0 2.0\n2.0 3.0\n3.0 4.0\n").unwrap();
        assert_eq!(Spectrum::from_file(&chi).unwrap().len(), 3);

        let bad = dir.path().join("bad.xy");
        fs::write(&bad, "1.0 2.0\n2.0 abc\n").unwrap();
        assert!(matches!(
            Spectrum::from_file(&bad),
            Err(SpectrumError::Parse { line: 2, .. })
        ));
    }
}
