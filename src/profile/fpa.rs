/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Fundamental-parameters line profiles
//!
//! Instead of an empirical width law, the line profile of each reflection is
//! built from the physics of the instrument: the emission spectrum of the
//! source, crystallite-size broadening, sample absorption, the equatorial
//! divergence of the beam and the width of the detector window. A
//! [`LineProfileEngine`] computes that profile on a local window around the
//! reflection; [`FpaShape`] resamples it onto the experimental grid.

use super::errors::{ProfileError, Result};
use super::pseudo_voigt::{gaussian_height, lorentzian_height};
use super::PeakShape;
use crate::config::FpaConfig;
use crate::parameters::GlobalParam;
use crate::utils::constants::{GAUSS_SHAPE, HC_KEV_ANGSTROM};
use crate::utils::{convolve_same, linspace, trapz, trapz_unit, CubicSpline};
use log::{debug, warn};
use ndarray::Array1;
use std::fs;
use std::path::Path;

/// Scherrer shape constant
const SCHERRER_K: f64 = 0.9;

const FPA_PARAMETERS: [GlobalParam; 3] = [
    GlobalParam::GaussWidth,
    GlobalParam::LorWidth,
    GlobalParam::CrystalliteSize,
];

/// Source emission spectrum and sample broadening, all lengths in metres
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionParameters {
    pub wavelengths: Vec<f64>,
    pub intensities: Vec<f64>,
    pub gauss_widths: Vec<f64>,
    pub lor_widths: Vec<f64>,
    pub crystallite_size_gauss: f64,
    pub crystallite_size_lor: f64,
}

/// A line profile sampled on its own 2θ window
#[derive(Debug, Clone, PartialEq)]
pub struct LineProfile {
    pub twotheta_deg: Vec<f64>,
    pub peak: Vec<f64>,
}

/// Computes instrument line profiles from fundamental parameters
pub trait LineProfileEngine: Send + Sync {
    fn set_emission(&mut self, emission: EmissionParameters);

    /// Linear absorption coefficient (1/m) and sample thickness (m)
    fn set_absorption(&mut self, coefficient: f64, thickness: f64);

    /// Detector window bounds (m) along the diffractometer circle
    fn set_detector_window(&mut self, bounds: (f64, f64));

    fn set_window(&mut self, center_deg: f64, full_width_deg: f64, points: usize);

    /// Reflection position, dominant wavelength (m), radius (m) and divergence
    ///
    /// A non-positive divergence disables the divergence contribution.
    fn set_geometry(
        &mut self,
        twotheta0_deg: f64,
        dominant_wavelength: f64,
        diffractometer_radius: f64,
        equatorial_divergence_deg: f64,
    );

    fn compute_line_profile(&self) -> Result<LineProfile>;
}

/// Line profile by direct convolution of the instrument contributions
#[derive(Debug, Clone)]
pub struct ConvolutionEngine {
    emission: Option<EmissionParameters>,
    absorption_coefficient: f64,
    sample_thickness: f64,
    detector_window: (f64, f64),
    center_deg: f64,
    full_width_deg: f64,
    points: usize,
    twotheta0_deg: f64,
    dominant_wavelength: f64,
    diffractometer_radius: f64,
    equatorial_divergence_deg: f64,
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self {
            emission: None,
            absorption_coefficient: 0.0,
            sample_thickness: 0.0,
            detector_window: (0.0, 0.0),
            center_deg: 0.0,
            full_width_deg: 0.0,
            points: 0,
            twotheta0_deg: 0.0,
            dominant_wavelength: 0.0,
            diffractometer_radius: 0.0,
            equatorial_divergence_deg: 0.0,
        }
    }
}

/// Thompson-Cox-Hastings pseudo-Voigt width and mixing from Gaussian and Lorentzian FWHMs
fn tch_width(fg: f64, fl: f64) -> (f64, f64) {
    let f = (fg.powi(5)
        + 2.69269 * fg.powi(4) * fl
        + 2.42843 * fg.powi(3) * fl.powi(2)
        + 4.47163 * fg.powi(2) * fl.powi(3)
        + 0.07842 * fg * fl.powi(4)
        + fl.powi(5))
    .powf(0.2);
    if f <= 0.0 {
        return (0.0, 0.0);
    }
    let q = fl / f;
    let eta = (1.36603 * q - 0.47719 * q * q + 0.11116 * q * q * q).clamp(0.0, 1.0);
    (f, eta)
}

/// Discrete kernel on a grid of spacing `step` for a density on `[lo, hi]`
///
/// `cumulative(a, b)` integrates the density over `[a, b]`. Index `j` of the
/// returned kernel corresponds to a shift of `(j - offset)·step` with
/// `offset = (len - 1) / 2`. Returns `None` for an empty support.
fn bin_kernel<F>(step: f64, lo: f64, hi: f64, cumulative: F) -> Option<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    if hi - lo <= 0.0 || step <= 0.0 {
        return None;
    }
    let reach = lo.abs().max(hi.abs());
    let offset = (reach / step + 0.5).ceil() as usize;
    let mut kernel: Vec<f64> = (0..2 * offset + 1)
        .map(|j| {
            let s = (j as f64 - offset as f64) * step;
            let a = (s - 0.5 * step).max(lo);
            let b = (s + 0.5 * step).min(hi);
            if b > a {
                cumulative(a, b)
            } else {
                0.0
            }
        })
        .collect();
    let norm: f64 = kernel.iter().sum();
    if norm.is_nan() || norm <= 0.0 {
        return None;
    }
    for w in kernel.iter_mut() {
        *w /= norm;
    }
    Some(kernel)
}

impl ConvolutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn emission_profile(&self, x: &[f64], step: f64, emission: &EmissionParameters) -> Vec<f64> {
        let theta0 = (0.5 * self.twotheta0_deg).to_radians();
        let lambda0 = self.dominant_wavelength;
        let mut y = vec![0.0; x.len()];

        let size_width = |size: f64| -> f64 {
            if size > 0.0 && size.is_finite() {
                (SCHERRER_K * lambda0 / (size * theta0.cos())).to_degrees()
            } else {
                0.0
            }
        };
        let size_g = size_width(emission.crystallite_size_gauss);
        let size_l = size_width(emission.crystallite_size_lor);
        // Δ2θ = 2 tanθ Δλ/λ in radians
        let dispersion = (2.0 * theta0.tan() / lambda0).to_degrees();

        for (i, &lambda) in emission.wavelengths.iter().enumerate() {
            let sin_theta = lambda / lambda0 * theta0.sin();
            if sin_theta.abs() >= 1.0 {
                continue;
            }
            let center = 2.0 * sin_theta.asin().to_degrees();
            let weight = emission.intensities.get(i).copied().unwrap_or(0.0);
            let wg = emission.gauss_widths.get(i).copied().unwrap_or(0.0) * dispersion;
            let wl = emission.lor_widths.get(i).copied().unwrap_or(0.0) * dispersion;

            let fg = (wg * wg + size_g * size_g).sqrt();
            let fl = wl + size_l;
            let (f, eta) = tch_width(fg, fl);
            let f = f.max(step);

            let hg = gaussian_height(f);
            let hl = lorentzian_height(f);
            for (yy, &xx) in y.iter_mut().zip(x) {
                let t = (xx - center) / f;
                let g = hg * (-GAUSS_SHAPE * t * t).exp();
                let l = hl / (1.0 + 4.0 * t * t);
                *yy += weight * (eta * l + (1.0 - eta) * g);
            }
        }
        y
    }

    /// Kernels for absorption, flat-specimen divergence and detector window
    fn instrument_kernels(&self, step: f64) -> Vec<Vec<f64>> {
        let theta0 = (0.5 * self.twotheta0_deg).to_radians();
        let radius = self.diffractometer_radius;
        let limit = self.full_width_deg;
        let mut kernels = Vec::new();

        if self.absorption_coefficient > 0.0 && radius > 0.0 {
            let delta = ((2.0 * theta0).sin() / (2.0 * self.absorption_coefficient * radius))
                .to_degrees();
            let depth = if self.sample_thickness > 0.0 {
                (2.0 * self.sample_thickness * theta0.cos() / radius).to_degrees()
            } else {
                10.0 * delta
            };
            let lo = -depth.min(limit);
            if delta > 0.0 {
                let exp_kernel = bin_kernel(step, lo, 0.0, |a, b| {
                    delta * ((b / delta).exp() - (a / delta).exp())
                });
                kernels.extend(exp_kernel);
            }
        }

        if self.equatorial_divergence_deg > 0.0 && theta0.tan() > 0.0 {
            let alpha = self.equatorial_divergence_deg.to_radians();
            let extent = (alpha * alpha / (2.0 * theta0.tan())).to_degrees().min(limit);
            let divergence = bin_kernel(step, -extent, 0.0, |a, b| {
                2.0 * ((-a).sqrt() - (-b).max(0.0).sqrt())
            });
            kernels.extend(divergence);
        }

        let (lo, hi) = self.detector_window;
        if hi > lo && radius > 0.0 {
            let width = ((hi - lo) / radius).to_degrees().min(limit);
            let boxcar = bin_kernel(step, -0.5 * width, 0.5 * width, |a, b| b - a);
            kernels.extend(boxcar);
        }

        kernels
    }
}

impl LineProfileEngine for ConvolutionEngine {
    fn set_emission(&mut self, emission: EmissionParameters) {
        self.emission = Some(emission);
    }

    fn set_absorption(&mut self, coefficient: f64, thickness: f64) {
        self.absorption_coefficient = coefficient;
        self.sample_thickness = thickness;
    }

    fn set_detector_window(&mut self, bounds: (f64, f64)) {
        self.detector_window = bounds;
    }

    fn set_window(&mut self, center_deg: f64, full_width_deg: f64, points: usize) {
        self.center_deg = center_deg;
        self.full_width_deg = full_width_deg;
        self.points = points;
    }

    fn set_geometry(
        &mut self,
        twotheta0_deg: f64,
        dominant_wavelength: f64,
        diffractometer_radius: f64,
        equatorial_divergence_deg: f64,
    ) {
        self.twotheta0_deg = twotheta0_deg;
        self.dominant_wavelength = dominant_wavelength;
        self.diffractometer_radius = diffractometer_radius;
        self.equatorial_divergence_deg = equatorial_divergence_deg;
    }

    fn compute_line_profile(&self) -> Result<LineProfile> {
        let emission = self
            .emission
            .as_ref()
            .ok_or_else(|| ProfileError::Parameter("emission spectrum not set".to_string()))?;
        if self.points < 3 || self.full_width_deg <= 0.0 {
            return Err(ProfileError::Parameter(format!(
                "invalid window: {} points over {}°",
                self.points, self.full_width_deg
            )));
        }
        if self.dominant_wavelength <= 0.0 {
            return Err(ProfileError::Parameter(
                "dominant wavelength must be positive".to_string(),
            ));
        }

        let half = 0.5 * self.full_width_deg;
        let x = linspace(self.center_deg - half, self.center_deg + half, self.points);
        let step = self.full_width_deg / (self.points - 1) as f64;

        let mut peak = self.emission_profile(&x, step, emission);
        for kernel in self.instrument_kernels(step) {
            peak = convolve_same(&peak, &kernel)?;
        }
        for v in peak.iter_mut() {
            *v = v.max(0.0);
        }

        Ok(LineProfile {
            twotheta_deg: x,
            peak,
        })
    }
}

/// Emission spectrum of the source
#[derive(Debug, Clone, PartialEq)]
pub struct Flux {
    /// Wavelengths in metres
    pub wavelengths: Vec<f64>,
    /// Relative intensities, normalised to unit area over sample index
    pub intensities: Vec<f64>,
}

impl Flux {
    /// Build from photon energies (keV) and raw intensities
    pub fn from_energies(energies_kev: &[f64], intensities: &[f64]) -> Result<Self> {
        if energies_kev.len() != intensities.len() || energies_kev.len() < 2 {
            return Err(ProfileError::InvalidFlux(format!(
                "need at least two energy/intensity pairs, got {} and {}",
                energies_kev.len(),
                intensities.len()
            )));
        }
        if let Some(e) = energies_kev.iter().find(|&&e| e <= 0.0) {
            return Err(ProfileError::InvalidFlux(format!(
                "photon energies must be positive, got {}",
                e
            )));
        }
        let area = trapz_unit(intensities);
        if area.is_nan() || area <= 0.0 {
            return Err(ProfileError::InvalidFlux(
                "total intensity must be positive".to_string(),
            ));
        }

        Ok(Self {
            wavelengths: energies_kev
                .iter()
                .map(|e| 1e-10 * HC_KEV_ANGSTROM / e)
                .collect(),
            intensities: intensities.iter().map(|i| i / area).collect(),
        })
    }

    /// Read a two-column (energy in keV, intensity) flux file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut energies = Vec::new();
        let mut intensities = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace().map(str::parse::<f64>);
            match (columns.next(), columns.next()) {
                (Some(Ok(e)), Some(Ok(i))) => {
                    energies.push(e);
                    intensities.push(i);
                }
                _ => {
                    return Err(ProfileError::Parse {
                        file: path.display().to_string(),
                        line: n + 1,
                        message: format!("expected energy and intensity, found '{}'", line),
                    })
                }
            }
        }
        Self::from_energies(&energies, &intensities)
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }
}

/// Peak shape computed by a [`LineProfileEngine`]
///
/// `gauss_width` and `lor_width` are emission line widths in metres; the
/// crystallite size is in nm.
#[derive(Debug, Clone)]
pub struct FpaShape<E: LineProfileEngine + Clone = ConvolutionEngine> {
    engine: E,
    flux: Flux,
    settings: FpaConfig,
    gauss_width: f64,
    lor_width: f64,
    crystallite_size: f64,
}

impl FpaShape<ConvolutionEngine> {
    pub fn new(flux: Flux, settings: FpaConfig) -> Self {
        Self::with_engine(ConvolutionEngine::new(), flux, settings)
    }
}

impl<E: LineProfileEngine + Clone> FpaShape<E> {
    pub fn with_engine(mut engine: E, flux: Flux, settings: FpaConfig) -> Self {
        engine.set_absorption(settings.absorption_coefficient, settings.sample_thickness);
        engine.set_detector_window(settings.si_psd_window);
        let mut shape = Self {
            engine,
            flux,
            settings,
            gauss_width: 1e-13,
            lor_width: 1e-13,
            crystallite_size: 100.0,
        };
        shape.update_emission();
        shape
    }

    pub fn flux(&self) -> &Flux {
        &self.flux
    }

    pub fn settings(&self) -> &FpaConfig {
        &self.settings
    }

    /// Wavelength (nm) at which reflection positions are computed
    pub fn dominant_wavelength_nm(&self) -> f64 {
        self.settings.dominant_wavelength * 1e9
    }

    fn update_emission(&mut self) {
        let n = self.flux.len();
        let size = self.crystallite_size * 1e-9;
        self.engine.set_emission(EmissionParameters {
            wavelengths: self.flux.wavelengths.clone(),
            intensities: self.flux.intensities.clone(),
            gauss_widths: vec![self.gauss_width; n],
            lor_widths: vec![self.lor_width; n],
            crystallite_size_gauss: size,
            crystallite_size_lor: size,
        });
    }

    fn resampled(
        &self,
        center_deg: f64,
        grid: &[f64],
        points: usize,
        radius: f64,
        divergence_deg: f64,
    ) -> Result<Array1<f64>> {
        let mut engine = self.engine.clone();
        engine.set_window(center_deg, self.settings.window_width_deg, points);
        engine.set_geometry(
            center_deg,
            self.settings.dominant_wavelength,
            radius,
            divergence_deg,
        );
        let line = engine.compute_line_profile()?;

        let area = trapz(&line.peak, &line.twotheta_deg);
        if area.is_nan() || area <= 0.0 {
            warn!("Empty line profile at 2θ = {:.3}°", center_deg);
            return Ok(Array1::zeros(grid.len()));
        }
        let normalised: Vec<f64> = line.peak.iter().map(|v| v / area).collect();
        let spline = CubicSpline::new(line.twotheta_deg, normalised)?;
        debug!("Line profile at {:.3}° resampled onto {} points", center_deg, grid.len());

        Ok(grid
            .iter()
            .map(|&x| match spline.evaluate_within(x) {
                Some(v) if v.is_finite() => v.max(0.0),
                _ => 0.0,
            })
            .collect())
    }
}

impl<E: LineProfileEngine + Clone> PeakShape for FpaShape<E> {
    fn parameters(&self) -> &'static [GlobalParam] {
        &FPA_PARAMETERS
    }

    fn set_parameter(&mut self, param: GlobalParam, value: f64) -> bool {
        match param {
            GlobalParam::GaussWidth => self.gauss_width = value,
            GlobalParam::LorWidth => self.lor_width = value,
            GlobalParam::CrystalliteSize => self.crystallite_size = value,
            _ => return false,
        }
        self.update_emission();
        true
    }

    fn profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>> {
        self.resampled(
            center_deg,
            grid,
            self.settings.output_points_synthesis,
            self.settings.diffractometer_radius_synthesis,
            self.settings.equatorial_divergence_deg,
        )
    }

    /// Intensity partition uses the finer extraction geometry without divergence
    fn extraction_profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>> {
        self.resampled(
            center_deg,
            grid,
            self.settings.output_points_extraction,
            self.settings.diffractometer_radius_extraction,
            -1.0,
        )
    }
}
