/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Symmetric pseudo-Voigt peak shape
//!
//! The Gaussian width follows the Cagliotti relation, the Lorentzian width
//! the usual size/strain form, and the two are mixed by a quadratic in 2θ.
//! Widths are full widths at half maximum in degrees 2θ.

use super::errors::Result;
use super::PeakShape;
use crate::parameters::{GlobalParam, ParameterSet};
use crate::utils::constants::GAUSS_SHAPE;
use log::warn;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Smallest admissible `H²`
pub const MIN_GAUSSIAN_HSQ: f64 = 1.0e-12;

/// Smallest admissible Lorentzian width
pub const MIN_LORENTZIAN_FWHM: f64 = 1.0e-6;

const SYMMETRIC_PARAMETERS: [GlobalParam; 8] = [
    GlobalParam::U,
    GlobalParam::V,
    GlobalParam::W,
    GlobalParam::X,
    GlobalParam::Y,
    GlobalParam::Eta1,
    GlobalParam::Eta2,
    GlobalParam::Eta3,
];

/// Gaussian FWHM from `H² = U tan²θ + V tanθ + W`
///
/// A negative `H²` is clamped to [`MIN_GAUSSIAN_HSQ`] with a warning.
pub fn cagliotti_fwhm(u: f64, v: f64, w: f64, tth_deg: f64) -> f64 {
    let tan_theta = (0.5 * tth_deg).to_radians().tan();
    gaussian_width(u * tan_theta * tan_theta + v * tan_theta + w, tth_deg)
}

/// Gaussian FWHM of one split branch, `H² = U tan²θ + V tanθ + W + P / cos²θ`
pub fn branch_cagliotti_fwhm(u: f64, v: f64, w: f64, p: f64, tth_deg: f64) -> f64 {
    let theta = (0.5 * tth_deg).to_radians();
    let tan_theta = theta.tan();
    let cos_theta = theta.cos();
    gaussian_width(
        u * tan_theta * tan_theta + v * tan_theta + w + p / (cos_theta * cos_theta),
        tth_deg,
    )
}

fn gaussian_width(hsq: f64, tth_deg: f64) -> f64 {
    if hsq <= 0.0 {
        if hsq < 0.0 {
            warn!(
                "Negative Cagliotti width H² = {:.3e} at 2θ = {:.3}°, clamping",
                hsq, tth_deg
            );
        }
        return MIN_GAUSSIAN_HSQ.sqrt();
    }
    hsq.sqrt()
}

/// Lorentzian FWHM `γ = X / cosθ + Y tanθ`
pub fn lorentzian_fwhm(x: f64, y: f64, tth_deg: f64) -> f64 {
    let theta = (0.5 * tth_deg).to_radians();
    let gamma = x / theta.cos() + y * theta.tan();
    if gamma <= 0.0 {
        if gamma < 0.0 {
            warn!(
                "Negative Lorentzian width {:.3e} at 2θ = {:.3}°, clamping",
                gamma, tth_deg
            );
        }
        return MIN_LORENTZIAN_FWHM;
    }
    gamma
}

/// `η = η1 + η2·2θ + η3·(2θ)²` clamped to `[0, 1]`
pub fn mixing_factor(eta1: f64, eta2: f64, eta3: f64, tth_deg: f64) -> f64 {
    (eta1 + eta2 * tth_deg + eta3 * tth_deg * tth_deg).clamp(0.0, 1.0)
}

/// Peak height of a unit-area Gaussian
pub fn gaussian_height(fwhm: f64) -> f64 {
    (GAUSS_SHAPE / PI).sqrt() / fwhm
}

/// Peak height of a unit-area Lorentzian
pub fn lorentzian_height(fwhm: f64) -> f64 {
    2.0 / (PI * fwhm)
}

/// Unit-area Gaussian sampled on `grid`
pub fn gaussian(grid: &[f64], center: f64, fwhm: f64) -> Array1<f64> {
    let height = gaussian_height(fwhm);
    grid.iter()
        .map(|&x| {
            let t = (x - center) / fwhm;
            height * (-GAUSS_SHAPE * t * t).exp()
        })
        .collect()
}

/// Unit-area Lorentzian sampled on `grid`
pub fn lorentzian(grid: &[f64], center: f64, fwhm: f64) -> Array1<f64> {
    let height = lorentzian_height(fwhm);
    grid.iter()
        .map(|&x| {
            let t = (x - center) / fwhm;
            height / (1.0 + 4.0 * t * t)
        })
        .collect()
}

/// Snapshot of the symmetric profile parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileState {
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub eta1: f64,
    pub eta2: f64,
    pub eta3: f64,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self {
            u: 0.5,
            v: 0.5,
            w: 0.5,
            x: 0.0,
            y: 0.0,
            eta1: 1e-3,
            eta2: 1e-3,
            eta3: 1e-3,
        }
    }
}

impl ProfileState {
    /// Read the profile parameters out of a parameter set
    ///
    /// Missing entries keep their default values.
    pub fn from_parameters(params: &ParameterSet) -> Self {
        let mut state = Self::default();
        state.load_parameters(params);
        state
    }

    pub fn gaussian_fwhm(&self, tth_deg: f64) -> f64 {
        cagliotti_fwhm(self.u, self.v, self.w, tth_deg)
    }

    pub fn lorentzian_fwhm(&self, tth_deg: f64) -> f64 {
        lorentzian_fwhm(self.x, self.y, tth_deg)
    }

    pub fn mixing(&self, tth_deg: f64) -> f64 {
        mixing_factor(self.eta1, self.eta2, self.eta3, tth_deg)
    }
}

impl PeakShape for ProfileState {
    fn parameters(&self) -> &'static [GlobalParam] {
        &SYMMETRIC_PARAMETERS
    }

    fn set_parameter(&mut self, param: GlobalParam, value: f64) -> bool {
        let slot = match param {
            GlobalParam::U => &mut self.u,
            GlobalParam::V => &mut self.v,
            GlobalParam::W => &mut self.w,
            GlobalParam::X => &mut self.x,
            GlobalParam::Y => &mut self.y,
            GlobalParam::Eta1 => &mut self.eta1,
            GlobalParam::Eta2 => &mut self.eta2,
            GlobalParam::Eta3 => &mut self.eta3,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>> {
        let eta = self.mixing(center_deg);
        let g = gaussian(grid, center_deg, self.gaussian_fwhm(center_deg));
        let l = lorentzian(grid, center_deg, self.lorentzian_fwhm(center_deg));
        Ok(eta * g + (1.0 - eta) * l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::integrated_intensity;
    use crate::utils::linspace;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_unit_area() {
        let grid = linspace(20.0, 40.0, 4001);
        let g = gaussian(&grid, 30.0, 0.3);
        assert_relative_eq!(integrated_intensity(&g, &grid), 1.0, epsilon = 1e-6);
        assert_relative_eq!(g[2000], gaussian_height(0.3), epsilon = 1e-12);
    }

    #[test]
    fn test_lorentzian_half_maximum() {
        let grid = [29.9, 30.0, 30.1];
        let l = lorentzian(&grid, 30.0, 0.2);
        assert_relative_eq!(l[0], 0.5 * l[1], epsilon = 1e-12);
        assert_relative_eq!(l[2], 0.5 * l[1], epsilon = 1e-12);
    }

    #[test]
    fn test_negative_widths_are_clamped() {
        assert_relative_eq!(cagliotti_fwhm(0.0, 0.0, -1.0, 40.0), 1e-6);
        assert_relative_eq!(branch_cagliotti_fwhm(0.0, 0.0, 0.0, -0.2, 40.0), 1e-6);
        assert_relative_eq!(lorentzian_fwhm(-0.1, 0.0, 40.0), MIN_LORENTZIAN_FWHM);
        assert_relative_eq!(lorentzian_fwhm(0.0, 0.0, 40.0), MIN_LORENTZIAN_FWHM);
    }

    #[test]
    fn test_mixing_is_clamped() {
        assert_relative_eq!(mixing_factor(0.2, 0.0, 0.0, 50.0), 0.2);
        assert_relative_eq!(mixing_factor(1e-3, 1e-3, 1e-3, 50.0), 1.0);
        assert_relative_eq!(mixing_factor(-0.5, 0.0, 0.0, 50.0), 0.0);
    }

    #[test]
    fn test_pseudo_voigt_mixture() {
        let state = ProfileState {
            u: 0.0,
            v: 0.0,
            w: 0.01,
            x: 0.05,
            y: 0.0,
            eta1: 0.4,
            eta2: 0.0,
            eta3: 0.0,
        };
        let grid = linspace(10.0, 70.0, 60001);
        let pv = state.profile(40.0, &grid).unwrap();
        assert!(pv.iter().all(|&v| v >= 0.0));

        let h = state.gaussian_fwhm(40.0);
        let gamma = state.lorentzian_fwhm(40.0);
        assert_relative_eq!(h, 0.1, epsilon = 1e-12);
        let peak = 0.4 * gaussian_height(h) + 0.6 * lorentzian_height(gamma);
        assert_relative_eq!(pv[30000], peak, epsilon = 1e-9);

        // Lorentzian tails lose a little area outside the grid
        assert_relative_eq!(integrated_intensity(&pv, &grid), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_load_parameters() {
        let mut params = ParameterSet::defaults();
        params.set_value("W", 0.02).unwrap();
        params.set_value("X", 0.03).unwrap();
        let state = ProfileState::from_parameters(&params);
        assert_relative_eq!(state.w, 0.02);
        assert_relative_eq!(state.x, 0.03);
        assert_relative_eq!(state.u, 0.5);
    }

    #[test]
    fn test_symmetric_width_ignores_p() {
        let mut params = ParameterSet::defaults();
        assert!(!params.contains("P"));
        params.add(crate::parameters::Parameter::new("P", 0.5));
        let state = ProfileState::from_parameters(&params);

        let tan30 = 30f64.to_radians().tan();
        let expected = (0.5 * tan30 * tan30 + 0.5 * tan30 + 0.5).sqrt();
        assert_relative_eq!(state.gaussian_fwhm(60.0), expected, epsilon = 1e-12);
        assert_relative_eq!(state.gaussian_fwhm(60.0), 0.977416, epsilon = 1e-6);
        assert!(!state.uses(GlobalParam::P));
    }

    #[test]
    fn test_branch_width_adds_p() {
        let cos30 = 30f64.to_radians().cos();
        let symmetric = cagliotti_fwhm(0.5, 0.5, 0.5, 60.0);
        let branch = branch_cagliotti_fwhm(0.5, 0.5, 0.5, 0.5, 60.0);
        assert_relative_eq!(branch_cagliotti_fwhm(0.5, 0.5, 0.5, 0.0, 60.0), symmetric, epsilon = 1e-12);
        assert_relative_eq!(branch * branch, symmetric * symmetric + 0.5 / (cos30 * cos30), epsilon = 1e-12);
    }
}
