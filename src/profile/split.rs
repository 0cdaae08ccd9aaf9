/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Split (asymmetric) pseudo-Voigt peak shape
//!
//! Grid points below the peak centre use the left-branch widths, the rest
//! use the right-branch widths. Each branch is a unit-area Gaussian or
//! Lorentzian of its own width; the branches are then rescaled so that they
//! meet at the centre and the pair keeps roughly unit area.

use super::errors::Result;
use super::pseudo_voigt::{
    branch_cagliotti_fwhm, gaussian_height, lorentzian_fwhm, lorentzian_height, mixing_factor,
};
use super::PeakShape;
use crate::parameters::{GlobalParam, ParameterSet};
use crate::utils::constants::GAUSS_SHAPE;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

const SPLIT_PARAMETERS: [GlobalParam; 15] = [
    GlobalParam::Ul,
    GlobalParam::Vl,
    GlobalParam::Wl,
    GlobalParam::Pl,
    GlobalParam::Xl,
    GlobalParam::Yl,
    GlobalParam::Ur,
    GlobalParam::Vr,
    GlobalParam::Wr,
    GlobalParam::Pr,
    GlobalParam::Xr,
    GlobalParam::Yr,
    GlobalParam::Eta1,
    GlobalParam::Eta2,
    GlobalParam::Eta3,
];

/// Widths of one side of a split profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchWidths {
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub p: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for BranchWidths {
    fn default() -> Self {
        Self {
            u: 0.5,
            v: 0.5,
            w: 0.5,
            p: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl BranchWidths {
    pub fn gaussian_fwhm(&self, tth_deg: f64) -> f64 {
        branch_cagliotti_fwhm(self.u, self.v, self.w, self.p, tth_deg)
    }

    pub fn lorentzian_fwhm(&self, tth_deg: f64) -> f64 {
        lorentzian_fwhm(self.x, self.y, tth_deg)
    }
}

/// Snapshot of the split profile parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitProfileState {
    pub left: BranchWidths,
    pub right: BranchWidths,
    pub eta1: f64,
    pub eta2: f64,
    pub eta3: f64,
}

impl SplitProfileState {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        let mut state = Self {
            eta1: 1e-3,
            eta2: 1e-3,
            eta3: 1e-3,
            ..Self::default()
        };
        state.load_parameters(params);
        state
    }

    /// Both branches set to the same widths
    pub fn symmetric(widths: BranchWidths, eta: [f64; 3]) -> Self {
        Self {
            left: widths,
            right: widths,
            eta1: eta[0],
            eta2: eta[1],
            eta3: eta[2],
        }
    }

    pub fn mixing(&self, tth_deg: f64) -> f64 {
        mixing_factor(self.eta1, self.eta2, self.eta3, tth_deg)
    }
}

/// Relative weights `(a, b)` of the left and right branches
///
/// `left_height` and `right_height` are the peak heights of the unit-area
/// branch functions. With both branches present the weights make
/// `a·left_height == b·right_height` and `a + b == 2`.
fn branch_weights(has_left: bool, has_right: bool, left_height: f64, right_height: f64) -> (f64, f64) {
    if !has_left {
        return (0.0, 1.0);
    }
    if !has_right {
        return (1.0, 0.0);
    }
    if left_height == 0.0 {
        return (1.0, 0.0);
    }
    if right_height == 0.0 {
        return (0.0, 1.0);
    }
    let ratio = right_height / left_height;
    let b = 2.0 / (1.0 + ratio);
    (b * ratio, b)
}

impl PeakShape for SplitProfileState {
    fn parameters(&self) -> &'static [GlobalParam] {
        &SPLIT_PARAMETERS
    }

    fn set_parameter(&mut self, param: GlobalParam, value: f64) -> bool {
        let slot = match param {
            GlobalParam::Ul => &mut self.left.u,
            GlobalParam::Vl => &mut self.left.v,
            GlobalParam::Wl => &mut self.left.w,
            GlobalParam::Pl => &mut self.left.p,
            GlobalParam::Xl => &mut self.left.x,
            GlobalParam::Yl => &mut self.left.y,
            GlobalParam::Ur => &mut self.right.u,
            GlobalParam::Vr => &mut self.right.v,
            GlobalParam::Wr => &mut self.right.w,
            GlobalParam::Pr => &mut self.right.p,
            GlobalParam::Xr => &mut self.right.x,
            GlobalParam::Yr => &mut self.right.y,
            GlobalParam::Eta1 => &mut self.eta1,
            GlobalParam::Eta2 => &mut self.eta2,
            GlobalParam::Eta3 => &mut self.eta3,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>> {
        let split = grid.partition_point(|&x| x < center_deg);
        let has_left = split > 0;
        let has_right = split < grid.len();

        let hl = self.left.gaussian_fwhm(center_deg);
        let hr = self.right.gaussian_fwhm(center_deg);
        let gl = self.left.lorentzian_fwhm(center_deg);
        let gr = self.right.lorentzian_fwhm(center_deg);

        let (ga, gb) = branch_weights(has_left, has_right, gaussian_height(hl), gaussian_height(hr));
        let (la, lb) = branch_weights(
            has_left,
            has_right,
            lorentzian_height(gl),
            lorentzian_height(gr),
        );
        let eta = self.mixing(center_deg);

        Ok(grid
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let (h, gamma, a_g, a_l) = if i < split {
                    (hl, gl, ga, la)
                } else {
                    (hr, gr, gb, lb)
                };
                let tg = (x - center_deg) / h;
                let tl = (x - center_deg) / gamma;
                let g = gaussian_height(h) * (-GAUSS_SHAPE * tg * tg).exp();
                let l = lorentzian_height(gamma) / (1.0 + 4.0 * tl * tl);
                eta * a_g * g + (1.0 - eta) * a_l * l
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{integrated_intensity, ProfileState};
    use crate::utils::linspace;
    use approx::assert_relative_eq;

    fn widths(w: f64, x: f64) -> BranchWidths {
        BranchWidths {
            u: 0.0,
            v: 0.0,
            w,
            p: 0.0,
            x,
            y: 0.0,
        }
    }

    #[test]
    fn test_symmetric_limit_matches_pseudo_voigt() {
        let split = SplitProfileState::symmetric(widths(0.02, 0.04), [0.6, 0.0, 0.0]);
        let symmetric = ProfileState {
            u: 0.0,
            v: 0.0,
            w: 0.02,
            x: 0.04,
            y: 0.0,
            eta1: 0.6,
            eta2: 0.0,
            eta3: 0.0,
        };
        let grid = linspace(30.0, 50.0, 2001);
        let a = split.profile(40.03, &grid).unwrap();
        let b = symmetric.profile(40.03, &grid).unwrap();
        for (u, v) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*u, *v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_branches_meet_at_centre() {
        let state = SplitProfileState {
            left: widths(0.01, 0.02),
            right: widths(0.04, 0.06),
            eta1: 0.5,
            eta2: 0.0,
            eta3: 0.0,
        };
        let grid = linspace(35.0, 45.0, 100001);
        let prof = state.profile(40.0, &grid).unwrap();
        let i = grid.partition_point(|&x| x < 40.0);
        assert_relative_eq!(prof[i - 1], prof[i], max_relative = 1e-3);
        // wider right branch carries more area
        let left_area: f64 = crate::utils::trapz(&prof.to_vec()[..i], &grid[..i]);
        let right_area: f64 = crate::utils::trapz(&prof.to_vec()[i..], &grid[i..]);
        assert!(right_area > left_area);
        assert_relative_eq!(integrated_intensity(&prof, &grid), 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_one_sided_peak() {
        let state = SplitProfileState::symmetric(widths(0.02, 0.02), [1.0, 0.0, 0.0]);
        let grid = linspace(30.0, 39.0, 901);
        // centre beyond the grid: only the left branch exists
        let prof = state.profile(39.5, &grid).unwrap();
        assert!(prof.iter().all(|&v| v >= 0.0));
        assert_eq!(branch_weights(true, false, 1.0, 2.0), (1.0, 0.0));
        assert_eq!(branch_weights(false, true, 1.0, 2.0), (0.0, 1.0));
    }

    #[test]
    fn test_set_parameter_rejects_symmetric_names() {
        let mut state = SplitProfileState::default();
        assert!(state.set_parameter(GlobalParam::Wr, 0.3));
        assert_relative_eq!(state.right.w, 0.3);
        assert!(!state.set_parameter(GlobalParam::W, 0.3));
    }
}
