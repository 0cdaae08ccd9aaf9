/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Peak-shape models
//!
//! Every shape takes a reflection position and the experimental 2θ grid and
//! returns a non-negative profile on that grid whose integral is close to 1.
//! The refinement models only talk to shapes through [`PeakShape`], so the
//! symmetric, split and fundamental-parameters variants are interchangeable.

pub mod errors;
pub mod fpa;
pub mod pseudo_voigt;
pub mod split;

pub use errors::{ProfileError, Result};
pub use fpa::{
    ConvolutionEngine, EmissionParameters, Flux, FpaShape, LineProfile, LineProfileEngine,
};
pub use pseudo_voigt::{
    branch_cagliotti_fwhm, cagliotti_fwhm, gaussian, lorentzian, lorentzian_fwhm, mixing_factor,
    ProfileState,
};
pub use split::{BranchWidths, SplitProfileState};

use crate::parameters::{GlobalParam, ParameterSet};
use crate::utils::trapz;
use ndarray::Array1;

/// A peak-shape model driven by global profile parameters
pub trait PeakShape: Send + Sync {
    /// Global parameters this shape reads
    fn parameters(&self) -> &'static [GlobalParam];

    /// Update one parameter, returning `false` if the shape does not use it
    fn set_parameter(&mut self, param: GlobalParam, value: f64) -> bool;

    /// Profile of a reflection centred at `center_deg`, sampled on `grid`
    fn profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>>;

    /// Profile used when partitioning observed intensity
    fn extraction_profile(&self, center_deg: f64, grid: &[f64]) -> Result<Array1<f64>> {
        self.profile(center_deg, grid)
    }

    /// Copy every parameter this shape uses out of `params`
    fn load_parameters(&mut self, params: &ParameterSet) {
        for &param in self.parameters() {
            if let Some(p) = params.get(param.name()) {
                self.set_parameter(param, p.value);
            }
        }
    }

    fn uses(&self, param: GlobalParam) -> bool {
        self.parameters().contains(&param)
    }
}

/// Area under a profile sampled on `grid`
pub fn integrated_intensity(profile: &Array1<f64>, grid: &[f64]) -> f64 {
    match profile.as_slice() {
        Some(y) => trapz(y, grid),
        None => trapz(&profile.to_vec(), grid),
    }
}
